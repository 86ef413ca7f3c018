use std::thread;

use anyhow::{anyhow, Context, Result};
use lock_discipline::{init_tracing, Launcher, Worker};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();

    // Registered before any unit starts so an early Ctrl-C is queued, not fatal.
    let mut signals =
        Signals::new(&[SIGINT, SIGTERM]).context("failed to register signal handlers")?;
    let signal_handle = signals.handle();

    let mut launcher = Launcher::new();
    let mut interrupts = Vec::new();

    println!("--- 1. Thread-A ---");
    interrupts.push(launcher.spawn_worker(Worker::new("Thread-A"))?);

    println!("--- 2. Runnable-B ---");
    interrupts.push(launcher.spawn_worker(Worker::new("Runnable-B"))?);

    let forwarder = thread::spawn(move || {
        for signal in signals.forever() {
            info!(signal, "interrupting {} units", interrupts.len());
            for interrupt in &interrupts {
                interrupt.interrupt();
            }
        }
    });

    println!("main thread done.");
    info!("waiting on {} units", launcher.unit_count());

    launcher.join()?;
    signal_handle.close();
    forwarder
        .join()
        .map_err(|_| anyhow!("signal forwarder panicked"))?;
    Ok(())
}
