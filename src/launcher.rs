//! Starting units of work on their own threads.
//!
//! There is one way in: [`Launcher::spawn`] takes a closure and runs it on a
//! fresh named thread. [`Worker`] is the counting unit the demo launches.

use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::LaunchError;
use crate::interrupt::Interrupt;

pub const NUM_LOOP: usize = 3;
pub const PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkConfig {
    pub iterations: usize,
    /// Suspension after each emitted line.
    pub pause: Duration,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            iterations: NUM_LOOP,
            pause: PAUSE,
        }
    }
}

/// Emits `<label> running: <i>` for each iteration, pausing between lines.
#[derive(Debug, Clone)]
pub struct Worker {
    label: String,
    config: WorkConfig,
}

impl Worker {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_config(label, WorkConfig::default())
    }

    pub fn with_config(label: impl Into<String>, config: WorkConfig) -> Self {
        Self {
            label: label.into(),
            config,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs the loop, returning how many lines were written.
    ///
    /// An interrupted pause ends the loop early with the interrupt status
    /// raised again on `interrupt`.
    pub fn run<W: Write>(&self, interrupt: &Interrupt, out: &mut W) -> io::Result<usize> {
        for i in 0..self.config.iterations {
            writeln!(out, "{} running: {}", self.label, i)?;
            out.flush()?;

            if interrupt.sleep(self.config.pause).is_err() {
                interrupt.interrupt();
                info!(unit = %self.label, iteration = i, "interrupted, stopping early");
                return Ok(i + 1);
            }
        }
        Ok(self.config.iterations)
    }
}

struct Unit {
    name: String,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct Launcher {
    units: Vec<Unit>,
}

impl Launcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `work` on a new thread named `name`.
    ///
    /// The returned [`Interrupt`] shares its status with the one passed to
    /// `work`.
    pub fn spawn<F>(&mut self, name: impl Into<String>, work: F) -> Result<Interrupt, LaunchError>
    where
        F: FnOnce(Interrupt) + Send + 'static,
    {
        let name = name.into();
        let interrupt = Interrupt::new();
        let token = interrupt.clone();

        let handle = match thread::Builder::new()
            .name(name.clone())
            .spawn(move || work(token))
        {
            Ok(handle) => handle,
            Err(source) => return Err(LaunchError::Spawn { name, source }),
        };
        debug!(unit = %name, "spawned");

        self.units.push(Unit { name, handle });
        Ok(interrupt)
    }

    /// Starts `worker` writing to stdout.
    pub fn spawn_worker(&mut self, worker: Worker) -> Result<Interrupt, LaunchError> {
        let name = worker.label().to_owned();
        self.spawn(name, move |interrupt| {
            if let Err(e) = worker.run(&interrupt, &mut io::stdout()) {
                warn!(unit = %worker.label(), "failed to write trace: {}", e);
            }
        })
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Waits for every unit. All units are joined even if one panicked; the
    /// first panicked unit is reported.
    pub fn join(self) -> Result<(), LaunchError> {
        let mut panicked = None;
        for unit in self.units {
            match unit.handle.join() {
                Ok(()) => debug!(unit = %unit.name, "finished"),
                Err(_) => {
                    error!(unit = %unit.name, "panicked");
                    panicked.get_or_insert(unit.name);
                }
            }
        }
        match panicked {
            Some(name) => Err(LaunchError::Panicked { name }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    fn quick(iterations: usize) -> WorkConfig {
        WorkConfig {
            iterations,
            pause: Duration::from_millis(1),
        }
    }

    fn lines(out: Vec<u8>) -> Vec<String> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn default_config() {
        let config = WorkConfig::default();
        assert_eq!(config.iterations, 3);
        assert_eq!(config.pause, Duration::from_millis(100));
    }

    #[test]
    fn worker_lines_carry_label_and_index() {
        let worker = Worker::with_config("Thread-A", quick(3));
        let mut out = Vec::new();

        let written = worker.run(&Interrupt::new(), &mut out).unwrap();

        assert_eq!(written, 3);
        assert_eq!(
            lines(out),
            vec!["Thread-A running: 0", "Thread-A running: 1", "Thread-A running: 2"]
        );
    }

    #[test]
    fn interrupted_worker_stops_and_restores_status() {
        let worker = Worker::with_config(
            "Runnable-B",
            WorkConfig {
                iterations: 3,
                pause: Duration::from_secs(10),
            },
        );
        let interrupt = Interrupt::new();
        interrupt.interrupt();
        let mut out = Vec::new();

        let written = worker.run(&interrupt, &mut out).unwrap();

        assert_eq!(written, 1);
        assert_eq!(lines(out), vec!["Runnable-B running: 0"]);
        assert!(interrupt.is_interrupted());
    }

    #[test]
    fn spawn_runs_on_named_thread() {
        let mut launcher = Launcher::new();
        let (tx, rx) = mpsc::channel();

        launcher
            .spawn("unit-1", move |_| {
                tx.send(thread::current().name().map(str::to_owned)).unwrap();
            })
            .unwrap();
        assert_eq!(launcher.unit_count(), 1);
        launcher.join().unwrap();

        assert_eq!(rx.recv().unwrap().as_deref(), Some("unit-1"));
    }

    #[test]
    fn returned_interrupt_reaches_unit() {
        let mut launcher = Launcher::new();
        let (tx, rx) = mpsc::channel();

        let interrupt = launcher
            .spawn("sleeper", move |interrupt| {
                let worker = Worker::with_config(
                    "sleeper",
                    WorkConfig {
                        iterations: 3,
                        pause: Duration::from_secs(10),
                    },
                );
                let written = worker.run(&interrupt, &mut io::sink()).unwrap();
                tx.send((written, interrupt.is_interrupted())).unwrap();
            })
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        interrupt.interrupt();
        launcher.join().unwrap();

        assert_eq!(rx.recv().unwrap(), (1, true));
    }

    #[test]
    fn join_reports_panicked_unit() {
        let mut launcher = Launcher::new();
        launcher.spawn("fine", |_| {}).unwrap();
        launcher.spawn("broken", |_| panic!("boom")).unwrap();

        match launcher.join() {
            Err(LaunchError::Panicked { name }) => assert_eq!(name, "broken"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
