pub mod attribute_store;
pub mod error;
pub mod interrupt;
pub mod launcher;
pub mod logging;
pub mod server_status;

pub use attribute_store::{AttributeStore, CoarseAttributeStore};
pub use error::{Interrupted, LaunchError, StoreError};
pub use interrupt::Interrupt;
pub use launcher::{Launcher, WorkConfig, Worker};
pub use logging::init_tracing;
pub use server_status::ServerStatus;
