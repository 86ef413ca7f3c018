use std::error::Error as StdError;
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Returned by [`Interrupt::sleep`](crate::Interrupt::sleep) when the sleep was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sleep interrupted")]
pub struct Interrupted;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn unit `{name}`: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("unit `{name}` panicked")]
    Panicked { name: String },
}
