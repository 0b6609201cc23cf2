//! Error handling module

use thiserror::Error;

/// Everything that can go wrong while reading one value from the bus.
///
/// All three variants degrade to "skip this channel for this cycle"; the
/// split exists so callers and tests can tell an expected not-ready response
/// from a broken one.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Sensor not ready: {0}")]
    NotReady(String),

    #[error("Malformed reading: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ReadError {
    /// True for the reserved "no valid reading this cycle" responses.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ReadError::NotReady(_))
    }
}
