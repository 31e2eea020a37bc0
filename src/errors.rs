use std::io;

use thiserror::Error;

/// Error type for record-store IO, stream decoding, and sampling failures.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// File open, read, write, or seek failure.
    #[error("{operation}: {source}")]
    Io {
        /// Store operation that failed.
        operation: &'static str,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Streaming reader found a key block with no value block.
    #[error("{operation}: key block has no matching value block before end of stream")]
    TruncatedStream {
        /// Store operation that failed.
        operation: &'static str,
    },
    /// Operation on a store after `close`.
    #[error("{operation}: record store is closed")]
    UseAfterClose {
        /// Store operation that failed.
        operation: &'static str,
    },
    /// Caller passed arguments outside the documented contract.
    #[error("contract violation: {0}")]
    ContractViolation(String),
    /// No group in the view met the minimum size within the retry cap.
    #[error("no group with at least {min} records found after {attempts} draws")]
    InsufficientData {
        /// Minimum group size requested.
        min: usize,
        /// Draws made before giving up.
        attempts: usize,
    },
    /// Invalid sampler configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A thread panicked while holding an internal lock.
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
}

impl SamplerError {
    /// Wrap an IO failure with the name of the operation that hit it.
    pub fn io(operation: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { operation, source }
    }
}
