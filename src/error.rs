//! Error types for scull
//!
//! Provides a unified error type for all operations.

use std::io;

use thiserror::Error;

/// Result type alias using ScullError
pub type Result<T> = std::result::Result<T, ScullError>;

/// Unified error type for scull operations
///
/// None of these are fatal to the device: the buffer and its lock stay
/// usable after any of them is returned.
#[derive(Debug, Error)]
pub enum ScullError {
    // -------------------------------------------------------------------------
    // Device / Session Errors
    // -------------------------------------------------------------------------
    /// Bad seek target or mode, unknown control command. Local state unchanged.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller-supplied source or sink for a transfer could not be accessed
    #[error("Transfer fault: {0}")]
    TransferFault(String),

    /// Lock wait cancelled before shared state was touched; safe to retry
    #[error("Interrupted while waiting for the device lock")]
    Interrupted,

    #[error("Session is closed")]
    SessionClosed,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ScullError> for io::Error {
    fn from(e: ScullError) -> Self {
        match e {
            ScullError::Io(e) => e,
            ScullError::InvalidArgument(_) => io::Error::new(io::ErrorKind::InvalidInput, e.to_string()),
            ScullError::Interrupted => io::Error::new(io::ErrorKind::Interrupted, e.to_string()),
            ScullError::SessionClosed => io::Error::new(io::ErrorKind::NotConnected, e.to_string()),
            _ => io::Error::new(io::ErrorKind::Other, e.to_string()),
        }
    }
}
