//! Error types for novella-core.
//!
//! Construction and configuration failures use this crate-level [`Error`].
//! Session-level faults (bad credentials, forced logout, …) are plain
//! values carried on coordinator state, never raised — see
//! [`crate::session::SessionFault`].

use thiserror::Error;

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration load or parse failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Duplex connection construction failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// Logging initialization failure.
    #[error("logging error: {0}")]
    Logging(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;
