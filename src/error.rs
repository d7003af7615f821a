//! Error types for program codecs and editing.

use thiserror::Error;

/// Errors raised by the codec, buffer and library layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed envelope, bad magic or truncated input.
    #[error("Format error: {0}")]
    Format(String),

    /// The descriptor or buffer state does not support the requested access.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller-supplied value is outside the protocol's domain.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Raw byte access beyond the buffer.
    #[error("Offset {offset} out of range (size={len})")]
    Index {
        /// Requested offset.
        offset: usize,
        /// Buffer length at the time of access.
        len: usize,
    },

    /// Codec input shorter than the fixed layout.
    #[error("{what} too short: {got} bytes (need {need})")]
    Length {
        /// What was being decoded.
        what: &'static str,
        /// Bytes supplied.
        got: usize,
        /// Bytes required.
        need: usize,
    },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Format(e.to_string())
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
