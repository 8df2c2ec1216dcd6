//! Error types for I/O operations.
//!
//! Provides unified error handling for all adapters. Public entry points
//! wrap failures in [`IoError::Adapter`] so every message starts with the
//! format name, e.g. `"PFM loader: invalid header: missing width"`.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input file does not exist.
    #[error("File {0} does not exist.")]
    NotFound(String),

    /// Unsupported format or file extension.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Malformed or truncated header.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Header is well formed but declares a variant this crate does not read.
    #[error("{0} not supported")]
    UnsupportedVariant(String),

    /// Layer pixel format does not fit the target container.
    #[error("{0}")]
    FormatMismatch(String),

    /// Layer channel count does not fit the target container.
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Image model rejected the decoded data.
    #[error(transparent)]
    Core(#[from] hdrv_core::Error),

    /// Failure inside a format adapter, prefixed with the adapter name.
    #[error("{context}: {source}")]
    Adapter {
        /// Adapter prefix such as "PFM loader".
        context: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<IoError>,
    },
}

impl IoError {
    /// Wraps this error with an adapter prefix. Already wrapped errors are
    /// returned unchanged.
    pub fn within(self, context: &'static str) -> Self {
        match self {
            Self::Adapter { .. } => self,
            other => Self::Adapter {
                context,
                source: Box::new(other),
            },
        }
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
