//! Client errors.

#![allow(missing_docs)]

use cleanse_core::ReviewError;
use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised by configuration, the backend client and the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("invalid config '{0}'")]
    InvalidConfig(SmolStr),

    /// Request could not be sent or its response could not be read.
    #[error("transport error '{0}'")]
    Transport(SmolStr),

    /// Backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: SmolStr },

    /// Request payload could not be encoded.
    #[error("request encoding error '{0}'")]
    Encoding(SmolStr),

    /// Request worker ended without reporting a result.
    #[error("request worker stopped before completing")]
    WorkerLost,

    /// Clipboard write failed.
    #[error("clipboard error '{0}'")]
    Clipboard(SmolStr),

    /// Local file error.
    #[error("i/o error '{0}'")]
    Io(SmolStr),

    #[error(transparent)]
    Review(#[from] ReviewError),
}

impl From<std::io::Error> for ClientError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(SmolStr::new(value.to_string()))
    }
}
