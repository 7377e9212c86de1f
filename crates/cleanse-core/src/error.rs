//! Review state errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised by the review stores, the edit session and the session file slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    /// Code line index outside the current buffer.
    #[error("code line {index} out of range (buffer has {len} lines)")]
    LineOutOfRange { index: usize, len: usize },

    /// Replacement text would split a code line.
    #[error("code line {index} cannot contain a line break")]
    EmbeddedLineBreak { index: usize },

    /// Recommendation step does not exist.
    #[error("unknown step '{step_key}' in category '{category}'")]
    UnknownStep { category: SmolStr, step_key: SmolStr },

    /// Session storage is disabled or was cleared.
    #[error("session storage unavailable")]
    SessionUnavailable,

    /// Stored session text is not a decodable data URL.
    #[error("invalid session encoding '{0}'")]
    SessionEncoding(SmolStr),
}
