//! Clipboard export of the assembled code.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use smol_str::SmolStr;

use crate::error::ClientError;

/// Write-only clipboard capability.
pub trait Clipboard {
    /// Replaces the clipboard contents with `text`.
    fn write_text(&mut self, text: &str) -> Result<(), ClientError>;
}

/// Sets the system clipboard through the terminal with an OSC 52 sequence.
#[derive(Debug)]
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl<W: Write> Osc52Clipboard<W> {
    /// Clipboard writing escape sequences to `out` (normally stdout).
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<(), ClientError> {
        let sequence = format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()));
        self.out
            .write_all(sequence.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|err| ClientError::Clipboard(SmolStr::new(err.to_string())))
    }
}
