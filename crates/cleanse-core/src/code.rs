//! Generated code held as editable lines.

#![allow(missing_docs)]

use crate::error::ReviewError;

/// Ordered lines of the generated code document.
///
/// Lines never contain `\n`, so `replace` followed by `to_text` returns the
/// original text byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    lines: Vec<String>,
}

impl CodeBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        buffer.replace(text);
        buffer
    }

    /// Replaces the document, splitting `text` on `\n`. Empty text gives an
    /// empty buffer.
    pub fn replace(&mut self, text: &str) {
        self.lines = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
    }

    /// Replaces the text of line `index`.
    pub fn update_line(&mut self, index: usize, text: String) -> Result<(), ReviewError> {
        let len = self.lines.len();
        let slot = self
            .lines
            .get_mut(index)
            .ok_or(ReviewError::LineOutOfRange { index, len })?;
        if text.contains('\n') {
            return Err(ReviewError::EmbeddedLineBreak { index });
        }
        *slot = text;
        Ok(())
    }

    #[must_use]
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Joins the lines back into one text blob.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
