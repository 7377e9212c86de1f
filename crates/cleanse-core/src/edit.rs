//! Single-slot in-place edit state shared by recommendations and code lines.
//!
//! The session is an explicit state machine with no cancel path. Leaving an
//! editing state always commits the buffer, including when another field is
//! activated while one is still open.

#![allow(missing_docs)]

use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::code::CodeBuffer;
use crate::error::ReviewError;
use crate::recommendations::{RecommendationStore, StepId};

/// Field an activation gesture points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Recommendation(StepId),
    CodeLine(usize),
}

/// Current edit state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    EditingRecommendation { id: StepId, buffer: String },
    EditingCodeLine { index: usize, buffer: String },
}

/// Result of a commit that wrote (or tried to write) a buffer back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEdit {
    pub target: EditTarget,
    pub text: String,
    pub applied: bool,
}

/// Mutable views of the two documents an edit can land in.
#[derive(Debug)]
pub struct EditDocuments<'a> {
    pub recommendations: &'a mut RecommendationStore,
    pub code: &'a mut CodeBuffer,
}

/// Owner of the one active edit target.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: EditState,
}

impl EditSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &EditState {
        &self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, EditState::Idle)
    }

    #[must_use]
    pub fn target(&self) -> Option<EditTarget> {
        match &self.state {
            EditState::Idle => None,
            EditState::EditingRecommendation { id, .. } => {
                Some(EditTarget::Recommendation(id.clone()))
            }
            EditState::EditingCodeLine { index, .. } => Some(EditTarget::CodeLine(*index)),
        }
    }

    #[must_use]
    pub fn buffer(&self) -> Option<&str> {
        match &self.state {
            EditState::Idle => None,
            EditState::EditingRecommendation { buffer, .. }
            | EditState::EditingCodeLine { buffer, .. } => Some(buffer),
        }
    }

    /// Activation gesture over `target`.
    ///
    /// Any active edit is committed first, so the previous field keeps what was
    /// typed into it. The new buffer starts from the field's current value.
    /// Returns the commit of the previous edit, if there was one.
    pub fn begin(
        &mut self,
        target: EditTarget,
        docs: EditDocuments<'_>,
    ) -> Result<Option<CommittedEdit>, ReviewError> {
        let EditDocuments {
            recommendations,
            code,
        } = docs;
        let previous = self.commit(EditDocuments {
            recommendations: &mut *recommendations,
            code: &mut *code,
        });
        let next = match target {
            EditTarget::Recommendation(id) => {
                let Some(current) = recommendations.get_id(&id) else {
                    return Err(ReviewError::UnknownStep {
                        category: SmolStr::new(&id.category),
                        step_key: SmolStr::new(&id.step_key),
                    });
                };
                EditState::EditingRecommendation {
                    buffer: current.to_string(),
                    id,
                }
            }
            EditTarget::CodeLine(index) => {
                let Some(current) = code.line(index) else {
                    return Err(ReviewError::LineOutOfRange {
                        index,
                        len: code.len(),
                    });
                };
                EditState::EditingCodeLine {
                    index,
                    buffer: current.to_string(),
                }
            }
        };
        debug!("edit started: {next:?}");
        self.state = next;
        Ok(previous)
    }

    /// Replaces the in-progress text. Ignored while idle.
    pub fn set_buffer(&mut self, text: impl Into<String>) -> bool {
        match &mut self.state {
            EditState::Idle => false,
            EditState::EditingRecommendation { buffer, .. }
            | EditState::EditingCodeLine { buffer, .. } => {
                *buffer = text.into();
                true
            }
        }
    }

    /// Writes the buffer into its document and returns to idle.
    ///
    /// A target that no longer exists makes the write a no-op; the session
    /// still returns to idle.
    pub fn commit(&mut self, docs: EditDocuments<'_>) -> Option<CommittedEdit> {
        match std::mem::take(&mut self.state) {
            EditState::Idle => None,
            EditState::EditingRecommendation { id, buffer } => {
                let applied =
                    docs.recommendations
                        .update_step(&id.category, &id.step_key, buffer.clone());
                if !applied {
                    warn!("dropping edit for missing step {id}");
                }
                Some(CommittedEdit {
                    target: EditTarget::Recommendation(id),
                    text: buffer,
                    applied,
                })
            }
            EditState::EditingCodeLine { index, buffer } => {
                let applied = match docs.code.update_line(index, buffer.clone()) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!("dropping code line edit: {err}");
                        false
                    }
                };
                Some(CommittedEdit {
                    target: EditTarget::CodeLine(index),
                    text: buffer,
                    applied,
                })
            }
        }
    }
}
