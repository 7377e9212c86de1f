//! The per-session review documents and the edit slot that spans them.

#![allow(missing_docs)]

use indexmap::IndexSet;
use serde_json::Value;
use tracing::debug;

use crate::code::CodeBuffer;
use crate::edit::{CommittedEdit, EditDocuments, EditSession, EditTarget};
use crate::error::ReviewError;
use crate::recommendations::{RecommendationStore, StepId};
use crate::selection::SelectionTracker;

/// Recommendations, selections, code and the edit session of one user session.
#[derive(Debug, Clone, Default)]
pub struct ReviewState {
    recommendations: RecommendationStore,
    selection: SelectionTracker<StepId>,
    code: CodeBuffer,
    edit: EditSession,
}

impl ReviewState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recommendations(&self) -> &RecommendationStore {
        &self.recommendations
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionTracker<StepId> {
        &self.selection
    }

    #[must_use]
    pub fn code(&self) -> &CodeBuffer {
        &self.code
    }

    #[must_use]
    pub fn edit(&self) -> &EditSession {
        &self.edit
    }

    /// Installs a new recommendation set from an upload response.
    ///
    /// An edit on a recommendation is committed first; selections whose step
    /// is gone afterwards are dropped.
    pub fn apply_recommendations(&mut self, response: &Value) {
        if matches!(self.edit.target(), Some(EditTarget::Recommendation(_))) {
            self.commit_edit();
        }
        self.recommendations.replace_from_response(response);
        let before = self.selection.len();
        let recommendations = &self.recommendations;
        self.selection.retain(|id| recommendations.contains(id));
        let dropped = before - self.selection.len();
        if dropped > 0 {
            debug!("dropped {dropped} selections missing from new recommendations");
        }
    }

    /// Installs newly generated code. An edit on a code line is committed first.
    pub fn apply_code(&mut self, text: &str) {
        if matches!(self.edit.target(), Some(EditTarget::CodeLine(_))) {
            self.commit_edit();
        }
        self.code.replace(text);
    }

    /// Toggles the selection of an existing step. Returns whether it is
    /// selected afterwards.
    pub fn toggle_step(&mut self, id: StepId) -> Result<bool, ReviewError> {
        if !self.recommendations.contains(&id) {
            return Err(ReviewError::UnknownStep {
                category: id.category.as_str().into(),
                step_key: id.step_key.as_str().into(),
            });
        }
        Ok(self.selection.toggle(id))
    }

    #[must_use]
    pub fn is_selected(&self, id: &StepId) -> bool {
        self.selection.contains(id)
    }

    /// Current descriptions of the selected steps, in selection order. Steps
    /// that share a description contribute it once.
    #[must_use]
    pub fn selected_descriptions(&self) -> Vec<String> {
        let descriptions: IndexSet<&str> = self
            .selection
            .snapshot()
            .iter()
            .filter_map(|id| self.recommendations.get_id(id))
            .collect();
        descriptions.into_iter().map(str::to_string).collect()
    }

    pub fn begin_edit(&mut self, target: EditTarget) -> Result<Option<CommittedEdit>, ReviewError> {
        self.edit.begin(
            target,
            EditDocuments {
                recommendations: &mut self.recommendations,
                code: &mut self.code,
            },
        )
    }

    pub fn set_edit_buffer(&mut self, text: impl Into<String>) -> bool {
        self.edit.set_buffer(text)
    }

    pub fn commit_edit(&mut self) -> Option<CommittedEdit> {
        self.edit.commit(EditDocuments {
            recommendations: &mut self.recommendations,
            code: &mut self.code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review() -> ReviewState {
        let mut review = ReviewState::new();
        review.apply_recommendations(&json!({
            "recommendations": {
                "dates": { "step1": "normalize format" },
                "names": { "step1": "trim whitespace", "step2": "normalize format" }
            }
        }));
        review
    }

    #[test]
    fn selected_descriptions_follow_edits() {
        let mut review = review();
        let id = StepId::new("dates", "step1");
        assert!(review.toggle_step(id.clone()).expect("toggle"));

        review
            .begin_edit(EditTarget::Recommendation(id))
            .expect("begin");
        review.set_edit_buffer("use ISO-8601");
        review.commit_edit();

        assert_eq!(review.selected_descriptions(), vec!["use ISO-8601"]);
    }

    #[test]
    fn duplicate_descriptions_select_independently() {
        let mut review = review();
        review
            .toggle_step(StepId::new("names", "step2"))
            .expect("toggle");
        assert!(!review.is_selected(&StepId::new("dates", "step1")));
        assert_eq!(review.selected_descriptions(), vec!["normalize format"]);
    }

    #[test]
    fn shared_description_is_sent_once() {
        let mut review = review();
        review
            .toggle_step(StepId::new("dates", "step1"))
            .expect("toggle dates");
        review
            .toggle_step(StepId::new("names", "step1"))
            .expect("toggle names step1");
        review
            .toggle_step(StepId::new("names", "step2"))
            .expect("toggle names step2");

        assert_eq!(review.selection().len(), 3);
        assert_eq!(
            review.selected_descriptions(),
            vec!["normalize format", "trim whitespace"]
        );
    }

    #[test]
    fn toggling_unknown_step_fails() {
        let mut review = review();
        let err = review
            .toggle_step(StepId::new("dates", "step7"))
            .expect_err("unknown");
        assert!(matches!(err, ReviewError::UnknownStep { .. }));
        assert!(review.selection().is_empty());
    }

    #[test]
    fn new_recommendations_prune_vanished_selections() {
        let mut review = review();
        review
            .toggle_step(StepId::new("dates", "step1"))
            .expect("toggle");
        review
            .toggle_step(StepId::new("names", "step1"))
            .expect("toggle");

        review.apply_recommendations(&json!({
            "recommendations": { "names": { "step1": "strip" } }
        }));
        assert_eq!(
            review.selection().snapshot(),
            vec![StepId::new("names", "step1")]
        );
        assert_eq!(review.selected_descriptions(), vec!["strip"]);
    }

    #[test]
    fn code_replace_commits_pending_line_edit() {
        let mut review = review();
        review.apply_code("a=1\nb=2");
        review.begin_edit(EditTarget::CodeLine(0)).expect("begin");
        review.set_edit_buffer("a=5");

        review.apply_code("x=1");
        assert!(review.edit().is_idle());
        assert_eq!(review.code().to_text(), "x=1");
    }

    #[test]
    fn generate_then_edit_line_scenario() {
        let mut review = ReviewState::new();
        review.apply_code("a=1\nb=2");
        assert_eq!(review.code().lines(), &["a=1", "b=2"]);

        review.begin_edit(EditTarget::CodeLine(1)).expect("begin");
        review.set_edit_buffer("b=3");
        review.commit_edit();
        assert_eq!(review.code().to_text(), "a=1\nb=3");
    }
}
