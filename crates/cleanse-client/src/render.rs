//! Plain-text views of the review state.

#![allow(missing_docs)]

use std::fmt::Write as _;

use cleanse_core::{EditState, RecommendationStore, ReviewState, StepId};

/// Resolves a step reference typed by the user: its list number (1-based) or
/// `category/step`.
#[must_use]
pub fn resolve_step(store: &RecommendationStore, reference: &str) -> Option<StepId> {
    let reference = reference.trim();
    if let Ok(number) = reference.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| store.step_ids().nth(index))
            .map(|(id, _)| id);
    }
    let (category, step_key) = reference.split_once('/')?;
    let id = StepId::new(category, step_key);
    store.contains(&id).then_some(id)
}

/// Recommendations grouped by category, one numbered checkbox line per step.
///
/// The step under edit shows its in-progress buffer instead of the stored
/// description.
#[must_use]
pub fn recommendations(review: &ReviewState) -> String {
    let store = review.recommendations();
    if store.is_empty() {
        return "No recommendations yet. Upload a dataset first.\n".to_string();
    }
    let editing = match review.edit().state() {
        EditState::EditingRecommendation { id, buffer } => Some((id, buffer.as_str())),
        _ => None,
    };

    let mut out = String::new();
    let mut number = 0usize;
    for (category, steps) in store.iter() {
        let _ = writeln!(out, "{}", category.to_uppercase());
        for (step_key, description) in steps {
            number += 1;
            let id = StepId::new(category, step_key.as_str());
            match editing {
                Some((target, buffer)) if *target == id => {
                    let _ = writeln!(out, "  {number:>3}. [~] {step_key}: {buffer}_");
                }
                _ => {
                    let mark = if review.is_selected(&id) { 'x' } else { ' ' };
                    let _ = writeln!(out, "  {number:>3}. [{mark}] {step_key}: {description}");
                }
            }
        }
    }
    out
}

/// Generated code with 1-based line numbers.
#[must_use]
pub fn code(review: &ReviewState) -> String {
    let buffer = review.code();
    if buffer.is_empty() {
        return "No generated code yet.\n".to_string();
    }
    let editing = match review.edit().state() {
        EditState::EditingCodeLine { index, buffer } => Some((*index, buffer.as_str())),
        _ => None,
    };
    let width = buffer.len().to_string().len();
    let mut out = String::new();
    for (index, line) in buffer.lines().iter().enumerate() {
        let (marker, text) = match editing {
            Some((target, text)) if target == index => ('~', format!("{text}_")),
            _ => ('|', line.clone()),
        };
        let rendered = format!("{:>width$} {marker} {text}", index + 1);
        let _ = writeln!(out, "{}", rendered.trim_end());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanse_core::EditTarget;
    use expect_test::expect;
    use serde_json::json;

    fn review() -> ReviewState {
        let mut review = ReviewState::new();
        review.apply_recommendations(&json!({
            "recommendations": {
                "dates": { "step1": "normalize format", "step2": "fill gaps" },
                "names": { "step1": "trim whitespace" }
            }
        }));
        review
    }

    #[test]
    fn recommendations_listing_marks_selection_and_edit() {
        let mut review = review();
        review
            .toggle_step(StepId::new("names", "step1"))
            .expect("toggle");
        review
            .begin_edit(EditTarget::Recommendation(StepId::new("dates", "step2")))
            .expect("begin");
        review.set_edit_buffer("interpolate");

        expect![[r#"
            DATES
                1. [ ] step1: normalize format
                2. [~] step2: interpolate_
            NAMES
                3. [x] step1: trim whitespace
        "#]]
        .assert_eq(&recommendations(&review));
    }

    #[test]
    fn step_references_by_number_or_path() {
        let review = review();
        let store = review.recommendations();
        assert_eq!(resolve_step(store, "2"), Some(StepId::new("dates", "step2")));
        assert_eq!(
            resolve_step(store, " names/step1 "),
            Some(StepId::new("names", "step1"))
        );
        assert_eq!(resolve_step(store, "0"), None);
        assert_eq!(resolve_step(store, "4"), None);
        assert_eq!(resolve_step(store, "names/step9"), None);
        assert_eq!(resolve_step(store, "trim whitespace"), None);
    }

    #[test]
    fn code_listing_numbers_lines() {
        let mut review = review();
        review.apply_code("import pandas as pd\n\ndf = df.dropna()");
        review.begin_edit(EditTarget::CodeLine(2)).expect("begin");
        review.set_edit_buffer("df = df.dropna(how=\"all\")");

        expect![[r#"
            1 | import pandas as pd
            2 |
            3 ~ df = df.dropna(how="all")_
        "#]]
        .assert_eq(&code(&review));
    }

    #[test]
    fn empty_views() {
        let review = ReviewState::new();
        assert_eq!(
            recommendations(&review),
            "No recommendations yet. Upload a dataset first.\n"
        );
        assert_eq!(code(&review), "No generated code yet.\n");
    }
}
