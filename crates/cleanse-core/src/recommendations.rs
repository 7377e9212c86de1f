//! Categorized cleansing recommendations with in-place step edits.

#![allow(missing_docs)]

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

/// Steps of one category, keyed by step key, in display order.
pub type Steps = IndexMap<String, String>;

/// Stable identifier of one recommendation step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId {
    pub category: String,
    pub step_key: String,
}

impl StepId {
    #[must_use]
    pub fn new(category: impl Into<String>, step_key: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            step_key: step_key.into(),
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.step_key)
    }
}

/// Owns the category → step → description mapping.
///
/// Every category held by the store has at least one step. Iteration order is
/// the order in which the backend listed categories and steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationStore {
    categories: IndexMap<String, Steps>,
}

impl RecommendationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole set. Empty categories are dropped.
    pub fn replace(&mut self, set: IndexMap<String, Steps>) {
        self.categories = set
            .into_iter()
            .filter(|(_, steps)| !steps.is_empty())
            .collect();
    }

    /// Replaces the whole set from an upload response body.
    ///
    /// A missing or non-object `recommendations` field yields an empty set.
    /// Categories that are not objects and step values that are not strings
    /// are skipped.
    pub fn replace_from_response(&mut self, response: &Value) {
        let Some(raw) = response.get("recommendations").and_then(Value::as_object) else {
            debug!("upload response has no recommendations object");
            self.categories.clear();
            return;
        };
        let mut set = IndexMap::with_capacity(raw.len());
        for (category, steps) in raw {
            let Some(steps) = steps.as_object() else {
                debug!("skipping non-object category '{category}'");
                continue;
            };
            let mut parsed = Steps::with_capacity(steps.len());
            for (step_key, description) in steps {
                match description.as_str() {
                    Some(text) => {
                        parsed.insert(step_key.clone(), text.to_string());
                    }
                    None => debug!("skipping non-string step '{category}/{step_key}'"),
                }
            }
            set.insert(category.clone(), parsed);
        }
        self.replace(set);
    }

    /// Writes one step description. Returns `false` (and changes nothing) when
    /// the category or step key is absent.
    pub fn update_step(&mut self, category: &str, step_key: &str, description: String) -> bool {
        match self
            .categories
            .get_mut(category)
            .and_then(|steps| steps.get_mut(step_key))
        {
            Some(slot) => {
                *slot = description;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, category: &str, step_key: &str) -> Option<&str> {
        self.categories
            .get(category)
            .and_then(|steps| steps.get(step_key))
            .map(String::as_str)
    }

    #[must_use]
    pub fn get_id(&self, id: &StepId) -> Option<&str> {
        self.get(&id.category, &id.step_key)
    }

    #[must_use]
    pub fn contains(&self, id: &StepId) -> bool {
        self.get_id(id).is_some()
    }

    /// Categories with their steps, in display order. Each call starts over.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Steps)> + '_ {
        self.categories
            .iter()
            .map(|(category, steps)| (category.as_str(), steps))
    }

    /// Every step flattened with its identifier, in display order.
    pub fn step_ids(&self) -> impl Iterator<Item = (StepId, &str)> + '_ {
        self.categories.iter().flat_map(|(category, steps)| {
            steps.iter().map(move |(step_key, description)| {
                (StepId::new(category.as_str(), step_key.as_str()), description.as_str())
            })
        })
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.categories.values().map(IndexMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_from(value: Value) -> RecommendationStore {
        let mut store = RecommendationStore::new();
        store.replace_from_response(&value);
        store
    }

    #[test]
    fn single_category_response_enumerates_one_pair() {
        let store = store_from(json!({
            "recommendations": { "dates": { "step1": "normalize format" } }
        }));

        let pairs: Vec<_> = store.iter().collect();
        assert_eq!(pairs.len(), 1);
        let (category, steps) = pairs[0];
        assert_eq!(category, "dates");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps.get("step1").map(String::as_str), Some("normalize format"));
    }

    #[test]
    fn malformed_recommendations_degrade_to_empty() {
        assert!(store_from(json!({})).is_empty());
        assert!(store_from(json!({ "recommendations": "none" })).is_empty());
        assert!(store_from(json!({ "recommendations": [1, 2] })).is_empty());
        assert!(store_from(Value::Null).is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped_and_empty_categories_dropped() {
        let store = store_from(json!({
            "recommendations": {
                "dates": { "step1": "normalize", "step2": 7 },
                "nulls": "drop rows",
                "empty": {},
                "types": { "only": false }
            }
        }));
        let categories: Vec<_> = store.iter().map(|(category, _)| category).collect();
        assert_eq!(categories, vec!["dates"]);
        assert_eq!(store.step_count(), 1);
    }

    #[test]
    fn replace_discards_previous_set() {
        let mut store = store_from(json!({
            "recommendations": { "dates": { "step1": "normalize" } }
        }));
        store.replace_from_response(&json!({
            "recommendations": { "names": { "step1": "trim" } }
        }));
        assert_eq!(store.get("dates", "step1"), None);
        assert_eq!(store.get("names", "step1"), Some("trim"));
    }

    #[test]
    fn update_step_changes_only_target() {
        let mut store = store_from(json!({
            "recommendations": {
                "dates": { "step1": "normalize", "step2": "fill gaps" },
                "names": { "step1": "trim" }
            }
        }));
        let before = store.clone();

        assert!(store.update_step("dates", "step2", "interpolate".to_string()));
        assert_eq!(store.get("dates", "step2"), Some("interpolate"));
        for (id, description) in before.step_ids() {
            if id != StepId::new("dates", "step2") {
                assert_eq!(store.get_id(&id), Some(description));
            }
        }
    }

    #[test]
    fn update_step_on_missing_target_is_noop() {
        let mut store = store_from(json!({
            "recommendations": { "dates": { "step1": "normalize" } }
        }));
        let before = store.clone();
        assert!(!store.update_step("dates", "step9", "x".to_string()));
        assert!(!store.update_step("missing", "step1", "x".to_string()));
        assert_eq!(store, before);
    }

    #[test]
    fn iteration_is_restartable_and_ordered() {
        let store = store_from(json!({
            "recommendations": {
                "zeta": { "b": "2", "a": "1" },
                "alpha": { "c": "3" }
            }
        }));
        let first: Vec<_> = store.step_ids().map(|(id, _)| id.to_string()).collect();
        let second: Vec<_> = store.step_ids().map(|(id, _)| id.to_string()).collect();
        assert_eq!(first, vec!["zeta/b", "zeta/a", "alpha/c"]);
        assert_eq!(first, second);
    }
}
