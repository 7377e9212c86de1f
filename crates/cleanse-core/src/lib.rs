//! `cleanse-core` - review state for data-cleansing recommendations and generated code.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Generated code as editable lines.
pub mod code;
/// Single active edit target.
pub mod edit;
/// Review errors.
pub mod error;
/// Categorized recommendations.
pub mod recommendations;
/// Per-session review documents.
pub mod review;
/// Chosen steps.
pub mod selection;
/// Session-scoped dataset slot.
pub mod session;

pub use code::CodeBuffer;
pub use edit::{CommittedEdit, EditSession, EditState, EditTarget};
pub use error::ReviewError;
pub use recommendations::{RecommendationStore, StepId, Steps};
pub use review::ReviewState;
pub use selection::SelectionTracker;
pub use session::{DatasetFile, SessionContext, SessionFileStore};
