//! `cleanse-client` - upload, recommend and generate workflow for the data-cleansing service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Backend HTTP client.
pub mod backend;
/// Clipboard export.
pub mod clipboard;
/// Client configuration.
pub mod config;
/// Client errors.
pub mod error;
/// Multipart form encoding.
pub mod multipart;
/// User-facing notices.
pub mod notice;
/// Text views of the review state.
pub mod render;
/// Request orchestration.
pub mod workflow;

pub use workflow::{Applied, SubmitOutcome, WorkflowController};
