//! Error types for annotation operations.
//!
//! Every error here is local and recoverable: a failed operation leaves the
//! model unchanged and can be retried once the user fixes the precondition.

use miette::Diagnostic;
use thiserror::Error;

use crate::types::AreaId;

/// Errors raised by the annotation model and workflow.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum AnnotationError {
    /// Drag boundaries are missing or do not describe a non-empty span.
    #[error("invalid selection: start {start:?}, end {end:?}")]
    #[diagnostic(
        code(bytelabel::invalid_selection),
        help("select at least one byte, dragging from the first to the last byte")
    )]
    InvalidSelection {
        start: Option<usize>,
        end: Option<usize>,
    },

    /// Persisted regions belong to more than one area.
    #[error("persisted regions belong to {} areas, expected one", areas.len())]
    #[diagnostic(
        code(bytelabel::inconsistent_grouping),
        help("the correct grouping cannot be inferred; fix the stored annotation")
    )]
    InconsistentPersistedGrouping { areas: Vec<Option<AreaId>> },

    /// A persisted record violates a region invariant.
    #[error("invalid region record: {0}")]
    #[diagnostic(code(bytelabel::invalid_record))]
    InvalidRecord(String),

    /// Region content is not valid base64.
    #[error("region content is not valid base64")]
    #[diagnostic(code(bytelabel::content_decode))]
    ContentDecode(#[from] base64::DecodeError),

    /// A range reaches past the end of the content.
    #[error("range {start}..{end} is outside content of length {len}")]
    #[diagnostic(code(bytelabel::out_of_bounds))]
    OutOfBounds { start: usize, end: usize, len: usize },

    /// An operation that needs an active area was called while selecting one.
    #[error("no area is being labeled")]
    #[diagnostic(code(bytelabel::not_labeling))]
    NotLabeling,

    /// An area is already being labeled; go back before choosing another.
    #[error("an area is already being labeled")]
    #[diagnostic(code(bytelabel::area_active), help("go back to area selection first"))]
    AreaAlreadyActive,

    /// The annotation store refused to persist a region.
    #[error("annotation store error: {0}")]
    #[diagnostic(code(bytelabel::host))]
    Host(String),

    #[error("serialization error: {0}")]
    #[diagnostic(code(bytelabel::serde))]
    Serde(#[from] serde_json::Error),
}

/// Error type for operations on the rendering collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum PlatformError {
    /// The node was removed between resolution and use.
    #[error("byte node at offset {0} is no longer rendered")]
    #[diagnostic(code(bytelabel::stale_node))]
    StaleNode(usize),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError::Other(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError::Other(s)
    }
}

/// Errors loading style configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("failed to parse style configuration: {0}")]
    #[diagnostic(code(bytelabel::config))]
    Parse(#[from] serde_json::Error),

    #[error("opacity {0} is outside 0.0..=1.0")]
    #[diagnostic(code(bytelabel::config::opacity))]
    Opacity(f64),
}
