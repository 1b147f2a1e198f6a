//! Error types for template construction and rendering.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for template construction.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Result type alias for async rendering and streaming.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while building a template or loading render configuration.
///
/// These are fatal: the template is never produced.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unsupported value kind {kind}: {detail}")]
    UnsupportedValueKind { kind: &'static str, detail: String },

    #[error("Template has {segments} literal segments for {values} values (expected values + 1)")]
    SegmentMismatch { segments: usize, values: usize },

    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TemplateError {
    pub(crate) fn unsupported(kind: &'static str, detail: impl Into<String>) -> Self {
        Self::UnsupportedValueKind {
            kind,
            detail: detail.into(),
        }
    }
}

/// Why a single async slot failed to produce content.
///
/// Slot failures are isolated: by default they render as an inline error
/// fragment and never abort sibling slots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotFailure {
    #[error("async value rejected: {0}")]
    Rejected(String),

    #[error("async task panicked: {0}")]
    Panicked(String),

    #[error("async value timed out after {0:?}")]
    TimedOut(Duration),

    #[error("resolved value is not renderable: {0}")]
    Unsupported(String),
}

impl SlotFailure {
    /// Wrap any displayable error as a rejection.
    pub fn rejected(err: impl fmt::Display) -> Self {
        Self::Rejected(err.to_string())
    }
}

/// Errors surfaced by the async renderers.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Async slot {slot_id} failed: {reason}")]
    AsyncResolution { slot_id: String, reason: SlotFailure },

    #[error("Stream consumer failed: {0}")]
    StreamConsumer(#[from] std::io::Error),

    #[error("Stream consumer closed before the render finished")]
    SinkClosed,
}
