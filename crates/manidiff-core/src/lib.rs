//! Diff engine for rendered Kubernetes manifests.
//!
//! This crate pairs the resources of two `ManifestCollection`s by identity,
//! applies kind/field suppression and then secret redaction, line-diffs the
//! canonical YAML of each pair, and renders the resulting `DiffReport` as a
//! unified diff, a one-line-per-resource plan, or through a caller-supplied
//! template. `Engine` runs the whole pipeline from two text blobs.

pub mod diff;
pub mod engine;
pub mod options;
pub mod redact;
pub mod render;
pub mod suppress;

pub use diff::{diff_manifests, Change, DiffLine, DiffReport, DiffSummary, Hunk, LineTag, ResourceDiff};
pub use engine::Engine;
pub use options::{ContextWindow, DiffOptions, SuppressRule};
pub use redact::{decode_secrets, is_secret, redact_secrets, SECRET_KIND};
pub use render::{OutputFormat, Renderer, ReportTemplate};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] manidiff_schema::ManifestError),
    #[error("config error: {0}")]
    Config(String),
    #[error("template error: {0}")]
    Template(String),
    #[error("internal diff error: {0}")]
    Internal(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<manidiff_schema::PathError> for CoreError {
    fn from(e: manidiff_schema::PathError) -> Self {
        Self::Config(e.to_string())
    }
}
