//! Error taxonomy for the per-title pipeline.
//!
//! Every per-title failure is caught at the task boundary and classified
//! here; nothing from one title's failure propagates into another's task.
//! Only [`PipelineError::Aggregation`] surfaces to the top-level caller as
//! a run failure.

use std::path::PathBuf;
use thiserror::Error;

/// Stage a title had reached when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Parsing,
    Computing,
    Persisting,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Fetching => "fetching",
            Stage::Parsing => "parsing",
            Stage::Computing => "computing",
            Stage::Persisting => "persisting",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network failure, non-2xx response, or exhausted retries. The title
    /// is skipped; its persisted record (if any) remains stale.
    #[error("fetch failed for title {title}: {message}")]
    Fetch { title: u32, message: String },

    /// Malformed document or missing structural markers. The raw XML stays
    /// cached so a later run can retry parsing without re-fetching.
    #[error("parse failed for title {title}: {message}")]
    Parse { title: u32, message: String },

    /// I/O failure writing a per-title record. Sibling titles are not
    /// rolled back.
    #[error("persist failed for title {title} at {path}: {source}")]
    Persist {
        title: u32,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No successfully processed titles to aggregate. No summary is
    /// written; a prior summary, if any, remains authoritative.
    #[error("aggregation failed: {0}")]
    Aggregation(String),
}

impl PipelineError {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Fetch { .. } => Stage::Fetching,
            PipelineError::Parse { .. } => Stage::Parsing,
            PipelineError::Persist { .. } => Stage::Persisting,
            PipelineError::Aggregation(_) => Stage::Computing,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
