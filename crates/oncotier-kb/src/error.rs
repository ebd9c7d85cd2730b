use thiserror::Error;

use oncotier_common::KnowledgeSource;

/// Failures of a knowledge-source lookup. The aggregator logs these and
/// skips the source; they never abort a classification.
#[derive(Error, Debug)]
pub enum KbError {
    #[error("Knowledge source {kb} unavailable: {reason}")]
    Unavailable { kb: KnowledgeSource, reason: String },

    #[error("Knowledge source {kb} timed out after {timeout_ms} ms")]
    Timeout { kb: KnowledgeSource, timeout_ms: u64 },

    #[error("Malformed payload from {kb}: {reason}")]
    Malformed { kb: KnowledgeSource, reason: String },

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, KbError>;
