use std::path::PathBuf;

use thiserror::Error;

/// Failure of a pipeline run or of a single document within it.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Rule table error: {0}")]
    Rules(String),

    /// The only batch-fatal case: a configured root cannot be enumerated.
    #[error("Cannot enumerate source root {}: {reason}", path.display())]
    SourceRoot { path: PathBuf, reason: String },

    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// True when the error should abort a whole batch rather than one document.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, PipelineError::SourceRoot { .. })
    }
}
