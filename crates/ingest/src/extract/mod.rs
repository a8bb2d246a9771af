//! Input adapter: turns a file on disk into a [`Document`].

mod pdf;
mod text;

use std::path::Path;

use async_trait::async_trait;
use ragprep_core::{Document, PipelineError};
use thiserror::Error;

/// Extensions recognized during discovery (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "text", "md", "markdown"];

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExtractionError> for PipelineError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::Io(io) => PipelineError::Io(io),
            other => PipelineError::Extraction(other.to_string()),
        }
    }
}

/// Text of one file split into pages.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExtractedText {
    pub pages: Vec<String>,
    /// First heading, when the format has them.
    pub heading: Option<String>,
}

/// Source of document text. The batch runner only sees this trait, so tests
/// and other collaborators can supply text without touching the filesystem.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<Document, ExtractionError>;
}

/// Lowercase extension of `path`, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Reads `.pdf`, `.txt`/`.text` and `.md`/`.markdown` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

#[async_trait]
impl TextExtractor for FileExtractor {
    async fn extract(&self, path: &Path) -> Result<Document, ExtractionError> {
        let ext = extension_of(path).unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ExtractionError::UnsupportedType(ext));
        }

        let bytes = tokio::fs::read(path).await?;
        let byte_size = bytes.len() as u64;
        let extracted = match ext.as_str() {
            // pdf-extract is CPU-bound.
            "pdf" => tokio::task::spawn_blocking(move || pdf::extract_pdf(&bytes))
                .await
                .map_err(|e| ExtractionError::Pdf(format!("extraction task failed: {e}")))??,
            "md" | "markdown" => text::extract_markdown(&bytes),
            _ => text::extract_plain(&bytes),
        };

        Ok(build_document(path, byte_size, extracted))
    }
}

pub(crate) fn build_document(path: &Path, byte_size: u64, extracted: ExtractedText) -> Document {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.clone());

    Document {
        source_id: filename.clone(),
        title: extracted.heading.unwrap_or(stem),
        page_count: extracted.pages.len().max(1),
        byte_size,
        text: extracted.pages.join("\n\n"),
        filename,
    }
}
