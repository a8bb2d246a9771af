use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a source document (its filename).
pub type SourceId = String;

/// One extracted source document. Immutable once built.
#[derive(Debug, Clone)]
pub struct Document {
    pub source_id: SourceId,
    /// Original filename including extension.
    pub filename: String,
    pub title: String,
    pub page_count: usize,
    /// Size of the source file in bytes.
    pub byte_size: u64,
    pub text: String,
}

/// Bookkeeping attached to a chunk as it moves through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub merged: bool,
    /// Number of neighbouring chunks absorbed into this one.
    pub merged_count: usize,
    pub split: bool,
    /// 1-based part number when `split` is set.
    pub split_part: usize,
    pub total_parts: usize,
    pub quality_score: u8,
    pub cleaned: bool,
    /// Kept verbatim because of a domain keyword despite failing the length floor.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub content_preserved: bool,
    /// Emitted below the optimizer's minimum length (no merge partner available).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub below_min_length: bool,
}

/// A bounded span of document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub content: String,
    /// 0-based, contiguous within the document at every stage boundary.
    pub index: usize,
    pub source_id: SourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub provenance: Provenance,
}

impl Chunk {
    pub fn new(content: impl Into<String>, index: usize, source_id: impl Into<SourceId>) -> Self {
        Self {
            content: content.into(),
            index,
            source_id: source_id.into(),
            embedding: None,
            provenance: Provenance::default(),
        }
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Assign sequential 0-based indices.
pub fn reindex(chunks: &mut [Chunk]) {
    for (i, chunk) in chunks.iter_mut().enumerate() {
        chunk.index = i;
    }
}

// ── Output artifact ──────────────────────────────────────────────────

/// The persisted per-document record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutput {
    pub filename: String,
    pub total_pages: usize,
    pub total_chunks: usize,
    pub chunks: Vec<Chunk>,
    pub metadata: OutputMetadata,
    pub processing_stats: ProcessingStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMetadata {
    pub file_size: u64,
    pub processing_time_ms: u64,
    pub needs_review: bool,
    pub cleaned_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    pub original_text_length: usize,
    pub cleaned_text_length: usize,
    pub average_chunk_size: usize,
    /// Model id, or `"none"` when embedding generation was disabled.
    pub embedding_model: String,
    pub processing_date: DateTime<Utc>,
}
