//! Run report: per-document deltas folded into one immutable summary.
//!
//! Workers never touch the accumulator. Each returns a [`DocumentDelta`] and the
//! orchestrator folds deltas in after a concurrency group settles.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ModelProfile;

/// How a single document ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Succeeded,
    NeedsReview,
    Failed,
}

/// Chunk-level counters summed across documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkCounters {
    /// Chunks in final outputs.
    pub produced: usize,
    pub merged: usize,
    pub split: usize,
    /// Removed by the optimizer (empty) or the content filter.
    pub removed: usize,
    pub cleaned: usize,
    pub preserved: usize,
    pub embedded: usize,
    pub embedding_failures: usize,
    /// Documents whose splitter output hit `max_chunks`.
    pub truncated_documents: usize,
}

impl ChunkCounters {
    pub fn add(&mut self, other: &ChunkCounters) {
        self.produced += other.produced;
        self.merged += other.merged;
        self.split += other.split;
        self.removed += other.removed;
        self.cleaned += other.cleaned;
        self.preserved += other.preserved;
        self.embedded += other.embedded;
        self.embedding_failures += other.embedding_failures;
        self.truncated_documents += other.truncated_documents;
    }
}

/// Result of one document's pipeline run, returned by the worker.
#[derive(Debug, Clone)]
pub struct DocumentDelta {
    pub filename: String,
    pub status: DocumentStatus,
    pub counters: ChunkCounters,
    pub duration_ms: u64,
    /// When the worker finished with this document.
    pub finished_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl DocumentDelta {
    pub fn failed(filename: impl Into<String>, error: impl ToString, duration_ms: u64) -> Self {
        Self {
            filename: filename.into(),
            status: DocumentStatus::Failed,
            counters: ChunkCounters::default(),
            duration_ms,
            finished_at: Utc::now(),
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunError {
    pub filename: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutcome {
    pub filename: String,
    pub status: DocumentStatus,
    pub chunks: usize,
    pub duration_ms: u64,
}

/// Active model configuration recorded in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub model_id: String,
    pub dimensions: usize,
    pub embeddings_enabled: bool,
}

impl ModelSummary {
    pub fn new(profile: &ModelProfile, embeddings_enabled: bool) -> Self {
        Self {
            model_id: profile.model_id.to_string(),
            dimensions: profile.dimensions,
            embeddings_enabled,
        }
    }
}

/// Finalized run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub needs_review: usize,
    pub chunks: ChunkCounters,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub average_per_document_ms: u64,
    pub model: ModelSummary,
    pub errors: Vec<RunError>,
    pub documents: Vec<DocumentOutcome>,
}

// ── Accumulator ─────────────────────────────────────────────────────

/// Mutable accumulator owned by the orchestrator for the length of a run.
#[derive(Debug)]
pub struct RunReportBuilder {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    clock: Instant,
    model: ModelSummary,
    total: usize,
    processed: usize,
    failed: usize,
    skipped: usize,
    needs_review: usize,
    chunks: ChunkCounters,
    errors: Vec<RunError>,
    documents: Vec<DocumentOutcome>,
}

impl RunReportBuilder {
    pub fn start(model: ModelSummary) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            clock: Instant::now(),
            model,
            total: 0,
            processed: 0,
            failed: 0,
            skipped: 0,
            needs_review: 0,
            chunks: ChunkCounters::default(),
            errors: Vec::new(),
            documents: Vec::new(),
        }
    }

    /// Count a discovered document whose output already exists.
    pub fn record_skipped(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn fold(&mut self, delta: DocumentDelta) {
        self.total += 1;
        match delta.status {
            DocumentStatus::Succeeded => self.processed += 1,
            DocumentStatus::NeedsReview => {
                self.processed += 1;
                self.needs_review += 1;
            }
            DocumentStatus::Failed => {
                self.failed += 1;
                self.errors.push(RunError {
                    filename: delta.filename.clone(),
                    message: delta.error.clone().unwrap_or_else(|| "unknown error".to_string()),
                    timestamp: delta.finished_at,
                });
            }
        }
        self.chunks.add(&delta.counters);
        self.documents.push(DocumentOutcome {
            filename: delta.filename,
            status: delta.status,
            chunks: delta.counters.produced,
            duration_ms: delta.duration_ms,
        });
    }

    pub fn finalize(self) -> RunReport {
        let total_duration_ms = self.clock.elapsed().as_millis() as u64;
        let attempted = (self.processed + self.failed) as u64;
        let average_per_document_ms = if attempted == 0 { 0 } else { total_duration_ms / attempted };
        RunReport {
            run_id: self.run_id,
            total: self.total,
            processed: self.processed,
            failed: self.failed,
            skipped: self.skipped,
            needs_review: self.needs_review,
            chunks: self.chunks,
            start: self.started_at,
            end: Utc::now(),
            total_duration_ms,
            average_per_document_ms,
            model: self.model,
            errors: self.errors,
            documents: self.documents,
        }
    }
}
