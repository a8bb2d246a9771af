//! Per-document pipeline: normalize → split → optimize → filter → embed.
//!
//! Stages run strictly in sequence for one document. A processor is built
//! once per run and shared by every document in it.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use ragprep_core::{
    ChunkCounters, Config, Document, DocumentOutput, DocumentStatus, ModelProfile, ModelRegistry,
    OutputMetadata, PipelineError, ProcessingStats,
};

use crate::chunker::{char_len, into_chunks, ChunkOptimizer, RecursiveSplitter};
use crate::embedding::{EmbedderFactory, EmbeddingGenerator};
use crate::filter::ContentFilter;
use crate::normalizer::TextNormalizer;
use crate::rules::{content_filter_rules, normalizer_rules};

/// Output of one document plus the counters folded into the run report.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub output: DocumentOutput,
    pub counters: ChunkCounters,
}

impl ProcessedDocument {
    pub fn status(&self) -> DocumentStatus {
        if self.output.metadata.needs_review {
            DocumentStatus::NeedsReview
        } else {
            DocumentStatus::Succeeded
        }
    }
}

pub struct DocumentProcessor {
    normalizer: TextNormalizer,
    splitter: RecursiveSplitter,
    optimizer: ChunkOptimizer,
    filter: ContentFilter,
    profile: &'static ModelProfile,
    embeddings: Option<EmbeddingGenerator>,
}

impl DocumentProcessor {
    /// Load rule tables and resolve the model profile. An unknown model id
    /// falls back to the default profile with a warning.
    pub fn new(config: &Config, factory: Arc<dyn EmbedderFactory>) -> Result<Self, PipelineError> {
        let rules_dir = config.batch.rules_dir.as_deref();
        let profile = ModelRegistry::builtin().resolve(&config.embedding.model_id);

        let embeddings = config
            .embedding
            .enabled
            .then(|| EmbeddingGenerator::new(profile, factory, config.embedding.cache_size));

        Ok(Self {
            normalizer: TextNormalizer::new(normalizer_rules(rules_dir)?, config.normalizer.clone()),
            splitter: RecursiveSplitter::from_config(&config.chunking),
            optimizer: ChunkOptimizer::from_config(&config.chunking),
            filter: ContentFilter::new(content_filter_rules(rules_dir)?, config.filter.clone()),
            profile,
            embeddings,
        })
    }

    pub fn profile(&self) -> &'static ModelProfile {
        self.profile
    }

    pub fn embeddings_enabled(&self) -> bool {
        self.embeddings.is_some()
    }

    pub fn embedding_generator(&self) -> Option<&EmbeddingGenerator> {
        self.embeddings.as_ref()
    }

    pub async fn process(&self, document: Document) -> ProcessedDocument {
        let started = Instant::now();
        let mut counters = ChunkCounters::default();

        let normalized = self.normalizer.normalize(&document.text);
        if normalized.needs_review {
            tracing::info!(garbled_ratio = normalized.garbled_ratio, "document flagged for review");
        }

        let split = self.splitter.split(&normalized.cleaned_text);
        if split.truncated {
            counters.truncated_documents = 1;
        }

        let optimized = self
            .optimizer
            .optimize(into_chunks(split.chunks, &document.source_id));
        counters.merged = optimized.stats.merged;
        counters.split = optimized.stats.split;
        counters.removed = optimized.stats.removed;

        let filtered = self.filter.filter(optimized.chunks);
        counters.removed += filtered.stats.removed;
        counters.cleaned = filtered.stats.cleaned;
        counters.preserved = filtered.stats.preserved;

        let mut chunks = filtered.chunks;
        if let Some(generator) = &self.embeddings {
            let stats = generator.embed_chunks(&mut chunks).await;
            counters.embedded = stats.embedded;
            counters.embedding_failures = stats.failed;
        }
        counters.produced = chunks.len();

        let total_chars: usize = chunks.iter().map(|c| c.char_len()).sum();
        let average_chunk_size = if chunks.is_empty() { 0 } else { total_chars / chunks.len() };

        tracing::debug!(
            chunks = chunks.len(),
            merged = counters.merged,
            split = counters.split,
            removed = counters.removed,
            "document pipeline finished"
        );

        let output = DocumentOutput {
            filename: document.filename,
            total_pages: document.page_count,
            total_chunks: chunks.len(),
            chunks,
            metadata: OutputMetadata {
                file_size: document.byte_size,
                processing_time_ms: started.elapsed().as_millis() as u64,
                needs_review: normalized.needs_review,
                cleaned_text: normalized.cleaned_text.clone(),
            },
            processing_stats: ProcessingStats {
                original_text_length: char_len(&document.text),
                cleaned_text_length: char_len(&normalized.cleaned_text),
                average_chunk_size,
                embedding_model: if self.embeddings.is_some() {
                    self.profile.model_id.to_string()
                } else {
                    "none".to_string()
                },
                processing_date: Utc::now(),
            },
        };

        ProcessedDocument { output, counters }
    }
}
