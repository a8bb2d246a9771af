//! Fakes and fixtures shared by the integration tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ragprep_core::{Config, Document, ModelProfile};
use ragprep_ingest::embedding::{Embedder, EmbedderFactory, EmbeddingError};
use ragprep_ingest::extract::ExtractionError;
use ragprep_ingest::{BatchOrchestrator, DocumentProcessor, TextExtractor};

// ── Extraction ──────────────────────────────────────────────────────

/// Start and end of one `extract` call.
#[derive(Debug, Clone)]
pub struct Visit {
    pub filename: String,
    pub start: Instant,
    pub end: Instant,
}

/// Reads files as UTF-8 after an artificial delay, recording when each call
/// ran and how many ran at once.
#[derive(Default)]
pub struct RecordingExtractor {
    pub delay: Duration,
    pub fail: HashSet<String>,
    pub visits: Mutex<Vec<Visit>>,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl RecordingExtractor {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn failing(names: &[&str]) -> Self {
        Self {
            fail: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn visits(&self) -> Vec<Visit> {
        self.visits.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractor for RecordingExtractor {
    async fn extract(&self, path: &Path) -> Result<Document, ExtractionError> {
        let filename = path.file_name().unwrap().to_string_lossy().into_owned();
        let start = Instant::now();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let text = tokio::fs::read_to_string(path).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.visits.lock().unwrap().push(Visit {
            filename: filename.clone(),
            start,
            end: Instant::now(),
        });

        if self.fail.contains(&filename) {
            return Err(ExtractionError::Pdf("corrupt xref table".into()));
        }
        let text = text?;
        Ok(Document {
            source_id: filename.clone(),
            title: filename.clone(),
            page_count: 1,
            byte_size: text.len() as u64,
            filename,
            text,
        })
    }
}

// ── Embedding ───────────────────────────────────────────────────────

/// Returns a constant vector; the call numbered `fail_on_call` (1-based)
/// fails instead.
pub struct ScriptedEmbedder {
    dims: usize,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(call) == self.fail_on_call {
            return Err(EmbeddingError::Api("503: model busy".into()));
        }
        Ok(vec![0.1; self.dims])
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Counts how often a model is loaded.
#[derive(Default)]
pub struct CountingFactory {
    pub loads: AtomicUsize,
    pub fail_on_call: Option<usize>,
}

impl CountingFactory {
    pub fn failing_call(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Default::default()
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbedderFactory for CountingFactory {
    async fn load(&self, profile: &ModelProfile) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        // Give concurrent first callers a chance to race the initialization.
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(Arc::new(ScriptedEmbedder {
            dims: profile.dimensions,
            fail_on_call: self.fail_on_call,
            calls: AtomicUsize::new(0),
        }))
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub struct Workspace {
    _dir: tempfile::TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        let output = dir.path().join("output");
        std::fs::create_dir_all(&input).unwrap();
        Self {
            _dir: dir,
            input,
            output,
        }
    }

    pub fn write(&self, name: &str, text: &str) -> PathBuf {
        let path = self.input.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    /// Config pointing at this workspace. Paragraph-sized chunks, no overlap.
    pub fn config(&self, concurrency: usize) -> Config {
        let mut config = Config::default();
        config.batch.input_dirs = vec![self.input.clone()];
        config.batch.output_dir = self.output.clone();
        config.batch.concurrency = concurrency;
        config.chunking.chunk_size = 400;
        config.chunking.chunk_overlap = 0;
        config.embedding.cache_size = 0;
        config
    }
}

/// `paragraphs` lesson paragraphs of roughly 260 characters each, separated
/// by blank lines. With a 400-character chunk size each becomes one chunk.
pub fn lesson_text(paragraphs: usize) -> String {
    (1..=paragraphs)
        .map(|i| {
            format!(
                "第{i}课：{}",
                "学习汉语拼音的声母和韵母，老师带领学生朗读课文。".repeat(10)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn orchestrator(
    config: &Config,
    factory: Arc<dyn EmbedderFactory>,
    extractor: Arc<dyn TextExtractor>,
) -> BatchOrchestrator {
    let processor = DocumentProcessor::new(config, factory).unwrap();
    BatchOrchestrator::new(processor, extractor, &config.batch)
}
