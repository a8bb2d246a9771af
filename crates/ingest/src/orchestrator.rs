//! Batch orchestration: discovery, idempotent skipping, grouped concurrent
//! processing and run-report persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use ragprep_core::config::BatchConfig;
use ragprep_core::{DocumentDelta, ModelSummary, PipelineError, RunReport, RunReportBuilder};
use tracing::Instrument;
use walkdir::WalkDir;

use crate::extract::{is_supported, TextExtractor};
use crate::pipeline::{DocumentProcessor, ProcessedDocument};

pub const REPORT_FILENAME: &str = "processing_report.json";

/// Artifact path for a source file: `<output_dir>/<stem>.json`.
pub fn artifact_path(output_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{stem}.json"))
}

/// Input documents found under the roots.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Sorted inputs, each owning a distinct artifact name.
    pub sources: Vec<PathBuf>,
    /// Inputs whose artifact name is already taken, with the path that holds it.
    pub clashes: Vec<(PathBuf, PathBuf)>,
}

impl Discovered {
    fn clash_delta(source: &Path, holder: &Path) -> DocumentDelta {
        DocumentDelta::failed(
            display_name(source),
            format!("output name clash with {}", holder.display()),
            0,
        )
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub struct BatchOrchestrator {
    processor: DocumentProcessor,
    extractor: Arc<dyn TextExtractor>,
    input_dirs: Vec<PathBuf>,
    output_dir: PathBuf,
    concurrency: usize,
}

impl BatchOrchestrator {
    pub fn new(
        processor: DocumentProcessor,
        extractor: Arc<dyn TextExtractor>,
        config: &BatchConfig,
    ) -> Self {
        Self {
            processor,
            extractor,
            input_dirs: config.input_dirs.clone(),
            output_dir: config.output_dir.clone(),
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILENAME)
    }

    // ── Discovery ───────────────────────────────────────────────────

    /// Walk every input root for files with a recognized extension, sorted.
    /// An input whose artifact name is taken by an earlier input, or by the
    /// run report, is returned as a clash. A root that cannot be enumerated
    /// fails the whole run.
    pub fn discover(&self) -> Result<Discovered, PipelineError> {
        let mut found = Vec::new();

        for root in &self.input_dirs {
            if !root.is_dir() {
                return Err(PipelineError::SourceRoot {
                    path: root.clone(),
                    reason: "not a readable directory".into(),
                });
            }
            for entry in WalkDir::new(root).follow_links(true) {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) if e.depth() == 0 => {
                        return Err(PipelineError::SourceRoot {
                            path: root.clone(),
                            reason: e.to_string(),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                if entry.file_type().is_file() && is_supported(entry.path()) {
                    found.push(entry.into_path());
                }
            }
        }
        found.sort();

        let report_path = self.report_path();
        let mut owners: HashMap<PathBuf, PathBuf> = HashMap::new();
        owners.insert(report_path.clone(), report_path);

        let mut discovered = Discovered::default();
        for path in found {
            let artifact = artifact_path(&self.output_dir, &path);
            match owners.get(&artifact) {
                Some(holder) => {
                    tracing::warn!(
                        path = %path.display(),
                        holder = %holder.display(),
                        "output name already taken"
                    );
                    discovered.clashes.push((path, holder.clone()));
                }
                None => {
                    owners.insert(artifact, path.clone());
                    discovered.sources.push(path);
                }
            }
        }

        tracing::info!(
            roots = self.input_dirs.len(),
            documents = discovered.sources.len(),
            clashes = discovered.clashes.len(),
            "discovered input documents"
        );
        Ok(discovered)
    }

    // ── Runs ────────────────────────────────────────────────────────

    /// Discover, skip documents that already have an artifact, process the
    /// rest and persist the run report. Name clashes are reported as failed.
    pub async fn run_batch(&self) -> Result<RunReport, PipelineError> {
        let discovered = self.discover()?;
        let mut builder = self.start_report();

        for (path, holder) in &discovered.clashes {
            builder.fold(Discovered::clash_delta(path, holder));
        }

        let mut pending = Vec::with_capacity(discovered.sources.len());
        for path in discovered.sources {
            if artifact_path(&self.output_dir, &path).exists() {
                tracing::debug!(path = %path.display(), "output exists, skipping");
                builder.record_skipped();
            } else {
                pending.push(path);
            }
        }

        self.process_groups(&pending, &mut builder).await;
        self.finish(builder).await
    }

    /// Re-run the named files (by filename or stem) regardless of existing
    /// artifacts. Names matching no discovered input are reported as failed.
    pub async fn reprocess(&self, filenames: &[String]) -> Result<RunReport, PipelineError> {
        let discovered = self.discover()?;
        let mut builder = self.start_report();
        let mut selected = Vec::new();

        for name in filenames {
            let named = |path: &Path| {
                path.file_name().is_some_and(|n| n.to_string_lossy() == name.as_str())
                    || path.file_stem().is_some_and(|s| s.to_string_lossy() == name.as_str())
            };
            if let Some(path) = discovered.sources.iter().find(|p| named(p.as_path())) {
                if !selected.contains(path) {
                    selected.push(path.clone());
                }
            } else if let Some((path, holder)) = discovered.clashes.iter().find(|(p, _)| named(p.as_path())) {
                builder.fold(Discovered::clash_delta(path, holder));
            } else {
                tracing::warn!(filename = %name, "reprocess target not found under input roots");
                builder.fold(DocumentDelta::failed(name.clone(), "not found under input roots", 0));
            }
        }

        self.process_groups(&selected, &mut builder).await;
        self.finish(builder).await
    }

    fn start_report(&self) -> RunReportBuilder {
        RunReportBuilder::start(ModelSummary::new(
            self.processor.profile(),
            self.processor.embeddings_enabled(),
        ))
    }

    /// Consecutive groups of `concurrency` documents. A group runs its
    /// documents concurrently and must settle completely before the next
    /// group starts; deltas are folded in only after the group settles.
    async fn process_groups(&self, paths: &[PathBuf], builder: &mut RunReportBuilder) {
        let groups = paths.len().div_ceil(self.concurrency);
        for (n, group) in paths.chunks(self.concurrency).enumerate() {
            tracing::info!(group = n + 1, groups, size = group.len(), "starting group");
            let deltas = join_all(group.iter().map(|path| self.process_one(path))).await;
            for delta in deltas {
                builder.fold(delta);
            }
            tracing::debug!(group = n + 1, "group settled");
        }
    }

    async fn process_one(&self, path: &Path) -> DocumentDelta {
        let filename = display_name(path);
        let span = tracing::info_span!("document", filename = %filename);
        let started = Instant::now();

        match self.try_process(path).instrument(span.clone()).await {
            Ok(processed) => DocumentDelta {
                filename,
                status: processed.status(),
                counters: processed.counters,
                duration_ms: started.elapsed().as_millis() as u64,
                finished_at: Utc::now(),
                error: None,
            },
            Err(e) => {
                span.in_scope(|| tracing::error!(error = %e, "document failed"));
                DocumentDelta::failed(filename, e, started.elapsed().as_millis() as u64)
            }
        }
    }

    async fn try_process(&self, path: &Path) -> Result<ProcessedDocument, PipelineError> {
        let document = self.extractor.extract(path).await?;
        let processed = self.processor.process(document).await;
        write_json(&artifact_path(&self.output_dir, path), &processed.output).await?;
        tracing::info!(
            chunks = processed.output.total_chunks,
            needs_review = processed.output.metadata.needs_review,
            "document processed"
        );
        Ok(processed)
    }

    async fn finish(&self, builder: RunReportBuilder) -> Result<RunReport, PipelineError> {
        let report = builder.finalize();
        write_json(&self.report_path(), &report).await?;
        tracing::info!(
            total = report.total,
            processed = report.processed,
            failed = report.failed,
            skipped = report.skipped,
            needs_review = report.needs_review,
            duration_ms = report.total_duration_ms,
            "batch finished"
        );
        Ok(report)
    }
}

/// Pretty JSON written to a temp file and renamed into place, so a partial
/// write never looks like a finished artifact.
async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
