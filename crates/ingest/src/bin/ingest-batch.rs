//! ingest-batch: run the preparation pipeline over the configured input roots.
//!
//! Documents with an existing output artifact are skipped; `--reprocess`
//! re-runs only the named files.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ragprep_core::config::{load_dotenv, Config};
use ragprep_ingest::embedding::HttpEmbedderFactory;
use ragprep_ingest::{BatchOrchestrator, DocumentProcessor, FileExtractor};

// ── CLI ─────────────────────────────────────────────────────────────

/// Convert documents into filtered, embedded chunks.
#[derive(Parser, Debug)]
#[command(name = "ingest-batch", version, about)]
struct Cli {
    /// Input root (repeatable). Overrides INPUT_DIRS.
    #[arg(long = "input", value_name = "DIR")]
    inputs: Vec<PathBuf>,

    /// Output directory for artifacts and the run report.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Documents processed concurrently per group.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Embedding model identifier.
    #[arg(long)]
    model: Option<String>,

    /// Skip embedding generation.
    #[arg(long)]
    no_embeddings: bool,

    /// Directory with rule table overrides.
    #[arg(long)]
    rules_dir: Option<PathBuf>,

    /// Re-run only these files (filename or stem), ignoring existing output.
    #[arg(long, num_args = 1.., value_name = "FILE")]
    reprocess: Vec<String>,
}

impl Cli {
    fn apply(self, config: &mut Config) -> Vec<String> {
        if !self.inputs.is_empty() {
            config.batch.input_dirs = self.inputs;
        }
        if let Some(output) = self.output {
            config.batch.output_dir = output;
        }
        if let Some(n) = self.concurrency {
            config.batch.concurrency = n.max(1);
        }
        if let Some(model) = self.model {
            config.embedding.model_id = model;
        }
        if self.no_embeddings {
            config.embedding.enabled = false;
        }
        if self.rules_dir.is_some() {
            config.batch.rules_dir = self.rules_dir;
        }
        self.reprocess
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    let reprocess = cli.apply(&mut config);
    config.log_summary();

    let factory = Arc::new(HttpEmbedderFactory::new(config.embedding.clone()));
    let processor =
        DocumentProcessor::new(&config, factory).context("failed to build document processor")?;
    let orchestrator = BatchOrchestrator::new(processor, Arc::new(FileExtractor), &config.batch);

    let report = if reprocess.is_empty() {
        orchestrator.run_batch().await
    } else {
        info!(files = reprocess.len(), "reprocessing selected documents");
        orchestrator.reprocess(&reprocess).await
    }
    .context("batch run failed")?;

    info!(
        report = %orchestrator.report_path().display(),
        processed = report.processed,
        failed = report.failed,
        skipped = report.skipped,
        "run report written"
    );
    for error in &report.errors {
        tracing::warn!(filename = %error.filename, error = %error.message, "document failed");
    }

    if report.failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}
