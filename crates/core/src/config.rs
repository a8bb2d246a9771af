use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_f64(profile: &str, key: &str, default: f64) -> f64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).map(|v| v.to_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub chunking: ChunkingConfig,
    pub normalizer: NormalizerConfig,
    pub filter: FilterConfig,
    pub embedding: EmbeddingConfig,
    pub batch: BatchConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RAGPREP_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("RAGPREP_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            chunking: ChunkingConfig::from_env_profiled(p),
            normalizer: NormalizerConfig::from_env_profiled(p),
            filter: FilterConfig::from_env_profiled(p),
            embedding: EmbeddingConfig::from_env_profiled(p),
            batch: BatchConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  chunking:    size={}, overlap={}, max_chunks={}, length=[{}, {}]",
            self.chunking.chunk_size,
            self.chunking.chunk_overlap,
            self.chunking.max_chunks,
            self.chunking.min_chunk_length,
            self.chunking.max_chunk_length
        );
        tracing::info!(
            "  normalizer:  garbled_threshold={}, overclean_ratio={}",
            self.normalizer.garbled_threshold,
            self.normalizer.overclean_ratio
        );
        tracing::info!(
            "  embedding:   enabled={}, provider={}, model={}",
            self.embedding.enabled,
            self.embedding.provider,
            self.embedding.model_id
        );
        tracing::info!(
            "  batch:       inputs={:?}, output={}, concurrency={}",
            self.batch.input_dirs,
            self.batch.output_dir.display(),
            self.batch.concurrency
        );
    }
}

// ── Chunking ──────────────────────────────────────────────────

/// Splitter and optimizer sizes, all measured in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_chunks: usize,
    pub min_chunk_length: usize,
    pub max_chunk_length: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            max_chunks: 500,
            min_chunk_length: 50,
            max_chunk_length: 8000,
        }
    }
}

impl ChunkingConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            chunk_size: profiled_env_usize(p, "CHUNK_SIZE", d.chunk_size),
            chunk_overlap: profiled_env_usize(p, "CHUNK_OVERLAP", d.chunk_overlap),
            max_chunks: profiled_env_usize(p, "MAX_CHUNKS_PER_DOCUMENT", d.max_chunks),
            min_chunk_length: profiled_env_usize(p, "MIN_CHUNK_LENGTH", d.min_chunk_length),
            max_chunk_length: profiled_env_usize(p, "MAX_CHUNK_LENGTH", d.max_chunk_length),
        }
    }
}

// ── Normalizer ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Share of non-standard characters above which a document needs review.
    pub garbled_threshold: f64,
    /// Cleaned text shorter than this fraction of the raw text is discarded.
    pub overclean_ratio: f64,
    /// Texts shorter than this (after whitespace collapsing) short-circuit.
    pub min_text_length: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            garbled_threshold: 0.20,
            overclean_ratio: 0.10,
            min_text_length: 10,
        }
    }
}

impl NormalizerConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            garbled_threshold: profiled_env_f64(p, "GARBLED_THRESHOLD", d.garbled_threshold),
            overclean_ratio: profiled_env_f64(p, "OVERCLEAN_RATIO", d.overclean_ratio),
            min_text_length: d.min_text_length,
        }
    }
}

// ── Content filter ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Chunks shorter than this are removed outright.
    pub min_length: usize,
    /// Cleaned chunks shorter than this score 0 unless a keyword is present.
    pub quality_min_length: usize,
    /// Chunks with fewer distinct characters are always removed.
    pub min_distinct_chars: usize,
    /// A noise phrase covering more than this share of a chunk removes it.
    pub noise_dominance: f64,
    /// Token repetition ratio below which a chunk earns a quality point.
    pub low_repetition_ratio: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_length: 5,
            quality_min_length: 20,
            min_distinct_chars: 5,
            noise_dominance: 0.5,
            low_repetition_ratio: 0.5,
        }
    }
}

impl FilterConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            min_length: profiled_env_usize(p, "FILTER_MIN_LENGTH", d.min_length),
            quality_min_length: profiled_env_usize(p, "FILTER_QUALITY_MIN_LENGTH", d.quality_min_length),
            min_distinct_chars: profiled_env_usize(p, "FILTER_MIN_DISTINCT_CHARS", d.min_distinct_chars),
            noise_dominance: profiled_env_f64(p, "FILTER_NOISE_DOMINANCE", d.noise_dominance),
            low_repetition_ratio: d.low_repetition_ratio,
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub enabled: bool,
    /// "ollama", "openai"
    pub provider: String,
    /// Model registry identifier.
    pub model_id: String,
    pub cache_size: usize,
    pub ollama_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "ollama".to_string(),
            model_id: crate::model::DEFAULT_MODEL_ID.to_string(),
            cache_size: 1024,
            ollama_url: "http://localhost:11434".to_string(),
            openai_api_key: None,
            openai_base_url: None,
        }
    }
}

impl EmbeddingConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            enabled: profiled_env_bool(p, "EMBEDDING_ENABLED", d.enabled),
            provider: profiled_env_or(p, "EMBEDDING_PROVIDER", &d.provider),
            model_id: profiled_env_or(p, "EMBEDDING_MODEL", &d.model_id),
            cache_size: profiled_env_usize(p, "EMBEDDING_CACHE_SIZE", d.cache_size),
            ollama_url: profiled_env_or(p, "OLLAMA_URL", &d.ollama_url),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
        }
    }
}

// ── Batch ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub input_dirs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub concurrency: usize,
    /// Directory with `normalizer.yml` / `content-filter.yml` overrides.
    pub rules_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dirs: vec![PathBuf::from("data/input")],
            output_dir: PathBuf::from("data/output"),
            concurrency: 3,
            rules_dir: None,
        }
    }
}

impl BatchConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        let input_dirs = profiled_env_opt(p, "INPUT_DIRS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from)
                    .collect::<Vec<_>>()
            })
            .filter(|dirs| !dirs.is_empty())
            .unwrap_or(d.input_dirs);
        Self {
            input_dirs,
            output_dir: profiled_env_opt(p, "OUTPUT_DIR").map(PathBuf::from).unwrap_or(d.output_dir),
            concurrency: profiled_env_usize(p, "BATCH_CONCURRENCY", d.concurrency).max(1),
            rules_dir: profiled_env_opt(p, "RULES_DIR").map(PathBuf::from),
        }
    }
}
