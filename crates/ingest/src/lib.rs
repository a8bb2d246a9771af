//! Document-to-chunk preparation pipeline for retrieval-augmented generation.
//!
//! Text is normalized, split, optimized into a length band, filtered for noise
//! and embedded, one document at a time; [`BatchOrchestrator`] drives many
//! documents through it in bounded concurrent groups.

pub mod chunker;
pub mod embedding;
pub mod extract;
pub mod filter;
pub mod normalizer;
pub mod orchestrator;
pub mod pipeline;
pub mod rules;

pub use extract::{FileExtractor, TextExtractor};
pub use orchestrator::BatchOrchestrator;
pub use pipeline::{DocumentProcessor, ProcessedDocument};
