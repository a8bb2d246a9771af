//! Chunking: recursive-separator splitting followed by a length-band
//! optimization pass.

mod helpers;
mod optimizer;
mod splitter;

pub use helpers::char_len;
pub use optimizer::{ChunkOptimizer, OptimizeOutcome, OptimizeStats};
pub use splitter::{RecursiveSplitter, SplitOutcome, SEPARATORS};

use ragprep_core::Chunk;

/// Wrap raw splitter output as indexed chunks of one source document.
pub fn into_chunks(pieces: Vec<String>, source_id: &str) -> Vec<Chunk> {
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, content)| Chunk::new(content, i, source_id))
        .collect()
}
