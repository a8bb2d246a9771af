//! Recursive-separator splitter.
//!
//! Text is split on the highest-priority separator it contains; pieces still
//! longer than the target size are re-split with the next separator down the
//! list. The empty separator at the end slices single characters, so the
//! recursion always terminates. Fitting pieces are then packed back together
//! up to the target size, carrying a tail of the previous chunk forward as
//! overlap.

use std::collections::VecDeque;

use ragprep_core::config::ChunkingConfig;

use super::helpers::{char_len, split_keep_separator};

/// Separators in precedence order.
pub const SEPARATORS: &[&str] = &[
    "\n\n", // paragraph
    "\n",   // line
    "。", "！", "？", "；", // CJK sentence ends
    ". ", "! ", "? ", // Latin sentence ends
    " ",
    "",
];

/// Raw splitter output for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    pub chunks: Vec<String>,
    /// Set when the output was cut down to `max_chunks`.
    pub truncated: bool,
    /// Number of chunks produced before truncation.
    pub produced: usize,
}

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    max_chunks: usize,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize, max_chunks: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            // Overlap must leave room for new content in every chunk.
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            max_chunks: max_chunks.max(1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.max_chunks)
    }

    pub fn split(&self, text: &str) -> SplitOutcome {
        let mut chunks = self.split_recursive(text, SEPARATORS);
        let produced = chunks.len();
        let truncated = produced > self.max_chunks;
        if truncated {
            tracing::warn!(
                produced,
                max_chunks = self.max_chunks,
                "chunk limit reached, truncating document"
            );
            chunks.truncate(self.max_chunks);
        }
        SplitOutcome {
            chunks,
            truncated,
            produced,
        }
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, lower) = pick_separator(text, separators);
        let mut final_chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();

        for piece in split_keep_separator(text, separator) {
            if char_len(&piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                final_chunks.extend(self.merge_pieces(std::mem::take(&mut fitting)));
            }
            if lower.is_empty() {
                final_chunks.push(piece);
            } else {
                final_chunks.extend(self.split_recursive(&piece, lower));
            }
        }
        if !fitting.is_empty() {
            final_chunks.extend(self.merge_pieces(fitting));
        }
        final_chunks
    }

    /// Pack consecutive pieces into chunks of at most `chunk_size` characters.
    /// After emitting a chunk, trailing pieces totalling at most
    /// `chunk_overlap` characters are kept as the head of the next chunk.
    fn merge_pieces(&self, pieces: Vec<String>) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<String> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(&piece);
            if total + len > self.chunk_size && !current.is_empty() {
                push_joined(&mut docs, &current);
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(&front),
                        None => break,
                    }
                }
            }
            total += len;
            current.push_back(piece);
        }
        push_joined(&mut docs, &current);
        docs
    }
}

/// First separator present in `text`, plus the lower-priority separators
/// left for recursion.
fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, &sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return (sep, &[]);
        }
        if text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

fn push_joined(docs: &mut Vec<String>, pieces: &VecDeque<String>) {
    let joined: String = pieces.iter().map(String::as_str).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}
