//! Length-band optimizer.
//!
//! A single left-to-right pass with one pending accumulator. Short pieces are
//! merged forward until they reach `min_len`, oversized chunks are cut at
//! sentence boundaries, and a short tail is folded into the last emitted
//! chunk when it fits. Output is re-indexed from 0.

use ragprep_core::config::ChunkingConfig;
use ragprep_core::{reindex, Chunk};

use super::helpers::split_at_sentences;

const MERGE_SEPARATOR: char = '\n';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    /// Merge operations performed (each absorbs one chunk into another).
    pub merged: usize,
    /// Oversized chunks that were split.
    pub split: usize,
    /// Empty or whitespace-only chunks dropped.
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    pub chunks: Vec<Chunk>,
    pub stats: OptimizeStats,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkOptimizer {
    min_len: usize,
    max_len: usize,
}

impl ChunkOptimizer {
    pub fn new(min_len: usize, max_len: usize) -> Self {
        Self {
            min_len,
            max_len: max_len.max(min_len).max(1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.min_chunk_length, config.max_chunk_length)
    }

    pub fn optimize(&self, chunks: Vec<Chunk>) -> OptimizeOutcome {
        let mut stats = OptimizeStats::default();
        let mut out: Vec<Chunk> = Vec::with_capacity(chunks.len());
        let mut pending: Option<Chunk> = None;

        for chunk in chunks {
            if chunk.content.trim().is_empty() {
                stats.removed += 1;
                continue;
            }
            let len = chunk.char_len();

            if len > self.max_len {
                let mut parts = self.split_oversized(chunk);
                stats.split += 1;
                if let Some(acc) = pending.take() {
                    if !parts.is_empty() && self.should_absorb(&acc, parts[0].char_len()) {
                        stats.merged += 1;
                        let first = parts.remove(0);
                        parts.insert(0, absorb_front(acc, first));
                    } else {
                        out.push(acc);
                    }
                }
                // The last part stays pending so a short tail can still merge forward.
                pending = parts.pop();
                out.extend(parts);
                continue;
            }

            pending = Some(match pending.take() {
                None => chunk,
                Some(acc) if self.should_absorb(&acc, len) => {
                    stats.merged += 1;
                    if len < self.min_len {
                        absorb_back(acc, chunk)
                    } else {
                        absorb_front(acc, chunk)
                    }
                }
                Some(acc) => {
                    out.push(acc);
                    chunk
                }
            });
        }

        if let Some(tail) = pending {
            match out.pop() {
                Some(last)
                    if tail.char_len() < self.min_len
                        && last.char_len() + 1 + tail.char_len() <= self.max_len =>
                {
                    stats.merged += 1;
                    out.push(absorb_back(last, tail));
                }
                Some(last) => {
                    out.push(last);
                    out.push(tail);
                }
                None => out.push(tail),
            }
        }

        for chunk in &mut out {
            chunk.provenance.below_min_length = chunk.char_len() < self.min_len;
        }
        reindex(&mut out);

        OptimizeOutcome { chunks: out, stats }
    }

    /// The accumulator takes in the next piece only while it is itself still
    /// short and the combination stays within `max_len`.
    fn should_absorb(&self, acc: &Chunk, next_len: usize) -> bool {
        let acc_len = acc.char_len();
        acc_len < self.min_len && acc_len + 1 + next_len <= self.max_len
    }

    fn split_oversized(&self, chunk: Chunk) -> Vec<Chunk> {
        let parts = split_at_sentences(&chunk.content, self.min_len, self.max_len);
        let total_parts = parts.len();
        parts
            .into_iter()
            .enumerate()
            .map(|(i, content)| {
                let mut part = Chunk::new(content, 0, chunk.source_id.clone());
                part.embedding = chunk.embedding.clone();
                part.provenance = chunk.provenance.clone();
                part.provenance.split = true;
                part.provenance.split_part = i + 1;
                part.provenance.total_parts = total_parts;
                part
            })
            .collect()
    }
}

/// Append `next` to `acc`; `acc` keeps its identity.
fn absorb_back(mut acc: Chunk, next: Chunk) -> Chunk {
    acc.content.push(MERGE_SEPARATOR);
    acc.content.push_str(&next.content);
    record_merge(&mut acc, &next);
    acc
}

/// Prepend the short accumulator `acc` to `next`; `next` keeps its identity.
fn absorb_front(acc: Chunk, mut next: Chunk) -> Chunk {
    let mut content = acc.content.clone();
    content.push(MERGE_SEPARATOR);
    content.push_str(&next.content);
    next.content = content;
    record_merge(&mut next, &acc);
    next
}

fn record_merge(into: &mut Chunk, absorbed: &Chunk) {
    into.provenance.merged = true;
    into.provenance.merged_count += absorbed.provenance.merged_count + 1;
    into.provenance.cleaned |= absorbed.provenance.cleaned;
}
