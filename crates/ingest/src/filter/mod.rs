//! Chunk-level content filter.
//!
//! Every chunk goes through two phases. The removal phase drops chunks that
//! are too short, match a whole-chunk noise rule, or are dominated by a
//! repeated noise phrase. The cleaning phase excises noise spans from what is
//! left, then the quality check decides whether the cleaned chunk survives.

mod scoring;

pub use scoring::{distinct_chars, has_keyword, quality_score, repetition_ratio};

use ragprep_core::config::FilterConfig;
use ragprep_core::{reindex, Chunk};

use crate::chunker::char_len;
use crate::normalizer::collapse_whitespace;
use crate::rules::CompiledRuleTable;

/// Why a chunk was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalReason {
    TooShort,
    /// Whole chunk matched the named drop rule.
    NoisePattern(String),
    /// The named noise phrase covers too much of the chunk.
    NoiseDominated(String),
    EmptyAfterCleaning,
    LowDiversity,
    LowQuality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Index of the chunk in the filter's input.
    pub index: usize,
    pub reason: RemovalReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub original: usize,
    pub removed: usize,
    /// Survivors whose content was rewritten by a replace rule.
    pub cleaned: usize,
    /// Short survivors kept verbatim for their keyword.
    pub preserved: usize,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub chunks: Vec<Chunk>,
    pub stats: FilterStats,
    pub removals: Vec<Removal>,
}

enum Verdict {
    Keep(Chunk),
    Remove(RemovalReason),
}

pub struct ContentFilter {
    rules: CompiledRuleTable,
    config: FilterConfig,
}

impl ContentFilter {
    pub fn new(rules: CompiledRuleTable, config: FilterConfig) -> Self {
        Self { rules, config }
    }

    pub fn filter(&self, chunks: Vec<Chunk>) -> FilterOutcome {
        let mut stats = FilterStats {
            original: chunks.len(),
            ..Default::default()
        };
        let mut survivors = Vec::with_capacity(chunks.len());
        let mut removals = Vec::new();

        for chunk in chunks {
            let index = chunk.index;
            match self.assess(chunk) {
                Verdict::Keep(chunk) => {
                    if chunk.provenance.cleaned {
                        stats.cleaned += 1;
                    }
                    if chunk.provenance.content_preserved {
                        stats.preserved += 1;
                    }
                    survivors.push(chunk);
                }
                Verdict::Remove(reason) => {
                    tracing::debug!(index, ?reason, "chunk removed");
                    stats.removed += 1;
                    removals.push(Removal { index, reason });
                }
            }
        }

        reindex(&mut survivors);
        FilterOutcome {
            chunks: survivors,
            stats,
            removals,
        }
    }

    fn assess(&self, mut chunk: Chunk) -> Verdict {
        // ── Removal phase ──
        let content = chunk.content.trim();
        if char_len(content) < self.config.min_length {
            return Verdict::Remove(RemovalReason::TooShort);
        }
        if let Some(rule) = self.rules.first_drop_match(content) {
            return Verdict::Remove(RemovalReason::NoisePattern(rule.to_string()));
        }
        if let Some(phrase) = self.dominant_noise_phrase(content) {
            return Verdict::Remove(RemovalReason::NoiseDominated(phrase.to_string()));
        }

        // ── Cleaning phase ──
        let (cleaned, rewritten) = self.excise_noise(content);
        if cleaned.is_empty() {
            return Verdict::Remove(RemovalReason::EmptyAfterCleaning);
        }
        if distinct_chars(&cleaned) < self.config.min_distinct_chars {
            return Verdict::Remove(RemovalReason::LowDiversity);
        }

        let keyword = has_keyword(&cleaned, &self.rules.keywords);
        let score = quality_score(&cleaned, keyword, &self.config);
        if score == 0 {
            return Verdict::Remove(RemovalReason::LowQuality);
        }

        if char_len(&cleaned) < self.config.quality_min_length {
            // Keyword overrides the length heuristic; keep the original text.
            chunk.content = content.to_string();
            chunk.provenance.content_preserved = true;
        } else {
            chunk.content = cleaned;
            chunk.provenance.cleaned |= rewritten;
        }
        chunk.provenance.quality_score = score;
        Verdict::Keep(chunk)
    }

    /// A noise phrase repeated at least `noise_min_repeats` times whose total
    /// span exceeds `noise_dominance` of the chunk.
    fn dominant_noise_phrase(&self, content: &str) -> Option<&str> {
        let total = char_len(content) as f64;
        self.rules
            .noise_phrases
            .iter()
            .find(|phrase| {
                let count = content.matches(phrase.as_str()).count();
                count >= self.rules.noise_min_repeats
                    && (count * char_len(phrase)) as f64 > self.config.noise_dominance * total
            })
            .map(String::as_str)
    }

    /// Apply every replace rule in order, then re-collapse whitespace.
    /// Returns the cleaned text and whether any rule fired.
    fn excise_noise(&self, content: &str) -> (String, bool) {
        let mut text = content.to_string();
        let mut rewritten = false;
        for rule in self.rules.replace_rules() {
            if rule.regex.is_match(&text) {
                text = rule.regex.replace_all(&text, rule.replacement.as_str()).into_owned();
                rewritten = true;
            }
        }
        if !rewritten {
            return (text, false);
        }
        (collapse_whitespace(&text), true)
    }
}
