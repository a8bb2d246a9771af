//! Quality heuristics used by the content filter.

use std::collections::HashSet;

use ragprep_core::config::FilterConfig;

use crate::chunker::char_len;

/// Distinct non-whitespace characters.
pub fn distinct_chars(text: &str) -> usize {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<HashSet<_>>()
        .len()
}

/// Case-insensitive substring match against lowercased keywords.
pub fn has_keyword(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

/// Share of repeated tokens: `1 - distinct / total`. ASCII alphanumeric runs
/// are one token; every other letter (CJK included) is its own token.
/// Punctuation and whitespace are ignored.
pub fn repetition_ratio(text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = tokens.iter().copied().collect();
    1.0 - distinct.len() as f64 / tokens.len() as f64
}

fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (i, ch) in text.char_indices() {
        if ch.is_ascii_alphanumeric() {
            word_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = word_start.take() {
            tokens.push(&text[start..i]);
        }
        if ch.is_alphanumeric() {
            tokens.push(&text[i..i + ch.len_utf8()]);
        }
    }
    if let Some(start) = word_start {
        tokens.push(&text[start..]);
    }
    tokens
}

/// 0 for short text without a keyword, otherwise 1 plus one point each for a
/// keyword and for low token repetition.
pub fn quality_score(text: &str, keyword: bool, config: &FilterConfig) -> u8 {
    if char_len(text) < config.quality_min_length && !keyword {
        return 0;
    }
    let mut score = 1;
    if keyword {
        score += 1;
    }
    if repetition_ratio(text) < config.low_repetition_ratio {
        score += 1;
    }
    score
}
