//! Text normalization: whitespace collapsing, boilerplate line removal and
//! garbled-text detection.

use ragprep_core::config::NormalizerConfig;

use crate::rules::CompiledRuleTable;

/// Result of normalizing one document's text.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    pub cleaned_text: String,
    pub needs_review: bool,
    /// Lines removed by boilerplate rules (0 when the over-cleaning guard fired).
    pub removed_lines: usize,
    /// Share of characters outside the accepted set.
    pub garbled_ratio: f64,
}

pub struct TextNormalizer {
    rules: CompiledRuleTable,
    config: NormalizerConfig,
}

impl TextNormalizer {
    pub fn new(rules: CompiledRuleTable, config: NormalizerConfig) -> Self {
        Self { rules, config }
    }

    pub fn normalize(&self, raw_text: &str) -> NormalizedText {
        let collapsed = collapse_whitespace(raw_text);
        let collapsed_len = collapsed.chars().count();
        if collapsed_len < self.config.min_text_length {
            return NormalizedText {
                garbled_ratio: garbled_ratio(&collapsed),
                cleaned_text: collapsed,
                needs_review: true,
                removed_lines: 0,
            };
        }

        let (stripped, removed_lines) = self.strip_boilerplate(&collapsed);
        let cleaned = collapse_whitespace(&stripped);

        let raw_len = raw_text.chars().count();
        if (cleaned.chars().count() as f64) < self.config.overclean_ratio * raw_len as f64 {
            tracing::warn!(
                raw_len,
                cleaned_len = cleaned.chars().count(),
                removed_lines,
                "removal rules stripped too much text, keeping whitespace-collapsed original"
            );
            return NormalizedText {
                garbled_ratio: garbled_ratio(&collapsed),
                cleaned_text: collapsed,
                needs_review: true,
                removed_lines: 0,
            };
        }

        let ratio = garbled_ratio(&cleaned);
        let needs_review = ratio > self.config.garbled_threshold;
        if needs_review {
            tracing::debug!(garbled_ratio = ratio, "text flagged as garbled");
        }

        NormalizedText {
            cleaned_text: cleaned,
            needs_review,
            removed_lines,
            garbled_ratio: ratio,
        }
    }

    /// Drop every line matched by a rule. Matching is per line so a rule can
    /// never cut into the middle of a body line.
    fn strip_boilerplate(&self, text: &str) -> (String, usize) {
        let mut removed = 0;
        let mut kept: Vec<&str> = Vec::new();
        for line in text.split('\n') {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                if let Some(id) = self.rules.first_drop_match(trimmed) {
                    tracing::trace!(rule = id, line = trimmed, "removed boilerplate line");
                    removed += 1;
                    continue;
                }
            }
            kept.push(line);
        }
        (kept.join("\n"), removed)
    }
}

/// Collapse horizontal whitespace runs to one space and blank-line runs to one
/// paragraph break, trimming every line.
pub fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_blank = false;
    let mut first_content = true;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            prev_was_blank = true;
            continue;
        }
        if !first_content {
            result.push_str(if prev_was_blank { "\n\n" } else { "\n" });
        }
        collapse_internal_whitespace(trimmed, &mut result);
        prev_was_blank = false;
        first_content = false;
    }

    result
}

fn collapse_internal_whitespace(line: &str, out: &mut String) {
    let mut prev_was_space = false;
    for ch in line.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                out.push(' ');
                prev_was_space = true;
            }
        } else {
            out.push(ch);
            prev_was_space = false;
        }
    }
}

/// Fraction of characters that are not CJK, Latin, digits, common punctuation
/// or whitespace. Empty text scores 0.
pub fn garbled_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut odd = 0usize;
    for ch in text.chars() {
        total += 1;
        if !is_accepted_char(ch) {
            odd += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        odd as f64 / total as f64
    }
}

fn is_accepted_char(ch: char) -> bool {
    ch.is_whitespace()
        || ch.is_ascii_alphanumeric()
        || ch.is_ascii_punctuation()
        || matches!(ch,
            '\u{4E00}'..='\u{9FFF}'     // CJK unified ideographs
            | '\u{3400}'..='\u{4DBF}'   // extension A
            | '\u{F900}'..='\u{FAFF}'   // compatibility ideographs
            | '\u{00C0}'..='\u{024F}'   // Latin-1 supplement and extended letters
            | '\u{3000}'..='\u{303F}'   // CJK symbols and punctuation
            | '\u{FF00}'..='\u{FFEF}'   // full-width forms
            | '\u{2000}'..='\u{206F}'   // general punctuation
            | '\u{00A0}'..='\u{00BF}'   // Latin-1 punctuation and signs
        )
}
