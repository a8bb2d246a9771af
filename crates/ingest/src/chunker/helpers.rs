//! Character-level helpers shared by the splitter and the optimizer.

/// Length in characters. All chunk sizes are measured this way.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` on `separator`, keeping the separator at the end of each
/// piece so that concatenating the pieces restores the input. An empty
/// separator yields single characters.
pub(crate) fn split_keep_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    text.split_inclusive(separator)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_sentence_end(chars: &[char], i: usize) -> bool {
    match chars[i] {
        '。' | '！' | '？' | '；' | '\n' => true,
        // Latin terminators only count before whitespace (skips "3.14", "e.g").
        '.' | '!' | '?' => chars.get(i + 1).map_or(true, |c| c.is_whitespace()),
        _ => false,
    }
}

/// Cut `text` into trimmed parts of at most `max_len` characters. Each part
/// ends at the last sentence terminator inside the window that still leaves
/// at least `min_len` characters, or is hard-cut at `max_len` when there is
/// none. Only the final part can come out shorter than `min_len`.
pub(crate) fn split_at_sentences(text: &str, min_len: usize, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let min_len = min_len.min(max_len);
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        if chars.len() - start <= max_len {
            parts.push(chars[start..].iter().collect::<String>());
            break;
        }
        let window_end = start + max_len;
        let cut = (start..window_end)
            .rev()
            .filter(|&i| is_sentence_end(&chars, i))
            .map(|i| i + 1)
            .find(|&cut| trimmed_len(&chars[start..cut]) >= min_len)
            .unwrap_or(window_end);
        parts.push(chars[start..cut].iter().collect::<String>());
        start = cut;
    }

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn trimmed_len(chars: &[char]) -> usize {
    let lead = chars.iter().take_while(|c| c.is_whitespace()).count();
    let trail = chars[lead..].iter().rev().take_while(|c| c.is_whitespace()).count();
    chars.len() - lead - trail
}
