use super::ExtractedText;

fn decode(bytes: &[u8]) -> String {
    // Try UTF-8 first, fall back to lossy conversion
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

pub(super) fn extract_plain(bytes: &[u8]) -> ExtractedText {
    ExtractedText {
        pages: vec![decode(bytes).trim().to_string()],
        heading: None,
    }
}

pub(super) fn extract_markdown(bytes: &[u8]) -> ExtractedText {
    let text = decode(bytes);
    let heading = text
        .lines()
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|h| !h.is_empty());

    ExtractedText {
        pages: vec![text.trim().to_string()],
        heading,
    }
}
