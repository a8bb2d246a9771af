use super::{ExtractedText, ExtractionError};

/// pdf-extract returns one string with pages separated by form feeds.
/// Scanned PDFs yield no text; that is passed through as a single empty page
/// and the normalizer flags the document for review.
pub(super) fn extract_pdf(bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    Ok(split_pages(&text))
}

fn split_pages(text: &str) -> ExtractedText {
    let pages: Vec<String> = text
        .split('\x0C')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .map(str::to_string)
        .collect();

    if pages.is_empty() {
        tracing::warn!("PDF contains no extractable text");
    }

    ExtractedText {
        pages: if pages.is_empty() { vec![String::new()] } else { pages },
        heading: None,
    }
}
