use lopdf::Document;
use tracing::{debug, warn};

use crate::research::IngestError;

/// Extracts text from every page in document order, joined by newlines.
///
/// A page that fails to decode is skipped with a warning. Only a document that
/// cannot be parsed at all is an error; an empty result is left for the caller to judge.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, IngestError> {
    let doc = Document::load_mem(bytes).map_err(|e| IngestError::UnreadablePdf(e.to_string()))?;

    let pages = doc.get_pages();
    let mut parts = Vec::with_capacity(pages.len());
    let mut skipped = 0usize;

    for page_number in pages.keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => parts.push(text),
            Err(e) => {
                skipped += 1;
                warn!("Skipping PDF page {page_number}: {e}");
            }
        }
    }

    debug!(
        "Decoded {} of {} PDF pages ({} skipped)",
        parts.len(),
        pages.len(),
        skipped
    );

    Ok(parts.join("\n"))
}
