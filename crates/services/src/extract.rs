//! The text-extraction collaborator: raw PDF bytes in, one text string out.

use async_trait::async_trait;

use crate::error::ExtractionError;

/// Contract for turning an uploaded PDF into text.
///
/// The output is one string: each page's tokens joined with single spaces,
/// pages concatenated in page order with no page-break marker.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of the document.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError` on malformed or unreadable input.
    async fn extract(&self, pdf_bytes: Vec<u8>) -> Result<String, ExtractionError>;
}

/// Extractor backed by the `pdf-extract` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, pdf_bytes: Vec<u8>) -> Result<String, ExtractionError> {
        // The parser is CPU-bound and can choke on hostile input; keep it off
        // the async runtime threads.
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&pdf_bytes)
        })
        .await
        .map_err(|_| ExtractionError::TaskAborted)?
        .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;

        Ok(join_pages(&pages))
    }
}

/// Collapse each page to space-joined tokens and concatenate the pages bare.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
