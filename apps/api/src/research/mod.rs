//! Research ingestion: turns an uploaded PDF or an article URL into bounded plain text.
//!
//! Flow: decode (PDF pages or fetched HTML) → strip non-printable characters →
//!       reject empty text → truncate to the character budget.
//!
//! A failure at any step aborts the invocation. Nothing here retries.

pub mod pdf;
pub mod text;
pub mod web;

use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

pub use text::TruncationNotice;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("document contains no extractable text")]
    EmptyDocument,

    #[error("PDF could not be parsed: {0}")]
    UnreadablePdf(String),

    #[error("invalid article URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Fetch(String),

    #[error("PDF decoding task failed: {0}")]
    Worker(String),
}

/// Where the research material comes from.
#[derive(Debug, Clone)]
pub enum ResearchSource {
    Pdf(Bytes),
    Url(String),
}

impl ResearchSource {
    pub fn kind(&self) -> &'static str {
        match self {
            ResearchSource::Pdf(_) => "pdf",
            ResearchSource::Url(_) => "url",
        }
    }
}

/// Plain research text, ready to embed in a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct IngestedResearch {
    pub text: String,
    /// Present only when the text was cut to fit the character budget.
    pub truncation: Option<TruncationNotice>,
}

/// Raw HTML read per fetched page, per character of research budget.
const HTML_BYTES_PER_BUDGET_CHAR: usize = 64;

#[derive(Clone)]
pub struct Ingestor {
    http: Client,
    char_budget: usize,
}

impl Ingestor {
    pub fn new(char_budget: usize) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, char_budget })
    }

    pub fn char_budget(&self) -> usize {
        self.char_budget
    }

    fn max_html_bytes(&self) -> usize {
        self.char_budget.saturating_mul(HTML_BYTES_PER_BUDGET_CHAR)
    }

    pub async fn extract(&self, source: ResearchSource) -> Result<IngestedResearch, IngestError> {
        let raw = match source {
            ResearchSource::Pdf(bytes) => {
                tokio::task::spawn_blocking(move || pdf::extract_pdf_text(&bytes))
                    .await
                    .map_err(|e| IngestError::Worker(e.to_string()))??
            }
            ResearchSource::Url(url) => {
                web::fetch_article_text(&self.http, &url, self.max_html_bytes()).await?
            }
        };
        finish(raw, self.char_budget)
    }
}

/// Common post-processing for every source.
pub fn finish(raw: String, char_budget: usize) -> Result<IngestedResearch, IngestError> {
    let clean = text::strip_non_printable(&raw);
    if clean.trim().is_empty() {
        return Err(IngestError::EmptyDocument);
    }

    let (text, truncation) = text::truncate_chars(clean, char_budget);
    if let Some(notice) = &truncation {
        info!(
            "Research text truncated from {} to {} characters",
            notice.original, notice.kept
        );
    }

    Ok(IngestedResearch { text, truncation })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_passes_through_unmodified() {
        let raw = "Boston University announces 40% increase in counseling wait times";
        let research = finish(raw.to_string(), 8_000).unwrap();
        assert_eq!(research.text, raw);
        assert!(research.truncation.is_none());
    }

    #[test]
    fn test_long_text_is_truncated_with_notice() {
        let raw = "a".repeat(20_000);
        let research = finish(raw, 8_000).unwrap();
        assert_eq!(research.text.chars().count(), 8_000);
        assert_eq!(
            research.truncation,
            Some(TruncationNotice {
                original: 20_000,
                kept: 8_000
            })
        );
    }

    #[test]
    fn test_whitespace_and_control_only_is_empty_document() {
        let err = finish(" \n\t\u{0000}\u{000c} ".to_string(), 8_000).unwrap_err();
        assert!(matches!(err, IngestError::EmptyDocument));
    }

    #[tokio::test]
    async fn test_garbage_pdf_bytes_are_unreadable() {
        let ingestor = Ingestor::new(8_000).unwrap();
        let err = ingestor
            .extract(ResearchSource::Pdf(Bytes::from_static(b"not a pdf at all")))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnreadablePdf(_)));
    }

    #[tokio::test]
    async fn test_blank_pdf_is_empty_document() {
        let ingestor = Ingestor::new(8_000).unwrap();
        let bytes = pdf::tests::blank_pdf(2);
        let err = ingestor
            .extract(ResearchSource::Pdf(Bytes::from(bytes)))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::EmptyDocument));
    }
}
