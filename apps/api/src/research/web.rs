use reqwest::{Client, Url};
use tracing::debug;

use crate::research::IngestError;

const WRAP_WIDTH: usize = 100;

/// Fetches a web article and returns its body as plain text. One GET, no retry.
///
/// At most `max_bytes` of the response are read; the rest of the page is dropped.
pub async fn fetch_article_text(
    client: &Client,
    raw_url: &str,
    max_bytes: usize,
) -> Result<String, IngestError> {
    let url = parse_article_url(raw_url)?;

    let mut response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| IngestError::Fetch(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(IngestError::Fetch(format!("{url} returned {status}")));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| IngestError::Fetch(format!("could not read body of {url}: {e}")))?
    {
        body.extend_from_slice(&chunk);
        if body.len() >= max_bytes {
            body.truncate(max_bytes);
            debug!("HTML from {url} capped at {max_bytes} bytes");
            break;
        }
    }

    let html = String::from_utf8_lossy(&body);
    debug!("Fetched {} bytes of HTML from {}", html.len(), url);
    Ok(html_to_article_text(&html))
}

pub fn parse_article_url(raw_url: &str) -> Result<Url, IngestError> {
    let url = Url::parse(raw_url.trim())
        .map_err(|e| IngestError::InvalidUrl(format!("'{raw_url}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(IngestError::InvalidUrl(format!(
            "unsupported scheme '{other}', expected http or https"
        ))),
    }
}

/// Narrows the page to its main `<article>` (falling back to `<body>`) and renders plain text.
///
/// The main article is the longest top-level one, so teaser cards placed before the
/// story and related-story cards nested inside it do not replace the story itself.
pub fn html_to_article_text(html: &str) -> String {
    let fragment = top_level_elements(html, "article")
        .into_iter()
        .max_by_key(|span| span.len())
        .or_else(|| top_level_elements(html, "body").into_iter().next())
        .unwrap_or(html);
    html2text::from_read(fragment.as_bytes(), WRAP_WIDTH)
}

/// Every outermost `<tag ...>...</tag>` span in document order, matched case-insensitively.
/// Nested elements of the same tag stay inside their parent's span. Unclosed elements are dropped.
fn top_level_elements<'a>(html: &'a str, tag: &str) -> Vec<&'a str> {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut pos = 0;

    while let Some(rel) = lower[pos..].find('<') {
        let idx = pos + rel;
        let rest = &lower[idx..];

        if rest.starts_with(&close) {
            pos = idx + close.len();
            if depth > 0 {
                depth -= 1;
                if depth == 0 {
                    spans.push(&html[start..pos]);
                }
            }
        } else if rest.starts_with(&open)
            && matches!(
                rest.as_bytes().get(open.len()),
                Some(b'>' | b' ' | b'\t' | b'\n' | b'\r')
            )
        {
            if depth == 0 {
                start = idx;
            }
            depth += 1;
            pos = idx + open.len();
        } else {
            pos = idx + 1;
        }
    }

    spans
}
