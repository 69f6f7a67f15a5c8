//! Google Docs URL validation and export fetching.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::error::KbError;

// Document id shapes: standard docs URL, Drive URL, query-parameter form.
static DOC_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"document/d/([a-zA-Z0-9_-]+)",
        r"file/d/([a-zA-Z0-9_-]+)",
        r"id=([a-zA-Z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid doc id regex"))
    .collect()
});

/// Extract a document id from any recognized Google Docs URL shape.
pub fn extract_doc_id(url: &str) -> Option<String> {
    DOC_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Validate a URL for ingestion/rendering and return its document id.
pub fn validate_docs_url(url: &str) -> Result<String, KbError> {
    if url.trim().is_empty() {
        return Err(KbError::NoUrl);
    }
    if !url.contains("docs.google.com") && !url.contains("drive.google.com") {
        return Err(KbError::NotGoogleDocsUrl(url.to_string()));
    }
    extract_doc_id(url).ok_or_else(|| KbError::InvalidGoogleDocsUrl(url.to_string()))
}

/// Fetches document content for ingestion and rendering.
#[async_trait]
pub trait DocFetch: Send + Sync {
    /// Fetch the exported HTML for a document URL.
    async fn fetch_html(&self, url: &str) -> Result<String, KbError>;
}

/// HTTP fetcher using the public Google Docs HTML export.
pub struct HttpDocFetcher {
    http: reqwest::Client,
}

impl HttpDocFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http }
    }
}

impl Default for HttpDocFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocFetch for HttpDocFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String, KbError> {
        let id = validate_docs_url(url)?;
        let export_url = format!(
            "https://docs.google.com/document/d/{}/export?format=html",
            id
        );

        let response = self
            .http
            .get(&export_url)
            .send()
            .await
            .map_err(|e| KbError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KbError::FetchFailed {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| KbError::Network(e.to_string()))
    }
}
