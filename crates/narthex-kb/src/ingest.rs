//! The ingestor: fetch, extract, summarize, store.
//!
//! Triggering validates the URL synchronously; the heavy work runs on a
//! spawned task so the trigger endpoint can acknowledge immediately while
//! clients poll for the summary.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use narthex_core::config::KbConfig;
use narthex_llm::GenerativeClient;
use narthex_store::Database;

use crate::docfetch::{validate_docs_url, DocFetch, HttpDocFetcher};
use crate::error::KbError;
use crate::extract::{chunk_text, html_to_text};
use crate::store::KbRepository;
use crate::summarize::KbSummarizer;
use crate::types::{KbChunk, KbRecord};

/// Result of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A record already existed and `refresh` was false.
    AlreadyIngested,
    /// A fresh record was stored.
    Ingested,
}

/// Ingests documents into the knowledge base.
pub struct Ingestor {
    repo: KbRepository,
    fetcher: Box<dyn DocFetch>,
    summarizer: KbSummarizer,
    chunk_chars: usize,
}

impl Ingestor {
    pub fn new(db: Arc<Database>, client: Arc<dyn GenerativeClient>, config: &KbConfig) -> Self {
        Self::with_fetcher(db, client, config, Box::new(HttpDocFetcher::new()))
    }

    pub fn with_fetcher(
        db: Arc<Database>,
        client: Arc<dyn GenerativeClient>,
        config: &KbConfig,
        fetcher: Box<dyn DocFetch>,
    ) -> Self {
        Self {
            repo: KbRepository::new(db),
            fetcher,
            summarizer: KbSummarizer::new(client),
            chunk_chars: config.chunk_chars,
        }
    }

    /// Synchronous trigger validation: is this URL ingestible at all?
    pub fn validate_url(url: &str) -> Result<(), KbError> {
        validate_docs_url(url).map(|_| ())
    }

    /// The question-answering path of kb-query.
    pub async fn answer(&self, record: &KbRecord, question: &str) -> String {
        self.summarizer.answer(record, question).await
    }

    /// Run one ingestion to completion.
    pub async fn ingest(
        &self,
        resource_id: Uuid,
        url: &str,
        refresh: bool,
    ) -> Result<IngestOutcome, KbError> {
        if !refresh && self.repo.get(resource_id)?.is_some() {
            return Ok(IngestOutcome::AlreadyIngested);
        }

        let html = self.fetcher.fetch_html(url).await?;
        let text = html_to_text(&html);
        if text.trim().is_empty() {
            return Err(KbError::EmptyDocument);
        }

        let (summary, key_points) = self.summarizer.summarize(&text).await;
        let chunks: Vec<KbChunk> = chunk_text(&text, self.chunk_chars)
            .into_iter()
            .enumerate()
            .map(|(i, content)| KbChunk {
                id: format!("{}-{}", resource_id, i),
                content,
            })
            .collect();

        let record = KbRecord {
            resource_id,
            source_url: url.to_string(),
            summary,
            key_points,
            chunks,
            created_at: Utc::now(),
        };
        self.repo.upsert(&record)?;

        info!(%resource_id, "document ingested");
        Ok(IngestOutcome::Ingested)
    }

    /// Fire-and-forget ingestion for the trigger endpoint.
    pub fn spawn(self: Arc<Self>, resource_id: Uuid, url: String, refresh: bool) {
        tokio::spawn(async move {
            match self.ingest(resource_id, &url, refresh).await {
                Ok(outcome) => info!(%resource_id, ?outcome, "ingestion finished"),
                Err(e) => warn!(%resource_id, error = %e, "ingestion failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use narthex_llm::{LlmError, StaticClient};

    const DOC_URL: &str = "https://docs.google.com/document/d/abc123/edit";

    struct StaticFetcher {
        html: Option<String>,
        fail_status: Option<u16>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticFetcher {
        fn ok(html: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    html: Some(html.to_string()),
                    fail_status: None,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }

        fn failing(status: u16) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    html: None,
                    fail_status: Some(status),
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl DocFetch for StaticFetcher {
        async fn fetch_html(&self, _url: &str) -> Result<String, KbError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match (&self.html, self.fail_status) {
                (_, Some(status)) => Err(KbError::FetchFailed { status }),
                (Some(html), None) => Ok(html.clone()),
                (None, None) => Err(KbError::Network("static".to_string())),
            }
        }
    }

    fn ingestor(fetcher: StaticFetcher) -> (Arc<Database>, Ingestor) {
        let db = Arc::new(Database::in_memory().unwrap());
        let ingestor = Ingestor::with_fetcher(
            Arc::clone(&db),
            Arc::new(StaticClient::failing(LlmError::NotConfigured)),
            &KbConfig::default(),
            Box::new(fetcher),
        );
        (db, ingestor)
    }

    #[tokio::test]
    async fn test_ingest_stores_summary_and_chunks() {
        let (fetcher, _calls) = StaticFetcher::ok(
            "<p>The coaching program pairs new leaders with experienced coaches.</p>\
             <p>Applications open every fall and close in October each year.</p>",
        );
        let (db, ingestor) = ingestor(fetcher);
        let id = Uuid::new_v4();

        let outcome = ingestor.ingest(id, DOC_URL, false).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Ingested);

        let record = KbRepository::new(db).get(id).unwrap().unwrap();
        assert!(!record.summary.trim().is_empty());
        assert!(!record.chunks.is_empty());
        assert!(record.chunks[0].id.starts_with(&id.to_string()));
        assert_eq!(record.source_url, DOC_URL);
    }

    #[tokio::test]
    async fn test_ingest_skips_existing_without_refresh() {
        let (fetcher, calls) =
            StaticFetcher::ok("<p>Some document body with enough text to summarize.</p>");
        let (_db, ingestor) = ingestor(fetcher);
        let id = Uuid::new_v4();

        assert_eq!(
            ingestor.ingest(id, DOC_URL, false).await.unwrap(),
            IngestOutcome::Ingested
        );
        assert_eq!(
            ingestor.ingest(id, DOC_URL, false).await.unwrap(),
            IngestOutcome::AlreadyIngested
        );
        // The second call never fetched.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ingest_refresh_replaces() {
        let (fetcher, calls) =
            StaticFetcher::ok("<p>Some document body with enough text to summarize.</p>");
        let (_db, ingestor) = ingestor(fetcher);
        let id = Uuid::new_v4();

        ingestor.ingest(id, DOC_URL, false).await.unwrap();
        assert_eq!(
            ingestor.ingest(id, DOC_URL, true).await.unwrap(),
            IngestOutcome::Ingested
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ingest_propagates_fetch_failure() {
        let (fetcher, _calls) = StaticFetcher::failing(403);
        let (_db, ingestor) = ingestor(fetcher);

        let err = ingestor
            .ingest(Uuid::new_v4(), DOC_URL, false)
            .await
            .unwrap_err();
        assert!(matches!(err, KbError::FetchFailed { status: 403 }));
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_document() {
        let (fetcher, _calls) =
            StaticFetcher::ok("<style>.a{}</style><script>var x = 1;</script>");
        let (_db, ingestor) = ingestor(fetcher);

        let err = ingestor
            .ingest(Uuid::new_v4(), DOC_URL, false)
            .await
            .unwrap_err();
        assert!(matches!(err, KbError::EmptyDocument));
    }

    #[test]
    fn test_validate_url() {
        assert!(Ingestor::validate_url(DOC_URL).is_ok());
        assert!(matches!(
            Ingestor::validate_url("https://example.org/x"),
            Err(KbError::NotGoogleDocsUrl(_))
        ));
    }
}
