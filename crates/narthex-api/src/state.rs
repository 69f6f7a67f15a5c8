//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources. It is
//! passed to handlers via axum's State extractor. The configuration is
//! constructed once at startup and read-only from here on.

use std::sync::Arc;
use std::time::Instant;

use narthex_chat::{ChatPipeline, ResponseSynthesizer};
use narthex_core::config::NarthexConfig;
use narthex_intent::IntentClassifier;
use narthex_kb::{Ingestor, KbRepository};
use narthex_llm::GenerativeClient;
use narthex_store::{Database, ResourceRepository, SearchExecutor};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed at startup.
    pub config: Arc<NarthexConfig>,
    /// SQLite database.
    pub database: Arc<Database>,
    /// Resource repository for the listing endpoint.
    pub resources: Arc<ResourceRepository>,
    /// Intent classifier, shared with the pipeline.
    pub classifier: Arc<IntentClassifier>,
    /// The chat turn pipeline.
    pub pipeline: Arc<ChatPipeline>,
    /// Knowledge-base summary store.
    pub kb: Arc<KbRepository>,
    /// Knowledge-base ingestor.
    pub ingestor: Arc<Ingestor>,
    /// Outbound HTTP client (calendar fetch).
    pub http: reqwest::Client,
    /// Whether a generative model key is configured; the intent endpoint
    /// reports 500 without one.
    pub llm_configured: bool,
    /// Bearer token protecting all non-public routes.
    pub api_token: String,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire up all services over one database and one model client.
    pub fn new(
        config: NarthexConfig,
        database: Arc<Database>,
        llm: Arc<dyn GenerativeClient>,
    ) -> Self {
        let llm_configured = !config.llm.api_key.is_empty();
        let classifier = Arc::new(IntentClassifier::new(
            Arc::clone(&llm),
            config.search.default_limit,
        ));
        let pipeline = Arc::new(ChatPipeline::new(
            IntentClassifier::new(Arc::clone(&llm), config.search.default_limit),
            SearchExecutor::new(Arc::clone(&database)),
            ResponseSynthesizer::new(Arc::clone(&llm)),
            config.chat.max_message_length,
        ));
        let ingestor = Arc::new(Ingestor::new(
            Arc::clone(&database),
            Arc::clone(&llm),
            &config.kb,
        ));

        Self {
            resources: Arc::new(ResourceRepository::new(Arc::clone(&database))),
            kb: Arc::new(KbRepository::new(Arc::clone(&database))),
            classifier,
            pipeline,
            ingestor,
            http: reqwest::Client::new(),
            llm_configured,
            api_token: String::new(),
            start_time: Instant::now(),
            config: Arc::new(config),
            database,
        }
    }
}
