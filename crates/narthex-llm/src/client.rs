//! Generative client trait and implementations.
//!
//! `GeminiClient` talks to the generativelanguage `generateContent`
//! endpoint. `StaticClient` is a canned double for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use narthex_core::config::LlmConfig;

use crate::error::LlmError;

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    /// Fixed instruction prepended to the user content.
    pub system: &'a str,
    /// User content.
    pub user: &'a str,
    /// Request strict JSON output from the model.
    pub json_output: bool,
}

/// A client that can turn a prompt into generated text.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, req: GenerateRequest<'_>) -> Result<String, LlmError>;
}

// =============================================================================
// GeminiClient
// =============================================================================

/// HTTP client for the generativelanguage `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, req: GenerateRequest<'_>) -> Result<String, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured);
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            self.config.api_key
        );

        let mut generation_config = json!({ "temperature": self.config.temperature });
        if req.json_output {
            generation_config["responseMimeType"] = json!("application/json");
        }

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("{}\n\nUser: {}", req.system, req.user) }]
            }],
            "generationConfig": generation_config,
        });

        debug!(model = %self.config.model, json_output = req.json_output, "generate request");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let text = extract_candidate_text(&data);
        if text.trim().is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(text)
    }
}

/// Join the text parts of the first candidate, tolerating missing fields.
fn extract_candidate_text(data: &Value) -> String {
    data.get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

// =============================================================================
// StaticClient
// =============================================================================

/// Canned client for tests: replays a queue of responses, then falls back
/// to a terminal behavior once the queue is drained.
pub struct StaticClient {
    queue: Mutex<VecDeque<Result<String, LlmError>>>,
    exhausted: Result<String, LlmError>,
}

impl StaticClient {
    /// Replay `responses` in order, then return `LlmError::Empty`.
    pub fn sequence(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            queue: Mutex::new(responses.into_iter().collect()),
            exhausted: Err(LlmError::Empty),
        }
    }

    /// Always return the same text.
    pub fn always(text: &str) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            exhausted: Ok(text.to_string()),
        }
    }

    /// Always return the given error.
    pub fn failing(error: LlmError) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            exhausted: Err(error),
        }
    }
}

#[async_trait]
impl GenerativeClient for StaticClient {
    async fn generate(&self, _req: GenerateRequest<'_>) -> Result<String, LlmError> {
        let mut queue = self.queue.lock().expect("queue mutex poisoned");
        match queue.pop_front() {
            Some(response) => response,
            None => self.exhausted.clone(),
        }
    }
}
