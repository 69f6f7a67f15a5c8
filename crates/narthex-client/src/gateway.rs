//! HTTP implementation of the backend traits against the Narthex gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use narthex_chat::ChatReply;
use narthex_core::types::Role;
use narthex_kb::KbResponse;

use crate::backend::{ChatBackend, KbBackend};
use crate::error::BackendError;

/// Bearer-authenticated client for the gateway's JSON endpoints.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<reqwest::Response, BackendError> {
        self.http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))
    }
}

#[async_trait]
impl ChatBackend for HttpGateway {
    async fn send_chat(&self, query: &str, role: Option<Role>) -> Result<ChatReply, BackendError> {
        let mut body = json!({ "q": query });
        if let Some(role) = role {
            body["role"] = json!(role);
        }

        let response = self.post_json("/chat", body).await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_ms = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("retry_ms").and_then(Value::as_u64));
            return Err(BackendError::RateLimited { retry_ms });
        }
        if !status.is_success() {
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<ChatReply>()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))
    }
}

#[async_trait]
impl KbBackend for HttpGateway {
    async fn query_summary(
        &self,
        resource_id: Uuid,
        k: usize,
    ) -> Result<KbResponse, BackendError> {
        let body = json!({ "resource_id": resource_id, "k": k });
        let response = self.post_json("/kb-query", body).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotIngested);
        }
        if !status.is_success() {
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<KbResponse>()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))
    }

    async fn trigger_ingest(
        &self,
        resource_id: Uuid,
        url: &str,
        refresh: bool,
    ) -> Result<(), BackendError> {
        let body = json!({ "resource_id": resource_id, "url": url, "refresh": refresh });
        let response = self.post_json("/ingest-url", body).await?;
        let status = response.status();

        if !status.is_success() {
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}
