//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its JSON body via axum extractors, talks to the
//! AppState services, and returns a JSON response or an ApiError.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use narthex_chat::ChatReply;
use narthex_core::types::{Resource, Role};
use narthex_kb::{validate_docs_url, Ingestor, KbError, KbResponse};

use crate::calendar::{map_event, DateItem};
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub q: String,
    /// Viewer role, used as the default search role.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    #[serde(default)]
    pub q: String,
    /// Prior turns; accepted for wire compatibility, currently unused.
    #[serde(default)]
    pub history: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct KbQueryRequest {
    pub resource_id: Uuid,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub resource_id: Uuid,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenderDocRequest {
    #[serde(default)]
    pub url: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health - liveness, no auth.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /chat - run one chat turn through the pipeline.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let role = req.role.as_deref().and_then(Role::parse);
    let reply = state.pipeline.respond(&req.q, role).await?;
    Ok(Json(reply))
}

/// POST /intent - classify an utterance and return the normalized intent.
pub async fn intent(
    State(state): State<AppState>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<Value>, ApiError> {
    if !state.llm_configured {
        return Err(ApiError::Internal("classifier is not configured".to_string()));
    }
    if req.q.trim().is_empty() {
        return Err(ApiError::BadRequest("Parameter 'q' must not be empty".to_string()));
    }

    let intent = state.classifier.classify(&req.q).await;
    Ok(Json(intent.to_wire()))
}

/// GET /resources - published resources, position then recency.
pub async fn resources(State(state): State<AppState>) -> Result<Json<Vec<Resource>>, ApiError> {
    let listed = state
        .resources
        .list_published(state.config.search.listing_limit)?;
    Ok(Json(listed))
}

/// POST /kb-query - stored summary or 404 while not yet ingested.
pub async fn kb_query(
    State(state): State<AppState>,
    Json(req): Json<KbQueryRequest>,
) -> Result<Json<KbResponse>, ApiError> {
    let Some(record) = state.kb.get(req.resource_id)? else {
        return Err(ApiError::NotFound(
            "No summary for this resource yet".to_string(),
        ));
    };

    let k = req.k.unwrap_or(state.config.kb.default_k);
    let question = req
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    match question {
        Some(question) => {
            let answer = state.ingestor.answer(&record, question).await;
            let mut response = record.to_response(k);
            response.answer = Some(answer);
            response.mode = "qa".to_string();
            Ok(Json(response))
        }
        None => Ok(Json(record.to_response(k))),
    }
}

/// POST /ingest-url - validate, then run ingestion in the background.
pub async fn ingest_url(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ingestor::validate_url(&req.url)?;
    state
        .ingestor
        .clone()
        .spawn(req.resource_id, req.url.clone(), req.refresh);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "accepted", "resource_id": req.resource_id })),
    ))
}

/// POST /render-doc - fetch the exported HTML for a Google Doc.
pub async fn render_doc(
    State(state): State<AppState>,
    Json(req): Json<RenderDocRequest>,
) -> Result<Json<Value>, ApiError> {
    let url = req.url.unwrap_or_default();
    let id = validate_docs_url(&url).map_err(|e| match e {
        KbError::NoUrl => ApiError::BadRequestCode {
            code: e.code(),
            message: "No URL was provided".to_string(),
            details: None,
        },
        KbError::NotGoogleDocsUrl(_) | KbError::InvalidGoogleDocsUrl(_) => {
            ApiError::BadRequestCode {
                code: e.code(),
                message: e.to_string(),
                details: Some(json!({ "provided_url": url })),
            }
        }
        other => ApiError::from(other),
    })?;

    let export_url = format!(
        "https://docs.google.com/document/d/{}/export?format=html",
        id
    );
    let response = state
        .http
        .get(&export_url)
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("Network error while fetching document: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::UpstreamFetch {
            status: status.as_u16(),
            message: format!("Google Docs export failed with status {}", status.as_u16()),
        });
    }

    let html = response
        .text()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read document body: {}", e)))?;
    Ok(Json(json!({ "html": html })))
}

/// GET /calendar-events - proxy Google Calendar and map to date items.
pub async fn calendar_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<DateItem>>, ApiError> {
    let calendar = &state.config.calendar;
    if !calendar.is_configured() {
        return Err(ApiError::Internal(
            "Google Calendar not configured".to_string(),
        ));
    }

    // Three months back to a year ahead.
    let now = Utc::now();
    let time_min = (now - Duration::days(92)).to_rfc3339();
    let time_max = (now + Duration::days(366)).to_rfc3339();

    let url = format!(
        "https://www.googleapis.com/calendar/v3/calendars/{}/events",
        calendar.calendar_id
    );
    let response = state
        .http
        .get(&url)
        .query(&[
            ("key", calendar.api_key.as_str()),
            ("timeMin", time_min.as_str()),
            ("timeMax", time_max.as_str()),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
            ("maxResults", "100"),
        ])
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to fetch calendar events: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::UpstreamFetch {
            status: status.as_u16(),
            message: "Failed to fetch calendar events".to_string(),
        });
    }

    let data: Value = response
        .json()
        .await
        .map_err(|e| ApiError::Internal(format!("Invalid calendar response: {}", e)))?;
    let items = data
        .get("items")
        .and_then(Value::as_array)
        .map(|events| events.iter().filter_map(map_event).collect())
        .unwrap_or_default();

    Ok(Json(items))
}
