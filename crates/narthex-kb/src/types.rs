//! Knowledge-base record and wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One chunk of ingested source text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KbChunk {
    pub id: String,
    pub content: String,
}

/// Stored summary for one ingested document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KbRecord {
    pub resource_id: Uuid,
    pub source_url: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub chunks: Vec<KbChunk>,
    pub created_at: DateTime<Utc>,
}

impl KbRecord {
    /// Wire response for the kb-query endpoint, chunks capped at `k`.
    pub fn to_response(&self, k: usize) -> KbResponse {
        KbResponse {
            answer: None,
            summary: Some(self.summary.clone()),
            key_points: self.key_points.clone(),
            chunks: self.chunks.iter().take(k).cloned().collect(),
            resource_id: self.resource_id,
            mode: "summary".to_string(),
        }
    }
}

/// Response body of the kb-query endpoint.
///
/// `answer` is the legacy field, populated for question answering; a
/// usable summary is a non-empty `summary` or non-empty `answer`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KbResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub chunks: Vec<KbChunk>,
    pub resource_id: Uuid,
    #[serde(default)]
    pub mode: String,
}

impl KbResponse {
    /// Whether this response carries content worth showing.
    pub fn has_usable_summary(&self) -> bool {
        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        };
        non_empty(&self.summary) || non_empty(&self.answer)
    }
}
