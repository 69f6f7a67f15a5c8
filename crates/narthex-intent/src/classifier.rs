//! The intent classifier.
//!
//! Sends the utterance plus a fixed routing instruction to the model in
//! strict-JSON mode, then normalizes whatever comes back. Classification
//! is total: transport failures, HTTP errors, and unparseable bodies all
//! degrade to a broad search, because searching is safe and rarely wrong
//! while refusing to answer is always wrong.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use narthex_core::types::{Role, SearchArgs, Section};
use narthex_llm::{GenerateRequest, GenerativeClient};

use crate::types::{Intent, SearchCall};

/// Routing instruction sent with every classification request.
pub const SYSTEM_INSTRUCTION: &str = r#"You are the intent router for a resource directory assistant.
Return STRICT JSON with this schema, no prose:
{
  "action": "talk" | "call",
  "message": string,
  "calls": [
    {
      "name": "search",
      "args": {
        "query": string,
        "role": "coach"|"leader"|"apprentice"|"member"|null,
        "apply": boolean,
        "section": "forms"|"documents"|"media"|null,
        "broad": boolean,
        "exact": boolean
      }
    }
  ]
}
Rules:
- Use action:"call" with a single search call whenever the user is looking for something (forms, applications, guides, docs, videos, where to find/get/show...).
- Mentions of a role (coach, leader, apprentice, member), of a section, or of applying for something are resource-seeking: prefer "call".
- Set exact=true for asks like "Coach Application", quoted titles, or a short name plus kind.
- If the user is just greeting or the request is genuinely unclear, use action:"talk" with a short friendly "message".
- When in doubt, prefer "call" with a broad search."#;

/// Classifies user utterances into normalized intents.
pub struct IntentClassifier {
    client: Arc<dyn GenerativeClient>,
    default_limit: usize,
}

impl IntentClassifier {
    pub fn new(client: Arc<dyn GenerativeClient>, default_limit: usize) -> Self {
        Self {
            client,
            default_limit,
        }
    }

    /// Classify one utterance. Never fails: upstream trouble yields the
    /// broad-search fallback intent.
    pub async fn classify(&self, query: &str) -> Intent {
        let request = GenerateRequest {
            system: SYSTEM_INSTRUCTION,
            user: query,
            json_output: true,
        };

        let raw = match self.client.generate(request).await {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "classifier returned unparseable JSON, using broad search");
                    return self.fallback(query);
                }
            },
            Err(e) => {
                warn!(error = %e, "classifier unavailable, using broad search");
                return self.fallback(query);
            }
        };

        normalize(&raw, self.default_limit)
    }

    /// Broad-search fallback for a failed classification.
    pub fn fallback(&self, query: &str) -> Intent {
        Intent::Call {
            message: String::new(),
            calls: vec![SearchCall {
                args: SearchArgs {
                    query: query.trim().to_string(),
                    broad: true,
                    limit: self.default_limit,
                    ..SearchArgs::default()
                },
            }],
        }
    }
}

/// Total normalization of a raw model document into an [`Intent`].
///
/// Coercions, in order: `action` counts as "call" only when it is the
/// literal string `"call"`; `message` becomes empty unless it is a string;
/// `calls` keeps only well-formed `search` entries, each argument field
/// coerced independently. A "call" left with zero valid calls is
/// downgraded to Talk so the action/calls invariant holds by construction.
pub fn normalize(raw: &Value, default_limit: usize) -> Intent {
    let is_call = raw.get("action").and_then(Value::as_str) == Some("call");
    let message = raw
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let calls: Vec<SearchCall> = raw
        .get("calls")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| parse_call(entry, default_limit))
                .collect()
        })
        .unwrap_or_default();

    if is_call && !calls.is_empty() {
        Intent::Call { message, calls }
    } else {
        Intent::Talk { message }
    }
}

/// Parse one call entry; malformed entries are dropped silently.
fn parse_call(entry: &Value, default_limit: usize) -> Option<SearchCall> {
    if entry.get("name").and_then(Value::as_str) != Some("search") {
        return None;
    }
    let args = entry.get("args")?.as_object()?;

    let query = args
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    let role = args
        .get("role")
        .and_then(Value::as_str)
        .and_then(Role::parse);
    let section = args
        .get("section")
        .and_then(Value::as_str)
        .and_then(Section::parse);
    let apply = args.get("apply").and_then(Value::as_bool).unwrap_or(false);
    let broad = args.get("broad").and_then(Value::as_bool).unwrap_or(false);
    let exact = args.get("exact").and_then(Value::as_bool).unwrap_or(false);
    let limit = args
        .get("limit")
        .and_then(Value::as_u64)
        .map(|n| (n as usize).clamp(1, 50))
        .unwrap_or(default_limit);

    Some(SearchCall {
        args: SearchArgs {
            query,
            role,
            section,
            apply,
            broad,
            exact,
            limit,
        },
    })
}
