//! Normalized intent types.

use serde_json::{json, Value};

use narthex_core::types::SearchArgs;

/// One recognized tool call. Only the `search` shape survives
/// normalization, so the name is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    pub args: SearchArgs,
}

/// Normalized classification of a user utterance.
///
/// Invariant, enforced by construction: `Call` always carries at least one
/// search call, and `Talk` carries none.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Conversational reply only.
    Talk { message: String },
    /// Perform one or more searches.
    Call {
        message: String,
        calls: Vec<SearchCall>,
    },
}

impl Intent {
    pub fn is_call(&self) -> bool {
        matches!(self, Intent::Call { .. })
    }

    /// Wire representation served by the intent endpoint:
    /// `{ action, message, calls: [{ name: "search", args }] }`.
    pub fn to_wire(&self) -> Value {
        match self {
            Intent::Talk { message } => json!({
                "action": "talk",
                "message": message,
                "calls": [],
            }),
            Intent::Call { message, calls } => json!({
                "action": "call",
                "message": message,
                "calls": calls
                    .iter()
                    .map(|c| json!({ "name": "search", "args": c.args }))
                    .collect::<Vec<_>>(),
            }),
        }
    }
}
