//! Wire types for one chat turn.

use serde::{Deserialize, Serialize};

use narthex_core::types::Resource;

/// How the assistant produced its reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Searched the directory and described the results.
    Direct,
    /// Conversational reply only.
    Talk,
}

/// Response body for one chat turn.
///
/// `text` always mirrors `answer` so every consumer can read either field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub answer: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    pub mode: ChatMode,
}

impl ChatReply {
    pub fn talk(answer: String) -> Self {
        Self {
            text: answer.clone(),
            answer,
            resources: Vec::new(),
            mode: ChatMode::Talk,
        }
    }

    pub fn direct(answer: String, resources: Vec<Resource>) -> Self {
        Self {
            text: answer.clone(),
            answer,
            resources,
            mode: ChatMode::Direct,
        }
    }
}
