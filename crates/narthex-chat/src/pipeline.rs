//! The chat pipeline: classify, then search, then synthesize.
//!
//! Stage ordering is strict; each stage awaits its predecessor. The
//! classifier and synthesizer recover locally, so the only hard failures
//! out of a turn are input validation and a store outage.

use narthex_core::types::Role;
use narthex_intent::{Intent, IntentClassifier};
use narthex_store::SearchExecutor;

use crate::error::ChatError;
use crate::synthesizer::ResponseSynthesizer;
use crate::types::ChatReply;

/// Talk reply used when the classifier produced no message.
const DEFAULT_TALK_MESSAGE: &str =
    "Tell me the role or topic and I'll pull the right forms, trainings, or guides.";

/// Runs one chat turn end to end.
pub struct ChatPipeline {
    classifier: IntentClassifier,
    search: SearchExecutor,
    synthesizer: ResponseSynthesizer,
    max_message_length: usize,
}

impl ChatPipeline {
    pub fn new(
        classifier: IntentClassifier,
        search: SearchExecutor,
        synthesizer: ResponseSynthesizer,
        max_message_length: usize,
    ) -> Self {
        Self {
            classifier,
            search,
            synthesizer,
            max_message_length,
        }
    }

    /// Answer one query.
    ///
    /// `viewer_role` is the requester's own role. It is carried for
    /// diagnostics only: role targeting belongs to the classifier, and
    /// restricting every search to the viewer's role would hide
    /// cross-role items like an application form from the people meant
    /// to find them.
    pub async fn respond(
        &self,
        query: &str,
        viewer_role: Option<Role>,
    ) -> Result<ChatReply, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if query.len() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        tracing::debug!(?viewer_role, "chat turn");

        match self.classifier.classify(query).await {
            Intent::Talk { message } => {
                let answer = if message.trim().is_empty() {
                    DEFAULT_TALK_MESSAGE.to_string()
                } else {
                    message
                };
                Ok(ChatReply::talk(answer))
            }
            Intent::Call { calls, .. } => {
                // The classifier's instruction requests a single search
                // call; execute the first.
                let Some(call) = calls.into_iter().next() else {
                    return Ok(ChatReply::talk(DEFAULT_TALK_MESSAGE.to_string()));
                };

                let resources = self.search.execute(&call.args)?;
                let answer = self.synthesizer.summarize(query, &resources).await;
                Ok(ChatReply::direct(answer, resources))
            }
        }
    }
}
