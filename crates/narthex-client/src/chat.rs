//! The chat controller: one conversation's turn protocol.
//!
//! States: Idle, Sending, RateLimited (countdown), Failed, back to Idle.
//! The user's message is appended optimistically before the send. A 429
//! starts a once-per-second countdown from ceil(retry_ms/1000); when it
//! reaches zero the banner clears and the same original text is
//! resubmitted automatically, exactly once per rate-limit event. Any other
//! failure appends a fixed apology and leaves resending to the user.
//! Cancelling the controller's token abandons a pending countdown without
//! firing the retry.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use narthex_core::types::Role;

use crate::backend::ChatBackend;
use crate::error::{BackendError, ClientError};
use crate::types::{ChatEvent, ChatMessage, ChatStatus};

/// Countdown used when a 429 carries no retry hint.
pub const DEFAULT_RETRY_MS: u64 = 30_000;

/// Assistant message appended on a non-retryable failure.
const APOLOGY_MESSAGE: &str = "I apologize, but I'm having trouble connecting to the server \
right now. Please try again later.";

/// Fallback answer when a reply carries no text at all.
const EMPTY_REPLY_MESSAGE: &str =
    "I received your message but there was no response content.";

/// Client-side chat state machine for one conversation.
pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    role: Option<Role>,
    transcript: Vec<ChatMessage>,
    events: broadcast::Sender<ChatEvent>,
    cancel: CancellationToken,
}

impl ChatController {
    pub fn new(backend: Arc<dyn ChatBackend>, role: Option<Role>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            backend,
            role,
            transcript: Vec::new(),
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Subscribe to status and message events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// The append-only conversation.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Token that tears the controller down; cancelling it abandons any
    /// pending countdown/retry.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Submit one message and drive it to an outcome.
    ///
    /// `&mut self` serializes sends: at most one is ever in flight.
    /// Empty or whitespace-only text is rejected before any network call.
    pub async fn submit(&mut self, text: &str) -> Result<(), ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        let text = text.to_string();

        // Optimistic append, independent of the network outcome.
        self.push(ChatMessage::User { text: text.clone() });
        self.set_status(ChatStatus::Sending);

        loop {
            if self.cancel.is_cancelled() {
                self.set_status(ChatStatus::Idle);
                return Ok(());
            }

            match self.backend.send_chat(&text, self.role).await {
                Ok(reply) => {
                    let answer = if !reply.answer.trim().is_empty() {
                        reply.answer
                    } else if !reply.text.trim().is_empty() {
                        reply.text
                    } else {
                        EMPTY_REPLY_MESSAGE.to_string()
                    };
                    self.push(ChatMessage::Assistant {
                        answer,
                        resources: reply.resources,
                    });
                    self.set_status(ChatStatus::Idle);
                    return Ok(());
                }
                Err(BackendError::RateLimited { retry_ms }) => {
                    let retry_ms = retry_ms.unwrap_or(DEFAULT_RETRY_MS);
                    debug!(retry_ms, "rate limited, starting countdown");
                    if !self.countdown(retry_ms).await {
                        // Torn down mid-countdown; the retry must not fire.
                        self.set_status(ChatStatus::Idle);
                        return Ok(());
                    }
                    // Banner cleared; resubmit the same original message.
                    self.set_status(ChatStatus::Sending);
                }
                Err(e) => {
                    warn!(error = %e, "chat send failed");
                    self.push(ChatMessage::Assistant {
                        answer: APOLOGY_MESSAGE.to_string(),
                        resources: Vec::new(),
                    });
                    self.set_status(ChatStatus::Failed);
                    self.set_status(ChatStatus::Idle);
                    return Ok(());
                }
            }
        }
    }

    /// Tick down once per second. Returns false when cancelled.
    async fn countdown(&self, retry_ms: u64) -> bool {
        let mut seconds_left = retry_ms.div_ceil(1000);
        while seconds_left > 0 {
            self.set_status(ChatStatus::RateLimited { seconds_left });
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    seconds_left -= 1;
                }
                _ = self.cancel.cancelled() => {
                    debug!("countdown cancelled");
                    return false;
                }
            }
        }
        true
    }

    fn push(&mut self, message: ChatMessage) {
        self.transcript.push(message.clone());
        let _ = self.events.send(ChatEvent::Message(message));
    }

    fn set_status(&self, status: ChatStatus) {
        let _ = self.events.send(ChatEvent::Status(status));
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use narthex_chat::ChatReply;

    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<ChatReply, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send_chat(
            &self,
            _query: &str,
            _role: Option<Role>,
        ) -> Result<ChatReply, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(BackendError::Network("script exhausted".to_string())))
        }
    }

    fn reply(answer: &str) -> ChatReply {
        ChatReply::direct(answer.to_string(), vec![])
    }

    fn drain(rx: &mut broadcast::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn countdown_seconds(events: &[ChatEvent]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::Status(ChatStatus::RateLimited { seconds_left }) => {
                    Some(*seconds_left)
                }
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_submit_is_rejected_before_network() {
        let backend = ScriptedBackend::new(vec![]);
        let mut controller = ChatController::new(backend.clone(), None);

        assert!(matches!(
            controller.submit("   ").await,
            Err(ClientError::EmptyMessage)
        ));
        assert!(controller.transcript().is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_turn_appends_both_messages() {
        let backend = ScriptedBackend::new(vec![Ok(reply("Here is the form."))]);
        let mut controller = ChatController::new(backend.clone(), None);
        let mut rx = controller.subscribe();

        controller.submit("find the form").await.unwrap();

        assert_eq!(controller.transcript().len(), 2);
        assert_eq!(
            controller.transcript()[0],
            ChatMessage::User {
                text: "find the form".to_string()
            }
        );
        assert!(matches!(
            &controller.transcript()[1],
            ChatMessage::Assistant { answer, .. } if answer == "Here is the form."
        ));
        assert_eq!(backend.calls(), 1);

        let events = drain(&mut rx);
        assert!(events.contains(&ChatEvent::Status(ChatStatus::Sending)));
        assert_eq!(events.last(), Some(&ChatEvent::Status(ChatStatus::Idle)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_counts_down_then_resubmits_exactly_once() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::RateLimited {
                retry_ms: Some(5_000),
            }),
            Ok(reply("Done after retry.")),
        ]);
        let mut controller = ChatController::new(backend.clone(), None);
        let mut rx = controller.subscribe();

        controller.submit("find the form").await.unwrap();

        // The countdown displayed 5, 4, 3, 2, 1.
        let events = drain(&mut rx);
        assert_eq!(countdown_seconds(&events), vec![5, 4, 3, 2, 1]);

        // Exactly one automatic resubmission of the same message.
        assert_eq!(backend.calls(), 2);

        // No duplicate user message for the failed attempt.
        let users = controller
            .transcript()
            .iter()
            .filter(|m| matches!(m, ChatMessage::User { .. }))
            .count();
        assert_eq!(users, 1);
        assert_eq!(controller.transcript().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_without_hint_defaults_to_thirty_seconds() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::RateLimited { retry_ms: None }),
            Ok(reply("ok")),
        ]);
        let mut controller = ChatController::new(backend.clone(), None);
        let mut rx = controller.subscribe();

        controller.submit("hello").await.unwrap();

        let events = drain(&mut rx);
        let seconds = countdown_seconds(&events);
        assert_eq!(seconds.first(), Some(&30));
        assert_eq!(seconds.len(), 30);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_rate_limits_chain_countdowns() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::RateLimited {
                retry_ms: Some(2_000),
            }),
            Err(BackendError::RateLimited {
                retry_ms: Some(3_000),
            }),
            Ok(reply("finally")),
        ]);
        let mut controller = ChatController::new(backend.clone(), None);
        let mut rx = controller.subscribe();

        controller.submit("hello").await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(countdown_seconds(&events), vec![2, 1, 3, 2, 1]);
        assert_eq!(backend.calls(), 3);
        assert_eq!(controller.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_appends_apology_and_does_not_retry() {
        let backend = ScriptedBackend::new(vec![Err(BackendError::Network(
            "connection refused".to_string(),
        ))]);
        let mut controller = ChatController::new(backend.clone(), None);
        let mut rx = controller.subscribe();

        controller.submit("hello").await.unwrap();

        assert_eq!(backend.calls(), 1);
        assert!(matches!(
            &controller.transcript()[1],
            ChatMessage::Assistant { answer, resources }
                if answer == APOLOGY_MESSAGE && resources.is_empty()
        ));
        let events = drain(&mut rx);
        assert!(events.contains(&ChatEvent::Status(ChatStatus::Failed)));
        assert_eq!(events.last(), Some(&ChatEvent::Status(ChatStatus::Idle)));
    }

    #[tokio::test]
    async fn test_non_429_upstream_error_is_not_retried() {
        let backend = ScriptedBackend::new(vec![Err(BackendError::Upstream {
            status: 500,
            body: "classifier exploded".to_string(),
        })]);
        let mut controller = ChatController::new(backend.clone(), None);

        controller.submit("hello").await.unwrap();
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_countdown_abandons_retry() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::RateLimited {
                retry_ms: Some(10_000),
            }),
            Ok(reply("must never be sent")),
        ]);
        let mut controller = ChatController::new(backend.clone(), None);
        let token = controller.cancel_token();

        let canceller = async {
            tokio::time::sleep(Duration::from_millis(3_500)).await;
            token.cancel();
        };
        let (result, _) = tokio::join!(controller.submit("hello"), canceller);
        result.unwrap();

        // The stale retry never fired.
        assert_eq!(backend.calls(), 1);
        // Only the optimistic user message is in the transcript.
        assert_eq!(controller.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_body_gets_placeholder_answer() {
        let backend = ScriptedBackend::new(vec![Ok(ChatReply::direct(String::new(), vec![]))]);
        let mut controller = ChatController::new(backend, None);

        controller.submit("hello").await.unwrap();
        assert!(matches!(
            &controller.transcript()[1],
            ChatMessage::Assistant { answer, .. } if answer == EMPTY_REPLY_MESSAGE
        ));
    }

    #[tokio::test]
    async fn test_transcript_is_append_only_across_turns() {
        let backend = ScriptedBackend::new(vec![Ok(reply("one")), Ok(reply("two"))]);
        let mut controller = ChatController::new(backend, None);

        controller.submit("first").await.unwrap();
        let snapshot = controller.transcript().to_vec();
        controller.submit("second").await.unwrap();

        assert_eq!(&controller.transcript()[..2], &snapshot[..]);
        assert_eq!(controller.transcript().len(), 4);
    }
}
