//! Client-side conversation and summary state types.

use narthex_core::types::Resource;
use narthex_kb::KbResponse;

/// One transcript entry. The conversation is append-only; entries are
/// never mutated once pushed.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatMessage {
    User { text: String },
    Assistant {
        answer: String,
        resources: Vec<Resource>,
    },
}

/// Observable state of the chat controller.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatStatus {
    Idle,
    Sending,
    /// Rate-limit countdown; input is disabled until it reaches zero.
    RateLimited { seconds_left: u64 },
    /// A send failed; the apology message has been appended and the user
    /// must resend manually.
    Failed,
}

/// Event stream emitted by the chat controller.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    Status(ChatStatus),
    Message(ChatMessage),
}

/// Why a summary ended up unavailable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KbFailureKind {
    /// The polling budget ran out before the summary appeared.
    TimedOut,
    /// The ingestion trigger itself was rejected.
    TriggerFailed,
    /// Any other failure.
    Failed,
}

/// Per-document summary state, published on a watch channel. Created when
/// a document view opens and discarded when it closes.
#[derive(Clone, Debug, PartialEq)]
pub enum KbSummaryState {
    Checking,
    Ready(KbResponse),
    Unavailable {
        kind: KbFailureKind,
        message: String,
        /// Captured upstream error body, when one exists.
        detail: Option<String>,
    },
}

impl KbSummaryState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, KbSummaryState::Checking)
    }
}
