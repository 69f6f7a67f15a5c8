//! Client-side orchestration for Narthex.
//!
//! Two independent state machines live here: the chat controller, which
//! owns one conversation's turn protocol including the rate-limit
//! countdown and automatic resubmission, and the knowledge-base summary
//! watcher, which runs the check/trigger/poll cycle for one viewed
//! document. Both talk to the gateway through backend traits so tests can
//! script responses and drive timers under paused time, and both stop
//! cooperatively through a cancellation token when the view goes away.

pub mod backend;
pub mod chat;
pub mod error;
pub mod gateway;
pub mod kb;
pub mod types;

pub use backend::{ChatBackend, KbBackend};
pub use chat::{ChatController, DEFAULT_RETRY_MS};
pub use error::{BackendError, ClientError};
pub use gateway::HttpGateway;
pub use kb::{
    KbSummaryWatcher, GENERIC_FAILURE_MESSAGE, TIMED_OUT_MESSAGE, TRIGGER_FAILED_MESSAGE,
};
pub use types::{ChatEvent, ChatMessage, ChatStatus, KbFailureKind, KbSummaryState};
