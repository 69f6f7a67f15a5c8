//! Backend traits the orchestrators talk through.
//!
//! The gateway implementation lives in [`crate::gateway`]; tests script
//! these traits directly.

use async_trait::async_trait;
use uuid::Uuid;

use narthex_chat::ChatReply;
use narthex_core::types::Role;
use narthex_kb::KbResponse;

use crate::error::BackendError;

/// Sends one chat turn to the gateway.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(&self, query: &str, role: Option<Role>) -> Result<ChatReply, BackendError>;
}

/// Knowledge-base endpoints used by the summary watcher.
#[async_trait]
pub trait KbBackend: Send + Sync {
    /// Query the stored summary. `Err(NotIngested)` maps the gateway's
    /// 404 "not yet ingested" state.
    async fn query_summary(&self, resource_id: Uuid, k: usize)
        -> Result<KbResponse, BackendError>;

    /// Ask the gateway to ingest the document's source URL.
    async fn trigger_ingest(
        &self,
        resource_id: Uuid,
        url: &str,
        refresh: bool,
    ) -> Result<(), BackendError>;
}
