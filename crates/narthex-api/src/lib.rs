//! Narthex API crate - axum HTTP gateway.
//!
//! Exposes the chat pipeline, the resource listing, intent classification,
//! knowledge-base query/ingest, document rendering, and calendar events
//! behind bearer authentication and a per-second rate limiter whose 429
//! responses carry a `retry_ms` hint.

pub mod auth;
pub mod calendar;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
