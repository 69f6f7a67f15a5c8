//! Generative model client for Narthex.
//!
//! The model is an untrusted collaborator: callers send a prompt and get
//! back opaque text (or strict JSON they must normalize themselves). Every
//! caller in this workspace has a deterministic fallback for when the
//! model is unreachable, unconfigured, or returns garbage.

pub mod client;
pub mod error;

pub use client::{GeminiClient, GenerateRequest, GenerativeClient, StaticClient};
pub use error::LlmError;
