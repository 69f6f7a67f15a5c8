//! Core crate for Narthex - configuration, shared error type, domain types.
//!
//! Narthex is a resource directory with an embedded assistant. This crate
//! holds everything the other crates agree on: the resource/role/section
//! vocabulary, search arguments, the workspace-level error enum, and the
//! TOML configuration loaded once at startup and passed into components.

pub mod config;
pub mod error;
pub mod types;

pub use config::NarthexConfig;
pub use error::{NarthexError, Result};
pub use types::*;
