//! Intent classification for the Narthex assistant.
//!
//! Turns a free-text utterance into a normalized [`Intent`]: either "just
//! talk" or "perform a search" with structured arguments. The raw model
//! output is an untyped document from an external system; it never crosses
//! this crate's boundary without passing through the total normalization
//! function, and any upstream failure degrades to a broad search rather
//! than an error.

pub mod classifier;
pub mod types;

pub use classifier::{IntentClassifier, SYSTEM_INSTRUCTION};
pub use types::{Intent, SearchCall};
