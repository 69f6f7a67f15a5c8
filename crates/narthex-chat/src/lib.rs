//! Chat pipeline for the Narthex assistant.
//!
//! One chat turn flows classify, then search, then synthesize, with no
//! stage starting before its predecessor resolves. The classifier and the
//! synthesizer both recover locally from model failures; only a store
//! outage surfaces to the caller.

pub mod error;
pub mod pipeline;
pub mod synthesizer;
pub mod types;

pub use error::ChatError;
pub use pipeline::ChatPipeline;
pub use synthesizer::{ResponseSynthesizer, NO_RESULTS_GUIDANCE};
pub use types::{ChatMode, ChatReply};
