//! Response synthesis for search results.
//!
//! Attempts a short model-written description of the found resources and
//! falls back to a deterministic sentence built from the count and the
//! distinct resource types. The fallback always produces a non-empty,
//! well-formed sentence.

use std::sync::Arc;

use tracing::warn;

use narthex_core::types::{Resource, ResourceType};
use narthex_llm::{GenerateRequest, GenerativeClient};

/// Guidance shown when a search matched nothing.
pub const NO_RESULTS_GUIDANCE: &str = "I couldn't find any matching resources. \
     Try rephrasing your question, or browse the Forms, Documents, and Media sections.";

/// Instruction for the model-written description. The ban on generic
/// "I found" framing is part of the contract, not a style preference.
const SYNTHESIS_INSTRUCTION: &str = "You describe search results for a community resource \
directory. Write 1 to 2 sentences describing what the listed resources offer and how they \
relate to the request. Refer to resources by title. Never use a generic \"I found\" framing.";

/// Resources included in the synthesis prompt.
const MAX_PROMPT_RESOURCES: usize = 5;

/// Produces the natural-language summary for one set of search results.
pub struct ResponseSynthesizer {
    client: Arc<dyn GenerativeClient>,
}

impl ResponseSynthesizer {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self { client }
    }

    /// Summarize `resources` for `query`. Never fails and never returns
    /// an empty string.
    pub async fn summarize(&self, query: &str, resources: &[Resource]) -> String {
        if resources.is_empty() {
            return NO_RESULTS_GUIDANCE.to_string();
        }

        let listing = resources
            .iter()
            .take(MAX_PROMPT_RESOURCES)
            .map(|r| format!("- {} ({}): {}", r.title, r.kind.label(), r.description))
            .collect::<Vec<_>>()
            .join("\n");
        let user = format!("Request: {}\n\nResources:\n{}", query, listing);

        let request = GenerateRequest {
            system: SYNTHESIS_INSTRUCTION,
            user: &user,
            json_output: false,
        };

        match self.client.generate(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("synthesis returned empty text, using deterministic summary");
                fallback_summary(resources)
            }
            Err(e) => {
                warn!(error = %e, "synthesis unavailable, using deterministic summary");
                fallback_summary(resources)
            }
        }
    }
}

/// Deterministic description from the count and up to the first two
/// distinct resource types.
pub(crate) fn fallback_summary(resources: &[Resource]) -> String {
    let mut distinct: Vec<ResourceType> = Vec::new();
    for r in resources {
        if !distinct.contains(&r.kind) {
            distinct.push(r.kind);
        }
    }

    let count = resources.len();
    match (count, distinct.as_slice()) {
        (0, _) => NO_RESULTS_GUIDANCE.to_string(),
        (1, [kind]) => format!(
            "\"{}\" is the closest match, a {} in the directory.",
            resources[0].title,
            kind.label()
        ),
        (_, [kind]) => format!(
            "There are {} matching resources, all {}.",
            count,
            kind.plural_label()
        ),
        (_, [first, second, ..]) => format!(
            "There are {} matching resources, including {} and {}.",
            count,
            first.plural_label(),
            second.plural_label()
        ),
        // count > 0 implies at least one distinct type.
        (_, []) => format!("There are {} matching resources.", count),
    }
}
