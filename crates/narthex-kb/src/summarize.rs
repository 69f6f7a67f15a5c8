//! Document summarization: model-written with an extractive fallback.

use std::sync::Arc;

use tracing::warn;

use narthex_llm::{GenerateRequest, GenerativeClient};

use crate::types::{KbChunk, KbRecord};

const SUMMARY_INSTRUCTION: &str = "Summarize the following document for a resource directory \
reader. Write one short plain-text paragraph covering what the document is and what it is for. \
No markdown, no preamble.";

const ANSWER_INSTRUCTION: &str = "Answer the question using only the provided document summary \
and excerpts. Answer in 1 to 3 plain sentences. If the document does not contain the answer, \
say so briefly.";

/// Characters of document text included in a model prompt.
const MAX_PROMPT_CHARS: usize = 12_000;

/// Bullet points kept by the extractive pass.
const MAX_KEY_POINTS: usize = 5;

/// Produces summaries and answers for ingested documents.
pub struct KbSummarizer {
    client: Arc<dyn GenerativeClient>,
}

impl KbSummarizer {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self { client }
    }

    /// Summarize extracted document text. Never fails: model trouble
    /// falls back to the extractive summary. Key points are always
    /// extractive.
    pub async fn summarize(&self, text: &str) -> (String, Vec<String>) {
        let key_points = extract_key_points(text, MAX_KEY_POINTS);

        let request = GenerateRequest {
            system: SUMMARY_INSTRUCTION,
            user: truncate_chars(text, MAX_PROMPT_CHARS),
            json_output: false,
        };

        let summary = match self.client.generate(request).await {
            Ok(t) if !t.trim().is_empty() => t.trim().to_string(),
            Ok(_) => {
                warn!("summary generation returned empty text, using extractive summary");
                extractive_summary(text)
            }
            Err(e) => {
                warn!(error = %e, "summary generation unavailable, using extractive summary");
                extractive_summary(text)
            }
        };

        (summary, key_points)
    }

    /// Answer a question about an ingested document. Falls back to the
    /// stored summary when the model is unavailable.
    pub async fn answer(&self, record: &KbRecord, question: &str) -> String {
        let context = build_answer_context(record);
        let user = format!("{}\n\nQuestion: {}", context, question);

        let request = GenerateRequest {
            system: ANSWER_INSTRUCTION,
            user: truncate_chars(&user, MAX_PROMPT_CHARS),
            json_output: false,
        };

        match self.client.generate(request).await {
            Ok(t) if !t.trim().is_empty() => t.trim().to_string(),
            Ok(_) | Err(_) => {
                warn!("answer generation unavailable, returning stored summary");
                record.summary.clone()
            }
        }
    }
}

fn build_answer_context(record: &KbRecord) -> String {
    let excerpts = record
        .chunks
        .iter()
        .take(4)
        .map(|c: &KbChunk| format!("- {}", c.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Summary: {}\n\nExcerpts:\n{}", record.summary, excerpts)
}

/// Truncate at a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Extractive summary: the top-ranked sentences, in document order.
pub(crate) fn extractive_summary(text: &str) -> String {
    let sentences = collect_sentences(text);
    if sentences.is_empty() {
        return truncate_chars(text.trim(), 200).to_string();
    }

    let mut top = rank_sentences(&sentences, 3);
    // Restore document order for readability.
    top.sort_by_key(|s| sentences.iter().position(|x| x == s));
    top.join(" ")
}

/// Extractive key points: the top-ranked sentences by score.
pub(crate) fn extract_key_points(text: &str, top_k: usize) -> Vec<String> {
    let sentences = collect_sentences(text);
    rank_sentences(&sentences, top_k)
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Sentences long enough to carry content.
fn collect_sentences(text: &str) -> Vec<&str> {
    crate::extract::split_sentences(text)
        .into_iter()
        .map(str::trim)
        .filter(|s| s.len() > 10)
        .collect()
}

/// Rank sentences by unique-term count weighted by length.
fn rank_sentences<'a>(sentences: &[&'a str], top_k: usize) -> Vec<&'a str> {
    let mut scored: Vec<(f64, &str)> = sentences
        .iter()
        .map(|sent| {
            let words: Vec<&str> = sent.split_whitespace().collect();
            let unique: std::collections::HashSet<&str> = words.iter().copied().collect();
            let score = (unique.len() as f64) * (words.len() as f64).sqrt();
            (score, *sent)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(top_k).map(|(_, s)| s).collect()
}
