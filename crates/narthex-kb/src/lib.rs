//! Knowledge-base ingestion and summaries.
//!
//! Documents become queryable by ingestion: fetch the source, extract
//! text, produce a summary (model-written with an extractive fallback),
//! chunk the text, and store the result keyed by resource id. A missing
//! record is the expected "not yet ingested" state, not an error.

pub mod docfetch;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod store;
pub mod summarize;
pub mod types;

pub use docfetch::{extract_doc_id, validate_docs_url, DocFetch, HttpDocFetcher};
pub use error::KbError;
pub use ingest::{IngestOutcome, Ingestor};
pub use store::KbRepository;
pub use summarize::KbSummarizer;
pub use types::{KbChunk, KbRecord, KbResponse};
