//! Repository for stored knowledge-base summaries.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use narthex_core::error::NarthexError;
use narthex_store::Database;

use crate::types::{KbChunk, KbRecord};

/// Repository for the kb_summaries table.
pub struct KbRepository {
    db: Arc<Database>,
}

impl KbRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace a summary record.
    pub fn upsert(&self, record: &KbRecord) -> Result<(), NarthexError> {
        let key_points = serde_json::to_string(&record.key_points)?;
        let chunks = serde_json::to_string(&record.chunks)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kb_summaries
                 (resource_id, source_url, summary, key_points, chunks, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    record.resource_id.to_string(),
                    record.source_url,
                    record.summary,
                    key_points,
                    chunks,
                    record.created_at.timestamp(),
                ],
            )
            .map_err(|e| NarthexError::Storage(format!("Failed to save kb summary: {}", e)))?;
            Ok(())
        })
    }

    /// Fetch the summary for a resource, if it has been ingested.
    pub fn get(&self, resource_id: Uuid) -> Result<Option<KbRecord>, NarthexError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT resource_id, source_url, summary, key_points, chunks, created_at
                     FROM kb_summaries WHERE resource_id = ?1",
                )
                .map_err(|e| NarthexError::Storage(e.to_string()))?;

            let row: Option<(String, String, String, String, String, i64)> = stmt
                .query_row(rusqlite::params![resource_id.to_string()], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })
                .optional()
                .map_err(|e| NarthexError::Storage(e.to_string()))?;

            let Some((id_str, source_url, summary, key_points, chunks, created_at)) = row else {
                return Ok(None);
            };

            let resource_id = Uuid::parse_str(&id_str)
                .map_err(|e| NarthexError::Storage(format!("Invalid resource id: {}", e)))?;
            let key_points: Vec<String> = serde_json::from_str(&key_points)?;
            let chunks: Vec<KbChunk> = serde_json::from_str(&chunks)?;
            let created_at = Utc
                .timestamp_opt(created_at, 0)
                .single()
                .unwrap_or_default();

            Ok(Some(KbRecord {
                resource_id,
                source_url,
                summary,
                key_points,
                chunks,
                created_at,
            }))
        })
    }
}
