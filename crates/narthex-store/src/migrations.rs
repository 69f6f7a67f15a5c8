//! Database schema migrations.
//!
//! Applies the initial schema: the resources table, the kb_summaries
//! table, and the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use narthex_core::error::NarthexError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), NarthexError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| NarthexError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| NarthexError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), NarthexError> {
    conn.execute_batch(
        "
        -- Directory entries. roles and tags hold JSON arrays of strings.
        CREATE TABLE IF NOT EXISTS resources (
            id             TEXT PRIMARY KEY NOT NULL,
            title          TEXT NOT NULL,
            kind           TEXT NOT NULL
                           CHECK (kind IN ('webpage', 'youtube', 'pdf', 'google_doc',
                                           'church_center_form', 'rss', 'audio',
                                           'image', 'other')),
            url            TEXT NOT NULL,
            description    TEXT NOT NULL DEFAULT '',
            date_added     INTEGER NOT NULL,
            roles          TEXT NOT NULL DEFAULT '[]',
            tags           TEXT NOT NULL DEFAULT '[]',
            section        TEXT NOT NULL
                           CHECK (section IN ('forms', 'documents', 'media', 'other')),
            thumbnail_url  TEXT,
            position       INTEGER,
            is_published   INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_resources_date_added
            ON resources (date_added DESC);

        CREATE INDEX IF NOT EXISTS idx_resources_section
            ON resources (section, date_added DESC);

        -- Precomputed knowledge-base summaries, one row per resource.
        -- key_points and chunks hold JSON arrays.
        CREATE TABLE IF NOT EXISTS kb_summaries (
            resource_id  TEXT PRIMARY KEY NOT NULL,
            source_url   TEXT NOT NULL,
            summary      TEXT NOT NULL,
            key_points   TEXT NOT NULL DEFAULT '[]',
            chunks       TEXT NOT NULL DEFAULT '[]',
            created_at   INTEGER NOT NULL
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| NarthexError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}
