//! Search executor: structured search arguments to a store query.
//!
//! Always restricts to published resources (absent flag counts as
//! published). Section, role, and free-text filters are conjoined with the
//! publish filter, never substituted for it. Zero matches is a normal
//! outcome; only store failures are errors, and those surface as
//! `SearchUnavailable` so they can never be confused with empty results.

use std::sync::Arc;

use rusqlite::ToSql;

use narthex_core::error::NarthexError;
use narthex_core::types::{Resource, SearchArgs};

use crate::db::Database;
use crate::repository::{row_to_resource, RESOURCE_COLUMNS};

/// Executes structured searches against the resource store.
pub struct SearchExecutor {
    db: Arc<Database>,
}

impl SearchExecutor {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Run one search. Identical arguments against an unchanged store
    /// return the same ordered result set.
    pub fn execute(&self, args: &SearchArgs) -> Result<Vec<Resource>, NarthexError> {
        let result = self.db.with_conn(|conn| {
            let mut sql = format!(
                "SELECT {} FROM resources WHERE (is_published = 1 OR is_published IS NULL)",
                RESOURCE_COLUMNS
            );
            let mut params: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(section) = args.section {
                sql.push_str(" AND section = ?");
                params.push(Box::new(section.as_str().to_string()));
            }

            // A broad search ignores the role restriction even when a role
            // is present in the arguments.
            if let (Some(role), false) = (args.role, args.broad) {
                sql.push_str(" AND lower(roles) LIKE ?");
                params.push(Box::new(format!("%\"{}\"%", role.as_str())));
            }

            let query = args.query.trim();
            if !query.is_empty() {
                sql.push_str(
                    " AND (lower(title) LIKE ? ESCAPE '\\'
                       OR lower(description) LIKE ? ESCAPE '\\'
                       OR lower(tags) LIKE ? ESCAPE '\\')",
                );
                let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }

            sql.push_str(" ORDER BY date_added DESC, id LIMIT ?");
            params.push(Box::new(args.limit as i64));

            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| NarthexError::SearchUnavailable(e.to_string()))?;

            let rows = stmt
                .query_map(
                    rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
                    |row| Ok(row_to_resource(row)),
                )
                .map_err(|e| NarthexError::SearchUnavailable(e.to_string()))?;

            let mut resources = Vec::new();
            for row in rows {
                resources.push(
                    row.map_err(|e| NarthexError::SearchUnavailable(e.to_string()))??,
                );
            }
            Ok(resources)
        });

        // Lock or connection failures also count as "store unreachable".
        result.map_err(|e| match e {
            NarthexError::SearchUnavailable(_) => e,
            other => NarthexError::SearchUnavailable(other.to_string()),
        })
    }
}

/// Escape LIKE wildcards in user text; the statement uses ESCAPE '\'.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '%' || c == '_' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
