//! Resource repository over the SQLite store.
//!
//! Stores and retrieves directory entries. Listing order matches the
//! public resources endpoint: explicit position first (nulls last), then
//! recency.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use narthex_core::error::NarthexError;
use narthex_core::types::{Resource, ResourceType, Section};

use crate::db::Database;

pub(crate) const RESOURCE_COLUMNS: &str = "id, title, kind, url, description, date_added, \
     roles, tags, section, thumbnail_url, position, is_published";

/// Repository for directory resources.
pub struct ResourceRepository {
    db: Arc<Database>,
}

impl ResourceRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace a resource.
    pub fn save(&self, resource: &Resource) -> Result<(), NarthexError> {
        let roles = serde_json::to_string(&resource.roles)?;
        let tags = serde_json::to_string(&resource.tags)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO resources
                 (id, title, kind, url, description, date_added, roles, tags,
                  section, thumbnail_url, position, is_published)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    resource.id.to_string(),
                    resource.title,
                    resource.kind.as_str(),
                    resource.url,
                    resource.description,
                    resource.date_added.timestamp(),
                    roles,
                    tags,
                    resource.section.as_str(),
                    resource.thumbnail_url,
                    resource.position,
                    resource.is_published.map(|p| p as i32),
                ],
            )
            .map_err(|e| NarthexError::Storage(format!("Failed to save resource: {}", e)))?;
            Ok(())
        })
    }

    /// Find a resource by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>, NarthexError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {} FROM resources WHERE id = ?1", RESOURCE_COLUMNS);
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| NarthexError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_resource(row))
                })
                .optional()
                .map_err(|e| NarthexError::Storage(e.to_string()))?;

            match result {
                Some(resource) => Ok(Some(resource?)),
                None => Ok(None),
            }
        })
    }

    /// List published resources for the directory listing.
    ///
    /// Published means `is_published` true or absent. Ordered by explicit
    /// position (nulls last) then recency.
    pub fn list_published(&self, limit: usize) -> Result<Vec<Resource>, NarthexError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM resources
                 WHERE is_published = 1 OR is_published IS NULL
                 ORDER BY position IS NULL, position, date_added DESC
                 LIMIT ?1",
                RESOURCE_COLUMNS
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| NarthexError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![limit as i64], |row| {
                    Ok(row_to_resource(row))
                })
                .map_err(|e| NarthexError::Storage(e.to_string()))?;

            let mut resources = Vec::new();
            for row in rows {
                resources.push(row.map_err(|e| NarthexError::Storage(e.to_string()))??);
            }
            Ok(resources)
        })
    }

    /// Total number of stored resources.
    pub fn count(&self) -> Result<u64, NarthexError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))
                .map_err(|e| NarthexError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

/// Convert a row selected with [`RESOURCE_COLUMNS`] into a Resource.
pub(crate) fn row_to_resource(row: &rusqlite::Row<'_>) -> Result<Resource, NarthexError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let title: String = row
        .get(1)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let kind_str: String = row
        .get(2)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let url: String = row
        .get(3)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let description: String = row
        .get(4)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let date_added: i64 = row
        .get(5)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let roles_json: String = row
        .get(6)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let tags_json: String = row
        .get(7)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let section_str: String = row
        .get(8)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let thumbnail_url: Option<String> = row
        .get(9)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let position: Option<i64> = row
        .get(10)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;
    let is_published: Option<i64> = row
        .get(11)
        .map_err(|e| NarthexError::Storage(e.to_string()))?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| NarthexError::Storage(format!("Invalid resource id: {}", e)))?;
    let kind = ResourceType::parse(&kind_str)
        .ok_or_else(|| NarthexError::Storage(format!("Unknown resource kind: {}", kind_str)))?;
    let section = Section::parse(&section_str)
        .ok_or_else(|| NarthexError::Storage(format!("Unknown section: {}", section_str)))?;
    let roles: Vec<String> = serde_json::from_str(&roles_json)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json)?;
    let date_added = Utc
        .timestamp_opt(date_added, 0)
        .single()
        .unwrap_or_default();

    Ok(Resource {
        id,
        title,
        kind,
        url,
        description,
        date_added,
        roles,
        tags,
        section,
        thumbnail_url,
        position,
        is_published: is_published.map(|p| p != 0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_repo() -> ResourceRepository {
        ResourceRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn resource(title: &str, days_ago: i64, position: Option<i64>) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            title: title.to_string(),
            kind: ResourceType::GoogleDoc,
            url: format!("https://docs.google.com/document/d/{}", title),
            description: String::new(),
            date_added: Utc::now() - Duration::days(days_ago),
            roles: vec![],
            tags: vec![],
            section: Section::Documents,
            thumbnail_url: None,
            position,
            is_published: Some(true),
        }
    }

    #[test]
    fn test_save_and_find_round_trip() {
        let repo = make_repo();
        let mut r = resource("Coaching Guide", 1, None);
        r.roles = vec!["Coach".to_string()];
        r.tags = vec!["training".to_string()];
        r.is_published = None;
        repo.save(&r).unwrap();

        let found = repo.find_by_id(r.id).unwrap().unwrap();
        assert_eq!(found.title, "Coaching Guide");
        assert_eq!(found.kind, ResourceType::GoogleDoc);
        assert_eq!(found.roles, vec!["Coach"]);
        assert_eq!(found.tags, vec!["training"]);
        assert_eq!(found.is_published, None);
        assert_eq!(found.date_added.timestamp(), r.date_added.timestamp());
    }

    #[test]
    fn test_find_by_id_missing() {
        let repo = make_repo();
        assert!(repo.find_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_published_excludes_unpublished_only() {
        let repo = make_repo();
        let published = resource("published", 1, None);
        let mut implicit = resource("implicit", 2, None);
        implicit.is_published = None;
        let mut hidden = resource("hidden", 0, None);
        hidden.is_published = Some(false);

        repo.save(&published).unwrap();
        repo.save(&implicit).unwrap();
        repo.save(&hidden).unwrap();

        let listed = repo.list_published(50).unwrap();
        let titles: Vec<&str> = listed.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"published"));
        assert!(titles.contains(&"implicit"));
    }

    #[test]
    fn test_list_published_position_before_recency() {
        let repo = make_repo();
        repo.save(&resource("newest-no-position", 0, None)).unwrap();
        repo.save(&resource("second", 5, Some(2))).unwrap();
        repo.save(&resource("first", 9, Some(1))).unwrap();

        let listed = repo.list_published(50).unwrap();
        let titles: Vec<&str> = listed.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "newest-no-position"]);
    }

    #[test]
    fn test_list_published_respects_limit() {
        let repo = make_repo();
        for i in 0..5 {
            repo.save(&resource(&format!("r{}", i), i, None)).unwrap();
        }
        assert_eq!(repo.list_published(3).unwrap().len(), 3);
    }

    #[test]
    fn test_count() {
        let repo = make_repo();
        assert_eq!(repo.count().unwrap(), 0);
        repo.save(&resource("a", 0, None)).unwrap();
        repo.save(&resource("b", 1, None)).unwrap();
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_save_is_upsert() {
        let repo = make_repo();
        let mut r = resource("original", 0, None);
        repo.save(&r).unwrap();
        r.title = "renamed".to_string();
        repo.save(&r).unwrap();

        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.find_by_id(r.id).unwrap().unwrap().title, "renamed");
    }
}
