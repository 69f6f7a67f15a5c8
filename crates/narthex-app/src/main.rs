//! Narthex application binary - composition root.
//!
//! Ties the workspace together:
//! 1. Parse CLI args and resolve configuration (flags > env > file > defaults)
//! 2. Initialize tracing
//! 3. Open the SQLite store and run migrations
//! 4. Load or generate the API bearer token
//! 5. Optionally import resources from a JSON file
//! 6. Start the axum gateway

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use narthex_api::{routes, AppState};
use narthex_core::config::NarthexConfig;
use narthex_core::types::Resource;
use narthex_llm::{GeminiClient, GenerativeClient};
use narthex_store::{Database, ResourceRepository};

mod cli;
use cli::CliArgs;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config_path = args.resolve_config_path();
    let mut config = NarthexConfig::load_or_default(&config_path);
    config.general.port = args.resolve_port(config.general.port);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);

    // Credentials resolve from the environment exactly once, here; the
    // components only ever see the finished config value.
    if config.llm.api_key.is_empty() {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.llm.api_key = key;
        }
    }
    if config.calendar.api_key.is_empty() {
        if let Ok(key) = std::env::var("GOOGLE_CALENDAR_API_KEY") {
            config.calendar.api_key = key;
        }
    }
    if config.calendar.calendar_id.is_empty() {
        if let Ok(id) = std::env::var("GOOGLE_CALENDAR_ID") {
            config.calendar.calendar_id = id;
        }
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.general.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !config.llm.api_key.is_empty() {
        tracing::info!("Generative model configured: {}", config.llm.model);
    } else {
        tracing::warn!(
            "No model API key configured; classification and synthesis run on fallbacks"
        );
    }

    let data_dir = args.resolve_data_dir(&config.general.data_dir);
    let db_path = data_dir.join("narthex.db");
    let database = match Database::new(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database at {}", db_path.display());
            std::process::exit(1);
        }
    };

    let token_path = cli::expand_home(&config.auth.token_path);
    let api_token = narthex_api::auth::load_or_generate_token(&token_path);

    if let Some(ref import_path) = args.import {
        if let Err(e) = import_resources(&database, import_path) {
            tracing::error!(error = %e, "Resource import failed");
            std::process::exit(1);
        }
    }

    let llm: Arc<dyn GenerativeClient> = Arc::new(GeminiClient::new(config.llm.clone()));
    let mut state = AppState::new(config, database, llm);
    state.api_token = api_token;

    if let Err(e) = routes::start_server(state).await {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}

/// Load a JSON array of resources into the store.
fn import_resources(
    database: &Arc<Database>,
    path: &Path,
) -> Result<(), narthex_core::NarthexError> {
    let content = std::fs::read_to_string(path)?;
    let resources: Vec<Resource> = serde_json::from_str(&content)?;
    let repo = ResourceRepository::new(Arc::clone(database));
    let count = resources.len();
    for resource in &resources {
        repo.save(resource)?;
    }
    tracing::info!("Imported {} resources from {}", count, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use narthex_core::types::{ResourceType, Section};

    #[test]
    fn test_import_resources_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::in_memory().unwrap());

        let resources = vec![Resource {
            id: Uuid::new_v4(),
            title: "MC Coach Application".to_string(),
            kind: ResourceType::ChurchCenterForm,
            url: "https://example.org/apply".to_string(),
            description: String::new(),
            date_added: Utc::now(),
            roles: vec!["Coach".to_string()],
            tags: vec![],
            section: Section::Forms,
            thumbnail_url: None,
            position: None,
            is_published: Some(true),
        }];
        let path = dir.path().join("resources.json");
        std::fs::write(&path, serde_json::to_string(&resources).unwrap()).unwrap();

        import_resources(&db, &path).unwrap();

        let repo = ResourceRepository::new(db);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_import_resources_invalid_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::in_memory().unwrap());
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(import_resources(&db, &path).is_err());
    }
}
