use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::DEFAULT_SEARCH_LIMIT;

/// Top-level configuration for the Narthex application.
///
/// Loaded from `~/.narthex/config.toml` by default. Constructed once at
/// startup and passed into each component; no component reads ambient
/// environment state after construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarthexConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub kb: KbConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

impl NarthexConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: NarthexConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// API server port.
    pub port: u16,
    /// Data directory for the SQLite database and API token.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            port: 3040,
            data_dir: "~/.narthex/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// API authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// File the bearer token is read from (generated on first start).
    pub token_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: "~/.narthex/api-token".to_string(),
        }
    }
}

/// Generative model settings for intent classification, response
/// synthesis, and knowledge-base summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key; empty means "not configured" and every caller falls back
    /// to its deterministic path.
    pub api_key: String,
    /// Base URL of the generative language API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-pro".to_string(),
            temperature: 0.1,
            timeout_secs: 30,
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default number of results per search.
    pub default_limit: usize,
    /// Hard cap on results per search.
    pub max_limit: usize,
    /// Number of resources returned by the listing endpoint.
    pub listing_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT,
            max_limit: 50,
            listing_limit: 50,
        }
    }
}

/// Chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum message length in characters.
    pub max_message_length: usize,
    /// Gateway rate limit, requests per second.
    pub rate_limit_per_sec: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            rate_limit_per_sec: 20,
        }
    }
}

/// Knowledge-base ingestion and polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KbConfig {
    /// Interval between summary polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Total polling budget measured from the start of polling, in
    /// milliseconds.
    pub max_wait_ms: u64,
    /// Approximate chunk size for stored source text, in characters.
    pub chunk_chars: usize,
    /// Default number of chunks returned by kb-query.
    pub default_k: usize,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_500,
            max_wait_ms: 60_000,
            chunk_chars: 800,
            default_k: 8,
        }
    }
}

/// Google Calendar settings for the events endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// API key; empty means the endpoint reports "not configured".
    pub api_key: String,
    /// Calendar identifier.
    pub calendar_id: String,
}

impl CalendarConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.calendar_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = NarthexConfig::default();
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.general.data_dir, "~/.narthex/data");
        assert_eq!(config.general.log_level, "info");
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.chat.max_message_length, 2000);
        assert_eq!(config.kb.poll_interval_ms, 2_500);
        assert_eq!(config.kb.max_wait_ms, 60_000);
        assert!(!config.calendar.is_configured());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
port = 8080
data_dir = "/custom/data"
log_level = "debug"

[llm]
api_key = "test-key"
model = "gemini-1.5-flash"

[kb]
poll_interval_ms = 500
max_wait_ms = 5000
"#;
        let file = create_temp_config(content);
        let config = NarthexConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.general.data_dir, "/custom/data");
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.model, "gemini-1.5-flash");
        assert_eq!(config.kb.poll_interval_ms, 500);
        // Untouched sections keep their defaults.
        assert_eq!(config.chat.max_message_length, 2000);
        assert_eq!(config.search.listing_limit, 50);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = NarthexConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.kb.default_k, 8);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = NarthexConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.narthex/data");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(NarthexConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = NarthexConfig::default();
        config.calendar.api_key = "cal-key".to_string();
        config.calendar.calendar_id = "primary".to_string();
        config.save(&path).unwrap();

        let reloaded = NarthexConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.port, config.general.port);
        assert!(reloaded.calendar.is_configured());
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = NarthexConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.kb.chunk_chars, 800);
    }

    #[test]
    fn test_calendar_is_configured_requires_both_fields() {
        let mut cal = CalendarConfig::default();
        assert!(!cal.is_configured());
        cal.api_key = "key".to_string();
        assert!(!cal.is_configured());
        cal.calendar_id = "id".to_string();
        assert!(cal.is_configured());
    }
}
