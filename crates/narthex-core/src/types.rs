use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of results a search returns when the caller gives no limit.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

// =============================================================================
// Enums
// =============================================================================

/// Audience role a resource is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Coach,
    Leader,
    Apprentice,
    Member,
}

impl Role {
    /// Lowercase wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Coach => "coach",
            Role::Leader => "leader",
            Role::Apprentice => "apprentice",
            Role::Member => "member",
        }
    }

    /// Case-insensitive parse; returns `None` for anything outside the set.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coach" => Some(Role::Coach),
            "leader" => Some(Role::Leader),
            "apprentice" => Some(Role::Apprentice),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level library section a resource lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Forms,
    Documents,
    Media,
    Other,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Forms => "forms",
            Section::Documents => "documents",
            Section::Media => "media",
            Section::Other => "other",
        }
    }

    /// Case-insensitive parse; returns `None` for anything outside the set.
    pub fn parse(s: &str) -> Option<Section> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forms" => Some(Section::Forms),
            "documents" => Some(Section::Documents),
            "media" => Some(Section::Media),
            "other" => Some(Section::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete kind of a stored resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Webpage,
    Youtube,
    Pdf,
    GoogleDoc,
    ChurchCenterForm,
    Rss,
    Audio,
    Image,
    Other,
}

impl ResourceType {
    /// Snake-case wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Webpage => "webpage",
            ResourceType::Youtube => "youtube",
            ResourceType::Pdf => "pdf",
            ResourceType::GoogleDoc => "google_doc",
            ResourceType::ChurchCenterForm => "church_center_form",
            ResourceType::Rss => "rss",
            ResourceType::Audio => "audio",
            ResourceType::Image => "image",
            ResourceType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<ResourceType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webpage" => Some(ResourceType::Webpage),
            "youtube" => Some(ResourceType::Youtube),
            "pdf" => Some(ResourceType::Pdf),
            "google_doc" => Some(ResourceType::GoogleDoc),
            "church_center_form" => Some(ResourceType::ChurchCenterForm),
            "rss" => Some(ResourceType::Rss),
            "audio" => Some(ResourceType::Audio),
            "image" => Some(ResourceType::Image),
            "other" => Some(ResourceType::Other),
            _ => None,
        }
    }

    /// Only Google Docs are eligible for knowledge-base summaries.
    pub fn is_kb_eligible(&self) -> bool {
        matches!(self, ResourceType::GoogleDoc)
    }

    /// Singular human label, used when describing results in prose.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::Webpage => "webpage",
            ResourceType::Youtube => "video",
            ResourceType::Pdf => "PDF",
            ResourceType::GoogleDoc => "document",
            ResourceType::ChurchCenterForm => "form",
            ResourceType::Rss => "feed",
            ResourceType::Audio => "audio recording",
            ResourceType::Image => "image",
            ResourceType::Other => "resource",
        }
    }

    /// Plural human label.
    pub fn plural_label(&self) -> &'static str {
        match self {
            ResourceType::Webpage => "webpages",
            ResourceType::Youtube => "videos",
            ResourceType::Pdf => "PDFs",
            ResourceType::GoogleDoc => "documents",
            ResourceType::ChurchCenterForm => "forms",
            ResourceType::Rss => "feeds",
            ResourceType::Audio => "audio recordings",
            ResourceType::Image => "images",
            ResourceType::Other => "resources",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Resource
// =============================================================================

/// A single directory entry: a form, document, or media item.
///
/// `roles` and `tags` are unordered sets of strings compared
/// case-insensitively. `is_published: None` counts as published (the
/// directory is default-open; see the search executor).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub section: Section,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

impl Resource {
    /// Case-insensitive role membership.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(role.as_str()))
    }
}

// =============================================================================
// Search arguments
// =============================================================================

/// Structured arguments for one resource search.
///
/// Produced by the intent classifier and consumed by the search executor.
/// `broad` means "ignore the role restriction even if a role is present";
/// `exact` marks a search for a specific named item (a classifier hint, it
/// does not change filtering).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchArgs {
    pub query: String,
    pub role: Option<Role>,
    pub section: Option<Section>,
    pub apply: bool,
    pub broad: bool,
    pub exact: bool,
    pub limit: usize,
}

impl Default for SearchArgs {
    fn default() -> Self {
        Self {
            query: String::new(),
            role: None,
            section: None,
            apply: false,
            broad: false,
            exact: false,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
