pub mod normalize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a catalog entry: the local store or one of the upstream APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Local,
    Modrinth,
    CurseForge,
}

impl Platform {
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Local => "Local",
            Platform::Modrinth => "Modrinth",
            Platform::CurseForge => "CurseForge",
        }
    }

    /// Public site URL stored on the platform record (not the API base).
    pub fn site_url(&self) -> &'static str {
        match self {
            Platform::Local => "https://localhost",
            Platform::Modrinth => "https://modrinth.com",
            Platform::CurseForge => "https://www.curseforge.com",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Minecraft mod loader. CurseForge encodes these as integers, Modrinth as
/// lowercase category strings; both funnel through the constructors here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModLoader {
    Forge,
    Fabric,
    Quilt,
    NeoForge,
}

impl ModLoader {
    /// CurseForge `modLoaderType` codes. Unmapped codes are `None`, never an error.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(ModLoader::Forge),
            4 => Some(ModLoader::Fabric),
            5 => Some(ModLoader::Quilt),
            6 => Some(ModLoader::NeoForge),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ModLoader::Forge => 1,
            ModLoader::Fabric => 4,
            ModLoader::Quilt => 5,
            ModLoader::NeoForge => 6,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "forge" => Some(ModLoader::Forge),
            "fabric" => Some(ModLoader::Fabric),
            "quilt" => Some(ModLoader::Quilt),
            "neoforge" => Some(ModLoader::NeoForge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModLoader::Forge => "forge",
            ModLoader::Fabric => "fabric",
            ModLoader::Quilt => "quilt",
            ModLoader::NeoForge => "neoforge",
        }
    }
}

/// Global sort key applied when merging results from several sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Downloads,
    Follows,
    Updated,
    Created,
}

impl SortKey {
    /// Lenient parse used by the HTTP layer; anything unknown falls back to downloads.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "follows" => SortKey::Follows,
            "updated" => SortKey::Updated,
            "created" => SortKey::Created,
            _ => SortKey::Downloads,
        }
    }
}

/// Which sources a search fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    All,
    One(Platform),
}

impl SearchScope {
    /// "database" is accepted as an alias for the local store (legacy client value).
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" | "database" => SearchScope::One(Platform::Local),
            "modrinth" => SearchScope::One(Platform::Modrinth),
            "curseforge" => SearchScope::One(Platform::CurseForge),
            _ => SearchScope::All,
        }
    }
}

/// Canonical, source-agnostic modpack record. Every source's raw shape is
/// normalized into this before anything downstream touches it.
///
/// Serialized field names match the search API wire format
/// (`project_id`, `date_modified`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "project_id")]
    pub external_id: String,
    pub platform: Platform,
    pub title: String,
    pub description: String,
    pub downloads: i64,
    pub follows: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(rename = "date_modified")]
    pub last_modified: DateTime<Utc>,
    #[serde(
        rename = "latest_version",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub latest_game_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_loader: Option<ModLoader>,
    pub categories: Vec<String>,
}
