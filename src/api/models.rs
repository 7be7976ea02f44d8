// API request/response models (DTOs)

use crate::aggregator::SearchRequest;
use crate::catalog::{ModLoader, SearchScope, SortKey};
use crate::sync::SyncOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

/// Query parameters for GET /api/v1/search. Field names match the legacy
/// web client (`modLoader`, `minecraftVersion`, `sortBy`).
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub platform: Option<String>,
    #[serde(rename = "modLoader")]
    pub mod_loader: Option<String>,
    #[serde(rename = "minecraftVersion")]
    pub minecraft_version: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SearchParams {
    pub fn to_request(&self) -> SearchRequest {
        SearchRequest {
            query: self.query.trim().to_string(),
            scope: self
                .platform
                .as_deref()
                .map(SearchScope::parse)
                .unwrap_or(SearchScope::All),
            mod_loader: self.mod_loader.as_deref().and_then(ModLoader::from_name),
            game_version: self
                .minecraft_version
                .clone()
                .filter(|v| !v.trim().is_empty()),
            sort: self
                .sort_by
                .as_deref()
                .map(SortKey::parse)
                .unwrap_or(SortKey::Downloads),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: self.offset.unwrap_or(0),
        }
    }

    pub fn cache_key(&self) -> String {
        format!(
            "search:{}:{}:{}:{}:{}:{}:{}",
            self.query.trim(),
            self.platform.as_deref().unwrap_or("all"),
            self.mod_loader.as_deref().unwrap_or(""),
            self.minecraft_version.as_deref().unwrap_or(""),
            self.sort_by.as_deref().unwrap_or("downloads"),
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.offset.unwrap_or(0),
        )
    }
}

/// Query parameters for POST /api/v1/sync/{platform}.
#[derive(Debug, Deserialize)]
pub struct SyncParams {
    #[serde(rename = "pageSize", default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    100
}

/// Wire shape for sync results, covering both completed runs (possibly with
/// per-item failures) and runs that could not sync at all.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<usize>,
    #[serde(rename = "errorDetails", skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
}

impl SyncResponse {
    pub fn from_outcome(outcome: SyncOutcome) -> Self {
        Self {
            success: true,
            count: Some(outcome.succeeded),
            total: Some(outcome.total_attempted),
            errors: Some(outcome.failed),
            error_details: if outcome.per_item_errors.is_empty() {
                None
            } else {
                Some(outcome.per_item_errors)
            },
            error: None,
            details: None,
            platform: outcome.platform_name,
            timestamp: outcome.completed_at,
        }
    }

    pub fn failure(platform: &str, error: String, details: Option<String>) -> Self {
        Self {
            success: false,
            count: None,
            total: None,
            errors: None,
            error_details: None,
            error: Some(error),
            details,
            platform: platform.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Platform;

    #[test]
    fn params_default_to_all_scope_and_downloads() {
        let req = SearchParams::default().to_request();
        assert_eq!(req.scope, SearchScope::All);
        assert_eq!(req.sort, SortKey::Downloads);
        assert_eq!(req.limit, 20);
        assert_eq!(req.offset, 0);
        assert!(req.query.is_empty());
    }

    #[test]
    fn limit_is_clamped() {
        let params = SearchParams {
            limit: Some(10_000),
            ..SearchParams::default()
        };
        assert_eq!(params.to_request().limit, 100);
        let params = SearchParams {
            limit: Some(0),
            ..SearchParams::default()
        };
        assert_eq!(params.to_request().limit, 1);
    }

    #[test]
    fn platform_and_loader_parse_into_request() {
        let params = SearchParams {
            platform: Some("modrinth".into()),
            mod_loader: Some("Fabric".into()),
            sort_by: Some("updated".into()),
            ..SearchParams::default()
        };
        let req = params.to_request();
        assert_eq!(req.scope, SearchScope::One(Platform::Modrinth));
        assert_eq!(req.mod_loader, Some(ModLoader::Fabric));
        assert_eq!(req.sort, SortKey::Updated);
    }

    #[test]
    fn cache_key_distinguishes_requests() {
        let a = SearchParams {
            query: "skyblock".into(),
            ..SearchParams::default()
        };
        let b = SearchParams {
            query: "skyblock".into(),
            offset: Some(20),
            ..SearchParams::default()
        };
        assert_ne!(a.cache_key(), b.cache_key());
    }
}
