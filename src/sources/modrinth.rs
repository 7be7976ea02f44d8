use crate::catalog::{Platform, SortKey};
use crate::sources::{truncate_for_log, CatalogSource, RawRecord, SourcePage, SourceQuery};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.modrinth.com/v2";
const USER_AGENT: &str = concat!(
    "modpack-index/",
    env!("CARGO_PKG_VERSION"),
    " (modpack catalog aggregator)"
);

/// Modrinth search API client.
///
/// Key endpoint: GET /search with `query`, `facets` (a JSON-encoded array of
/// OR-groups, AND-ed together), `index` (sort), `offset`, `limit`.
/// Modrinth requires a descriptive User-Agent.
#[derive(Debug, Clone)]
pub struct ModrinthSource {
    base_url: String,
    http: Client,
}

/// One project hit as Modrinth reports it. Every field is defaulted so a
/// sparse or partially malformed hit still deserializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModrinthHit {
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub downloads: i64,
    pub follows: i64,
    pub icon_url: Option<String>,
    pub date_modified: Option<String>,
    pub latest_version: Option<String>,
    pub author: Option<String>,
    pub loaders: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModrinthSearchResponse {
    pub hits: Vec<ModrinthHit>,
    pub total_hits: i64,
}

impl ModrinthSource {
    pub fn new(base_url: Option<&str>, timeout_secs: Option<u64>) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(15)))
            .build()?;
        Ok(Self { base_url, http })
    }

    /// Build the facet groups for a query: always scoped to modpacks, with
    /// optional loader and game-version facets AND-ed on.
    pub fn build_facets(query: &SourceQuery) -> Vec<Vec<String>> {
        let mut facets = vec![vec!["project_type:modpack".to_string()]];
        if let Some(loader) = query.mod_loader {
            facets.push(vec![format!("categories:{}", loader.as_str())]);
        }
        if let Some(version) = query.game_version.as_deref() {
            facets.push(vec![format!("versions:{version}")]);
        }
        facets
    }

    /// Modrinth `index` values for our sort keys.
    pub fn sort_index(sort: SortKey) -> &'static str {
        match sort {
            SortKey::Downloads => "downloads",
            SortKey::Follows => "follows",
            SortKey::Updated => "updated",
            SortKey::Created => "newest",
        }
    }

    async fn fetch(
        &self,
        query: &str,
        facets: &[Vec<String>],
        index: &str,
        limit: u32,
        offset: u32,
    ) -> Result<SourcePage> {
        let url = format!("{}/search", self.base_url);
        let facets_json = serde_json::to_string(facets)?;
        let limit = limit.to_string();
        let offset = offset.to_string();

        let mut req = self.http.get(&url).query(&[
            ("facets", facets_json.as_str()),
            ("index", index),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
        ]);
        if !query.is_empty() {
            req = req.query(&[("query", query)]);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 2000);
            return Err(anyhow!("Modrinth search failed: {status} url={url} body={body}"));
        }

        let body: ModrinthSearchResponse = resp.json().await?;
        Ok(SourcePage {
            records: body.hits.into_iter().map(RawRecord::Modrinth).collect(),
            total: body.total_hits,
        })
    }
}

#[async_trait]
impl CatalogSource for ModrinthSource {
    fn platform(&self) -> Platform {
        Platform::Modrinth
    }

    async fn search(&self, query: &SourceQuery) -> Result<SourcePage> {
        let facets = Self::build_facets(query);
        self.fetch(
            &query.text,
            &facets,
            Self::sort_index(query.sort),
            query.limit,
            query.offset,
        )
        .await
    }

    async fn page(&self, page_size: u32, offset: u32) -> Result<SourcePage> {
        // Deterministic download-count ordering so repeated sync runs with a
        // growing page size see monotonic supersets.
        let facets = vec![vec!["project_type:modpack".to_string()]];
        self.fetch("", &facets, "downloads", page_size, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModLoader;
    use serde_json::json;

    fn query(loader: Option<ModLoader>, version: Option<&str>) -> SourceQuery {
        SourceQuery {
            text: "skyblock".into(),
            mod_loader: loader,
            game_version: version.map(String::from),
            sort: SortKey::Downloads,
            limit: 10,
            offset: 0,
        }
    }

    #[test]
    fn facets_always_scope_to_modpacks() {
        let facets = ModrinthSource::build_facets(&query(None, None));
        assert_eq!(facets, vec![vec!["project_type:modpack".to_string()]]);
    }

    #[test]
    fn facets_add_loader_and_version_groups() {
        let facets = ModrinthSource::build_facets(&query(Some(ModLoader::Fabric), Some("1.20.1")));
        assert_eq!(
            facets,
            vec![
                vec!["project_type:modpack".to_string()],
                vec!["categories:fabric".to_string()],
                vec!["versions:1.20.1".to_string()],
            ]
        );
    }

    #[test]
    fn sort_index_mapping() {
        assert_eq!(ModrinthSource::sort_index(SortKey::Downloads), "downloads");
        assert_eq!(ModrinthSource::sort_index(SortKey::Follows), "follows");
        assert_eq!(ModrinthSource::sort_index(SortKey::Updated), "updated");
        assert_eq!(ModrinthSource::sort_index(SortKey::Created), "newest");
    }

    #[test]
    fn sparse_hit_deserializes_with_defaults() {
        let hit: ModrinthHit =
            serde_json::from_value(json!({ "project_id": "AABBCC" })).unwrap();
        assert_eq!(hit.project_id, "AABBCC");
        assert_eq!(hit.downloads, 0);
        assert_eq!(hit.follows, 0);
        assert!(hit.title.is_empty());
        assert!(hit.loaders.is_empty());
        assert!(hit.date_modified.is_none());
    }

    #[test]
    fn search_response_parses_real_shape() {
        let resp: ModrinthSearchResponse = serde_json::from_value(json!({
            "hits": [{
                "project_id": "1KVo5zza",
                "title": "SkyFactory",
                "description": "Sky islands",
                "downloads": 120_000,
                "follows": 900,
                "icon_url": "https://cdn.modrinth.com/icon.png",
                "date_modified": "2024-03-01T10:00:00Z",
                "latest_version": "1.20.1",
                "author": "darkosto",
                "loaders": ["forge"],
                "categories": ["skyblock", "tech"]
            }],
            "total_hits": 812,
            "offset": 0,
            "limit": 10
        }))
        .unwrap();
        assert_eq!(resp.total_hits, 812);
        assert_eq!(resp.hits.len(), 1);
        assert_eq!(resp.hits[0].author.as_deref(), Some("darkosto"));
    }
}
