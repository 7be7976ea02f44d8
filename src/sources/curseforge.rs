use crate::catalog::{Platform, SortKey};
use crate::sources::{truncate_for_log, CatalogSource, RawRecord, SourcePage, SourceQuery};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.curseforge.com/v1";
const MINECRAFT_GAME_ID: u32 = 432;
const MODPACK_CLASS_ID: u32 = 4471;

/// CurseForge mods API client.
///
/// Key endpoint: GET /mods/search with `gameId`/`classId` pinning the result
/// set to Minecraft modpacks, plus `searchFilter`, `sortField`, `sortOrder`,
/// `modLoaderType`, `gameVersion`, `index`, `pageSize`. Requires an X-API-Key.
#[derive(Debug, Clone)]
pub struct CurseForgeSource {
    base_url: String,
    http: Client,
    api_key: Option<String>,
}

/// One mod as CurseForge reports it. Defaulted throughout so sparse payloads
/// deserialize; `downloadCount` arrives as a float in practice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurseForgeMod {
    pub id: i64,
    pub name: String,
    pub summary: String,
    pub download_count: f64,
    pub thumbs_up_count: i64,
    pub logo: Option<CurseForgeLogo>,
    pub authors: Vec<CurseForgeAuthor>,
    pub categories: Vec<CurseForgeCategory>,
    pub latest_files_indexes: Vec<CurseForgeFileIndex>,
    pub date_modified: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurseForgeLogo {
    pub thumbnail_url: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurseForgeAuthor {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurseForgeCategory {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurseForgeFileIndex {
    pub game_version: String,
    pub mod_loader: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CurseForgeSearchResponse {
    data: Vec<CurseForgeMod>,
    pagination: CurseForgePagination,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CurseForgePagination {
    total_count: i64,
}

impl CurseForgeSource {
    pub fn new(
        base_url: Option<&str>,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let http = Client::builder()
            .user_agent(concat!("modpack-index/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(15)))
            .build()?;
        Ok(Self {
            base_url,
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// CurseForge `sortField` codes (2 = Popularity, 3 = LastUpdated,
    /// 6 = TotalDownloads, 11 = ReleasedDate).
    pub fn sort_field(sort: SortKey) -> u32 {
        match sort {
            SortKey::Downloads => 6,
            SortKey::Follows => 2,
            SortKey::Updated => 3,
            SortKey::Created => 11,
        }
    }

    async fn fetch(&self, params: Vec<(String, String)>) -> Result<SourcePage> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("CurseForge API key not configured");
        };

        let url = format!("{}/mods/search", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("X-API-Key", api_key)
            .header("Accept", "application/json")
            .query(&params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 2000);
            return Err(anyhow!(
                "CurseForge search failed: {status} url={url} body={body}"
            ));
        }

        let body: CurseForgeSearchResponse = resp.json().await?;
        Ok(SourcePage {
            total: body.pagination.total_count,
            records: body.data.into_iter().map(RawRecord::CurseForge).collect(),
        })
    }

    fn base_params(page_size: u32, offset: u32) -> Vec<(String, String)> {
        vec![
            ("gameId".into(), MINECRAFT_GAME_ID.to_string()),
            ("classId".into(), MODPACK_CLASS_ID.to_string()),
            ("index".into(), offset.to_string()),
            ("pageSize".into(), page_size.to_string()),
        ]
    }
}

#[async_trait]
impl CatalogSource for CurseForgeSource {
    fn platform(&self) -> Platform {
        Platform::CurseForge
    }

    async fn search(&self, query: &SourceQuery) -> Result<SourcePage> {
        let mut params = Self::base_params(query.limit, query.offset);
        if !query.text.is_empty() {
            params.push(("searchFilter".into(), query.text.clone()));
        }
        params.push(("sortField".into(), Self::sort_field(query.sort).to_string()));
        params.push(("sortOrder".into(), "desc".into()));
        if let Some(loader) = query.mod_loader {
            params.push(("modLoaderType".into(), loader.code().to_string()));
        }
        if let Some(version) = query.game_version.as_deref() {
            params.push(("gameVersion".into(), version.to_string()));
        }
        self.fetch(params).await
    }

    async fn page(&self, page_size: u32, offset: u32) -> Result<SourcePage> {
        let mut params = Self::base_params(page_size, offset);
        params.push(("sortField".into(), Self::sort_field(SortKey::Downloads).to_string()));
        params.push(("sortOrder".into(), "desc".into()));
        self.fetch(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_field_mapping() {
        assert_eq!(CurseForgeSource::sort_field(SortKey::Downloads), 6);
        assert_eq!(CurseForgeSource::sort_field(SortKey::Follows), 2);
        assert_eq!(CurseForgeSource::sort_field(SortKey::Updated), 3);
        assert_eq!(CurseForgeSource::sort_field(SortKey::Created), 11);
    }

    #[tokio::test]
    async fn missing_api_key_is_an_error() {
        let source = CurseForgeSource::new(None, None, Some(5)).unwrap();
        let err = source.page(10, 0).await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn mod_payload_parses_real_shape() {
        let m: CurseForgeMod = serde_json::from_value(json!({
            "id": 520914,
            "name": "All the Mods 9",
            "summary": "Kitchen sink pack",
            "downloadCount": 18234567.0,
            "thumbsUpCount": 412,
            "logo": { "thumbnailUrl": "https://media.forgecdn.net/t.png", "url": "https://media.forgecdn.net/f.png" },
            "authors": [{ "id": 1, "name": "ATMTeam", "url": "https://curseforge.com/members/atmteam" }],
            "categories": [{ "categoryId": 4484, "name": "Multiplayer" }],
            "latestFilesIndexes": [
                { "gameVersion": "1.20.1", "fileId": 1, "modLoader": 6 },
                { "gameVersion": "1.19.2", "fileId": 2, "modLoader": 1 }
            ],
            "dateModified": "2024-05-11T08:30:00Z"
        }))
        .unwrap();
        assert_eq!(m.id, 520914);
        assert_eq!(m.download_count as i64, 18234567);
        assert_eq!(m.latest_files_indexes[0].mod_loader, Some(6));
        assert_eq!(m.authors[0].name, "ATMTeam");
    }

    #[test]
    fn sparse_mod_payload_defaults() {
        let m: CurseForgeMod = serde_json::from_value(json!({ "id": 7 })).unwrap();
        assert_eq!(m.id, 7);
        assert_eq!(m.download_count, 0.0);
        assert!(m.logo.is_none());
        assert!(m.latest_files_indexes.is_empty());
    }
}
