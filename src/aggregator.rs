//! Federated search across the local store and the upstream catalog APIs.

use crate::catalog::normalize::normalize;
use crate::catalog::{CatalogEntry, ModLoader, Platform, SearchScope, SortKey};
use crate::error::CatalogError;
use crate::sources::{CatalogSource, SourceQuery};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub scope: SearchScope,
    pub mod_loader: Option<ModLoader>,
    pub game_version: Option<String>,
    pub sort: SortKey,
    pub limit: u32,
    pub offset: u32,
}

/// Wire shape returned to search callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<CatalogEntry>,
    pub total_hits: i64,
    pub offset: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

/// Fans one search out to the selected sources, merges the normalized
/// entries, and windows the result.
///
/// Source order is fixed at construction (local store first, then the
/// upstream APIs); that order is the tie-break for the merged sort, so output
/// is deterministic no matter which fetch completes first.
pub struct Aggregator {
    sources: Vec<Arc<dyn CatalogSource>>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self { sources }
    }

    fn selected(&self, scope: SearchScope) -> Vec<&Arc<dyn CatalogSource>> {
        self.sources
            .iter()
            .filter(|s| match scope {
                SearchScope::All => true,
                SearchScope::One(p) => s.platform() == p,
            })
            .collect()
    }

    #[instrument(skip(self, req), fields(query = %req.query, limit = req.limit))]
    pub async fn search(&self, req: &SearchRequest) -> Result<SearchResponse, CatalogError> {
        let selected = self.selected(req.scope);
        if selected.is_empty() {
            if let SearchScope::One(platform) = req.scope {
                return Err(CatalogError::SourceUnavailable {
                    platform,
                    cause: anyhow::anyhow!("source not configured"),
                });
            }
        }
        let multi = selected.len() > 1;

        // Remote sources under a multi-source search get half the page each;
        // the local store (and any single pinned source) gets the full page.
        let fetches = selected.iter().map(|source| {
            let limit = if multi && source.platform() != Platform::Local {
                req.limit / 2
            } else {
                req.limit
            };
            let query = SourceQuery {
                text: req.query.clone(),
                mod_loader: req.mod_loader,
                game_version: req.game_version.clone(),
                sort: req.sort,
                limit,
                offset: req.offset,
            };
            let source = Arc::clone(source);
            async move { (source.platform(), source.search(&query).await) }
        });

        // join_all keeps selection order, so merge input order never depends
        // on fetch completion order.
        let results = join_all(fetches).await;

        let mut hits: Vec<CatalogEntry> = Vec::new();
        let mut total_hits: i64 = 0;
        for (platform, result) in results {
            match result {
                Ok(page) => {
                    total_hits += page.total;
                    hits.extend(page.records.iter().map(normalize));
                }
                Err(cause) if multi => {
                    warn!(source = %platform, error = %cause, "source failed; contributing no results");
                }
                Err(cause) => {
                    return Err(CatalogError::SourceUnavailable { platform, cause });
                }
            }
        }

        if multi {
            sort_entries(&mut hits, req.sort);
        }
        hits.truncate(req.limit as usize);

        Ok(SearchResponse {
            hits,
            total_hits,
            offset: req.offset,
            limit: req.limit,
            cached: false,
        })
    }
}

/// Stable descending sort; ties keep concatenation order.
pub(crate) fn sort_entries(entries: &mut [CatalogEntry], sort: SortKey) {
    entries.sort_by(|a, b| match sort {
        SortKey::Downloads => b.downloads.cmp(&a.downloads),
        SortKey::Follows => b.follows.cmp(&a.follows),
        SortKey::Updated | SortKey::Created => b.last_modified.cmp(&a.last_modified),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::modrinth::ModrinthHit;
    use crate::sources::{RawRecord, SourcePage};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSource {
        platform: Platform,
        page: Result<SourcePage, String>,
        seen_limits: Mutex<Vec<u32>>,
    }

    impl FakeSource {
        fn ok(platform: Platform, downloads: &[i64], total: i64) -> Arc<Self> {
            let records = downloads
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    RawRecord::Modrinth(ModrinthHit {
                        project_id: format!("{platform}-{i}"),
                        title: format!("{platform} pack {i}"),
                        downloads: *d,
                        ..ModrinthHit::default()
                    })
                })
                .collect();
            Arc::new(Self {
                platform,
                page: Ok(SourcePage { records, total }),
                seen_limits: Mutex::new(Vec::new()),
            })
        }

        fn failing(platform: Platform) -> Arc<Self> {
            Arc::new(Self {
                platform,
                page: Err("connection refused".into()),
                seen_limits: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CatalogSource for FakeSource {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn search(&self, query: &SourceQuery) -> Result<SourcePage> {
            self.seen_limits.lock().unwrap().push(query.limit);
            self.page.clone().map_err(|e| anyhow!(e))
        }

        async fn page(&self, _page_size: u32, _offset: u32) -> Result<SourcePage> {
            self.page.clone().map_err(|e| anyhow!(e))
        }
    }

    fn request(scope: SearchScope, limit: u32) -> SearchRequest {
        SearchRequest {
            query: "skyblock".into(),
            scope,
            mod_loader: None,
            game_version: None,
            sort: SortKey::Downloads,
            limit,
            offset: 0,
        }
    }

    fn aggregator(sources: Vec<Arc<FakeSource>>) -> Aggregator {
        Aggregator::new(
            sources
                .into_iter()
                .map(|s| s as Arc<dyn CatalogSource>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn merges_sorts_and_sums_totals() {
        let local = FakeSource::ok(Platform::Local, &[50, 10], 4);
        let modrinth = FakeSource::ok(Platform::Modrinth, &[100, 5], 812);
        let curse = FakeSource::ok(Platform::CurseForge, &[70], 390);
        let agg = aggregator(vec![local, modrinth, curse]);

        let resp = agg.search(&request(SearchScope::All, 20)).await.unwrap();
        assert_eq!(resp.total_hits, 4 + 812 + 390);
        let downloads: Vec<i64> = resp.hits.iter().map(|h| h.downloads).collect();
        assert_eq!(downloads, vec![100, 70, 50, 10, 5]);
    }

    #[tokio::test]
    async fn limit_splits_across_remote_sources() {
        let local = FakeSource::ok(Platform::Local, &[], 0);
        let modrinth = FakeSource::ok(Platform::Modrinth, &[], 0);
        let curse = FakeSource::ok(Platform::CurseForge, &[], 0);
        let agg = aggregator(vec![local.clone(), modrinth.clone(), curse.clone()]);

        agg.search(&request(SearchScope::All, 20)).await.unwrap();
        assert_eq!(*local.seen_limits.lock().unwrap(), vec![20]);
        assert_eq!(*modrinth.seen_limits.lock().unwrap(), vec![10]);
        assert_eq!(*curse.seen_limits.lock().unwrap(), vec![10]);
    }

    #[tokio::test]
    async fn pinned_scope_gets_full_limit_and_source_order() {
        let modrinth = FakeSource::ok(Platform::Modrinth, &[5, 100], 2);
        let agg = aggregator(vec![
            FakeSource::ok(Platform::Local, &[999], 1),
            modrinth.clone(),
        ]);

        let resp = agg
            .search(&request(SearchScope::One(Platform::Modrinth), 20))
            .await
            .unwrap();
        assert_eq!(*modrinth.seen_limits.lock().unwrap(), vec![20]);
        // Single source: its own ordering is trusted, not re-sorted.
        let downloads: Vec<i64> = resp.hits.iter().map(|h| h.downloads).collect();
        assert_eq!(downloads, vec![5, 100]);
        assert_eq!(resp.total_hits, 2);
    }

    #[tokio::test]
    async fn failing_source_degrades_under_all() {
        let local = FakeSource::ok(Platform::Local, &[50], 1);
        let modrinth = FakeSource::failing(Platform::Modrinth);
        let curse = FakeSource::ok(Platform::CurseForge, &[70], 390);
        let agg = aggregator(vec![local, modrinth, curse]);

        let resp = agg.search(&request(SearchScope::All, 20)).await.unwrap();
        assert_eq!(resp.total_hits, 1 + 390);
        assert_eq!(resp.hits.len(), 2);
    }

    #[tokio::test]
    async fn all_sources_failing_is_empty_not_an_error() {
        let agg = aggregator(vec![
            FakeSource::failing(Platform::Local),
            FakeSource::failing(Platform::Modrinth),
            FakeSource::failing(Platform::CurseForge),
        ]);
        let resp = agg.search(&request(SearchScope::All, 20)).await.unwrap();
        assert!(resp.hits.is_empty());
        assert_eq!(resp.total_hits, 0);
    }

    #[tokio::test]
    async fn pinned_failing_source_is_the_operations_failure() {
        let agg = aggregator(vec![
            FakeSource::ok(Platform::Local, &[1], 1),
            FakeSource::failing(Platform::Modrinth),
        ]);
        let err = agg
            .search(&request(SearchScope::One(Platform::Modrinth), 20))
            .await
            .unwrap_err();
        match err {
            CatalogError::SourceUnavailable { platform, .. } => {
                assert_eq!(platform, Platform::Modrinth)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn window_truncates_to_limit() {
        let local = FakeSource::ok(Platform::Local, &[9, 8, 7], 3);
        let modrinth = FakeSource::ok(Platform::Modrinth, &[6, 5], 2);
        let agg = aggregator(vec![local, modrinth]);
        let resp = agg.search(&request(SearchScope::All, 4)).await.unwrap();
        assert_eq!(resp.hits.len(), 4);
        // Totals still reflect everything the sources reported.
        assert_eq!(resp.total_hits, 5);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let mk = |id: &str, downloads: i64| CatalogEntry {
            external_id: id.into(),
            platform: Platform::Local,
            title: id.into(),
            description: String::new(),
            downloads,
            follows: 0,
            icon_url: None,
            last_modified: chrono::DateTime::UNIX_EPOCH,
            latest_game_version: None,
            author: None,
            mod_loader: None,
            categories: Vec::new(),
        };
        let mut entries = vec![mk("a", 10), mk("b", 10), mk("c", 20), mk("d", 10)];
        sort_entries(&mut entries, SortKey::Downloads);
        let ids: Vec<&str> = entries.iter().map(|e| e.external_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }
}
