//! Reconciliation: pull one page of upstream listings and upsert each item
//! into the local store, keyed by `(platform_id, external_id)`.

use crate::catalog::normalize::normalize;
use crate::catalog::CatalogEntry;
use crate::error::CatalogError;
use crate::sources::CatalogSource;
use crate::store::platforms::PlatformRecord;
use crate::store::{modpacks, platforms, Db};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// The two writes reconciliation performs, as a seam over the store.
#[async_trait]
pub trait SyncStore: Send + Sync {
    async fn ensure_platform(&self, name: &str, base_url: &str) -> Result<PlatformRecord>;

    async fn upsert_modpack(&self, platform_id: i64, entry: &CatalogEntry) -> Result<()>;
}

#[async_trait]
impl SyncStore for Db {
    async fn ensure_platform(&self, name: &str, base_url: &str) -> Result<PlatformRecord> {
        platforms::ensure_platform(self, name, base_url).await
    }

    async fn upsert_modpack(&self, platform_id: i64, entry: &CatalogEntry) -> Result<()> {
        modpacks::upsert_modpack(self, platform_id, entry).await
    }
}

/// Structured report of one reconciliation run. Ephemeral, returned to the
/// caller only.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub total_attempted: usize,
    pub per_item_errors: Vec<String>,
    pub platform_name: String,
    pub completed_at: DateTime<Utc>,
}

/// Outcome of one item's upsert, in processing order.
#[derive(Debug, Clone)]
pub struct ItemResult {
    pub title: String,
    pub error: Option<String>,
}

/// Fold per-item results into the final accounting. Pure so the
/// partial-failure contract stays testable without a store.
pub fn tally(platform_name: &str, results: &[ItemResult]) -> SyncOutcome {
    let per_item_errors: Vec<String> = results
        .iter()
        .filter_map(|r| {
            r.error.as_ref().map(|cause| {
                CatalogError::ItemUpsertFailed {
                    title: r.title.clone(),
                    cause: cause.clone(),
                }
                .to_string()
            })
        })
        .collect();
    let failed = per_item_errors.len();
    SyncOutcome {
        succeeded: results.len() - failed,
        failed,
        total_attempted: results.len(),
        per_item_errors,
        platform_name: platform_name.to_string(),
        completed_at: Utc::now(),
    }
}

/// One reconciliation run against `source`.
///
/// Fatal (no partial outcome): platform upsert failure, page fetch failure,
/// or an empty upstream page. Per-item upsert failures are recorded and the
/// batch continues. Items are processed strictly sequentially so write
/// concurrency against one upsert key is bounded and the error list follows
/// processing order.
#[instrument(skip(store, source), fields(platform = %source.platform()))]
pub async fn reconcile(
    store: &dyn SyncStore,
    source: &dyn CatalogSource,
    page_size: u32,
) -> Result<SyncOutcome, CatalogError> {
    let platform = source.platform();
    let record = store
        .ensure_platform(platform.display_name(), platform.site_url())
        .await
        .map_err(CatalogError::StorageUnavailable)?;

    let page = source
        .page(page_size, 0)
        .await
        .map_err(|cause| CatalogError::SourceUnavailable { platform, cause })?;
    if page.records.is_empty() {
        return Err(CatalogError::EmptyUpstreamPage);
    }

    info!(total = page.total, fetched = page.records.len(), "reconciling page");

    let mut results = Vec::with_capacity(page.records.len());
    for raw in &page.records {
        let entry = normalize(raw);
        let error = match store.upsert_modpack(record.id, &entry).await {
            Ok(()) => None,
            Err(cause) => {
                warn!(title = %entry.title, error = %cause, "item upsert failed; continuing");
                Some(cause.to_string())
            }
        };
        results.push(ItemResult {
            title: entry.title,
            error,
        });
    }

    let outcome = tally(&record.name, &results);
    info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        "sync complete"
    );
    Ok(outcome)
}
