use crate::catalog::{CatalogEntry, ModLoader, SortKey};
use crate::store::Db;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;

/// One durable modpack row, keyed by `(platform_id, external_id)`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModpackRow {
    pub id: i64,
    pub platform_id: i64,
    pub external_id: String,
    pub name: String,
    pub description: Option<String>,
    pub download_count: i64,
    pub follow_count: i64,
    pub icon_url: Option<String>,
    pub author: Option<String>,
    pub mod_loader: Option<String>,
    pub minecraft_version: Option<String>,
    pub version: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter terms the local store understands. Free text matches name,
/// description, and author case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    pub query: String,
    pub mod_loader: Option<ModLoader>,
    pub game_version: Option<String>,
}

const SELECT_COLUMNS: &str = "SELECT id, platform_id, external_id, name, description, \
     download_count, follow_count, icon_url, author, mod_loader, \
     minecraft_version, version, last_updated, created_at, updated_at \
     FROM modpacks WHERE 1=1";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &StoreFilter) {
    if !filter.query.is_empty() {
        let pattern = format!("%{}%", filter.query);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR author ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(loader) = filter.mod_loader {
        qb.push(" AND lower(mod_loader) = ").push_bind(loader.as_str());
    }
    if let Some(version) = filter.game_version.as_deref() {
        qb.push(" AND minecraft_version LIKE ")
            .push_bind(format!("%{version}%"));
    }
}

fn sort_column(sort: SortKey) -> &'static str {
    match sort {
        SortKey::Downloads => "download_count",
        SortKey::Follows => "follow_count",
        SortKey::Updated => "last_updated",
        SortKey::Created => "created_at",
    }
}

/// Filtered, sorted, paginated page of rows plus the unpaginated match count.
#[instrument(skip(db, filter))]
pub async fn query_modpacks(
    db: &Db,
    filter: &StoreFilter,
    sort: SortKey,
    limit: u32,
    offset: u32,
) -> Result<(Vec<ModpackRow>, i64)> {
    let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(SELECT_COLUMNS);
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY ")
        .push(sort_column(sort))
        .push(" DESC NULLS LAST LIMIT ")
        .push_bind(i64::from(limit))
        .push(" OFFSET ")
        .push_bind(i64::from(offset));
    let rows: Vec<ModpackRow> = qb.build_query_as().fetch_all(&db.pool).await?;

    let mut count_qb: QueryBuilder<'_, Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM modpacks WHERE 1=1");
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(&db.pool).await?;

    Ok((rows, total))
}

/// Idempotent create-or-update keyed by `(platform_id, external_id)`.
/// Postgres guarantees per-key atomicity of the ON CONFLICT upsert, which is
/// the only write-concurrency guarantee the sync path relies on.
#[instrument(skip(db, entry), fields(external_id = %entry.external_id))]
pub async fn upsert_modpack(db: &Db, platform_id: i64, entry: &CatalogEntry) -> Result<()> {
    sqlx::query(
        "INSERT INTO modpacks (platform_id, external_id, name, description, \
             download_count, follow_count, icon_url, author, mod_loader, \
             minecraft_version, last_updated, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now(), now()) \
         ON CONFLICT (platform_id, external_id) DO UPDATE SET \
             name = EXCLUDED.name, \
             description = EXCLUDED.description, \
             download_count = EXCLUDED.download_count, \
             follow_count = EXCLUDED.follow_count, \
             icon_url = EXCLUDED.icon_url, \
             author = EXCLUDED.author, \
             mod_loader = EXCLUDED.mod_loader, \
             minecraft_version = EXCLUDED.minecraft_version, \
             last_updated = EXCLUDED.last_updated, \
             updated_at = now()",
    )
    .bind(platform_id)
    .bind(&entry.external_id)
    .bind(&entry.title)
    .bind(&entry.description)
    .bind(entry.downloads)
    .bind(entry.follows)
    .bind(entry.icon_url.as_deref())
    .bind(entry.author.as_deref())
    .bind(entry.mod_loader.map(|l| l.as_str()))
    .bind(entry.latest_game_version.as_deref())
    .bind(entry.last_modified)
    .execute(&db.pool)
    .await?;
    Ok(())
}
