use crate::store::Db;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

/// Durable record for one source platform, upserted by name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlatformRecord {
    pub id: i64,
    pub name: String,
    pub base_url: String,
    pub updated_at: DateTime<Utc>,
}

/// Platform record plus how many modpacks reference it (status endpoint).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlatformSummary {
    pub id: i64,
    pub name: String,
    pub base_url: String,
    pub updated_at: DateTime<Utc>,
    pub modpack_count: i64,
}

/// Create-or-refresh the platform record for `name`. Every call, including
/// the first, refreshes `base_url` and `updated_at`.
#[instrument(skip(db))]
pub async fn ensure_platform(db: &Db, name: &str, base_url: &str) -> Result<PlatformRecord> {
    let record = sqlx::query_as::<_, PlatformRecord>(
        "INSERT INTO platforms (name, base_url, created_at, updated_at) \
         VALUES ($1, $2, now(), now()) \
         ON CONFLICT (name) DO UPDATE SET \
             base_url = EXCLUDED.base_url, \
             updated_at = now() \
         RETURNING id, name, base_url, updated_at",
    )
    .bind(name)
    .bind(base_url)
    .fetch_one(&db.pool)
    .await?;
    Ok(record)
}

pub async fn list_platforms(db: &Db) -> Result<Vec<PlatformSummary>> {
    let rows = sqlx::query_as::<_, PlatformSummary>(
        "SELECT p.id, p.name, p.base_url, p.updated_at, \
                COUNT(m.id) AS modpack_count \
         FROM platforms p \
         LEFT JOIN modpacks m ON m.platform_id = p.id \
         GROUP BY p.id, p.name, p.base_url, p.updated_at \
         ORDER BY p.name",
    )
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}
