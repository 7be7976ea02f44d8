//! Total normalization of source-specific raw records into `CatalogEntry`.
//!
//! These functions never fail: missing numerics become 0, missing strings
//! become empty, unmapped loader codes become `None`, and unparseable
//! timestamps fall back to a defined default, so one malformed record can
//! never abort a search merge or a sync batch.

use crate::catalog::{CatalogEntry, ModLoader, Platform};
use crate::sources::curseforge::CurseForgeMod;
use crate::sources::modrinth::ModrinthHit;
use crate::sources::RawRecord;
use crate::store::modpacks::ModpackRow;
use chrono::{DateTime, Utc};

pub fn normalize(raw: &RawRecord) -> CatalogEntry {
    match raw {
        RawRecord::Local(row) => normalize_local(row),
        RawRecord::Modrinth(hit) => normalize_modrinth(hit),
        RawRecord::CurseForge(m) => normalize_curseforge(m),
    }
}

/// Lenient timestamp parse. An absent or malformed upstream date degrades to
/// the Unix epoch, which sorts such records last under every date sort.
fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn normalize_local(row: &ModpackRow) -> CatalogEntry {
    CatalogEntry {
        external_id: row.external_id.clone(),
        platform: Platform::Local,
        title: row.name.clone(),
        description: row.description.clone().unwrap_or_default(),
        downloads: row.download_count.max(0),
        follows: row.follow_count.max(0),
        icon_url: row.icon_url.clone(),
        // Stored rows fall back to their own row-update timestamp.
        last_modified: row.last_updated.unwrap_or(row.updated_at),
        latest_game_version: row.minecraft_version.clone(),
        author: row.author.clone(),
        mod_loader: row.mod_loader.as_deref().and_then(ModLoader::from_name),
        categories: Vec::new(),
    }
}

fn normalize_modrinth(hit: &ModrinthHit) -> CatalogEntry {
    CatalogEntry {
        external_id: hit.project_id.clone(),
        platform: Platform::Modrinth,
        title: hit.title.clone(),
        description: hit.description.clone(),
        downloads: hit.downloads.max(0),
        follows: hit.follows.max(0),
        icon_url: hit.icon_url.clone(),
        last_modified: parse_timestamp(hit.date_modified.as_deref()),
        latest_game_version: hit.latest_version.clone(),
        author: hit.author.clone(),
        mod_loader: hit.loaders.iter().find_map(|l| ModLoader::from_name(l)),
        categories: hit.categories.clone(),
    }
}

fn normalize_curseforge(m: &CurseForgeMod) -> CatalogEntry {
    let first_index = m.latest_files_indexes.first();
    CatalogEntry {
        external_id: m.id.to_string(),
        platform: Platform::CurseForge,
        title: m.name.clone(),
        description: m.summary.clone(),
        downloads: (m.download_count.max(0.0)) as i64,
        // CurseForge has no follow count; thumbs-up is the closest analogue.
        follows: m.thumbs_up_count.max(0),
        icon_url: m
            .logo
            .as_ref()
            .and_then(|l| l.thumbnail_url.clone().or_else(|| l.url.clone())),
        last_modified: parse_timestamp(m.date_modified.as_deref()),
        latest_game_version: first_index
            .map(|i| i.game_version.clone())
            .filter(|v| !v.is_empty()),
        author: m.authors.first().map(|a| a.name.clone()),
        mod_loader: first_index
            .and_then(|i| i.mod_loader)
            .and_then(ModLoader::from_code),
        categories: m.categories.iter().map(|c| c.name.clone()).collect(),
    }
}
