pub mod curseforge;
pub mod local;
pub mod modrinth;

use crate::catalog::{ModLoader, Platform, SortKey};
use crate::store::modpacks::ModpackRow;
use anyhow::Result;
use async_trait::async_trait;
use curseforge::CurseForgeMod;
use modrinth::ModrinthHit;

/// Truncate an upstream error body to at most `max_len` bytes for logging.
/// The cut is floored to a char boundary; upstream bodies are arbitrary UTF-8
/// and `String::truncate` panics mid-character.
pub(crate) fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

/// One raw record as a source reported it, before normalization.
///
/// Keeping this an explicit tagged union (rather than loosely typed JSON)
/// means nothing downstream of the adapters ever touches a source-specific
/// shape without going through `catalog::normalize`.
#[derive(Debug, Clone)]
pub enum RawRecord {
    Local(ModpackRow),
    Modrinth(ModrinthHit),
    CurseForge(CurseForgeMod),
}

/// Normalized query handed to every source. Each adapter translates it into
/// its own request vocabulary (ILIKE filters, facets, query params).
#[derive(Debug, Clone)]
pub struct SourceQuery {
    pub text: String,
    pub mod_loader: Option<ModLoader>,
    pub game_version: Option<String>,
    pub sort: SortKey,
    pub limit: u32,
    pub offset: u32,
}

/// One page of raw records plus the source-reported total, which may be far
/// larger than the page itself.
#[derive(Debug, Clone, Default)]
pub struct SourcePage {
    pub records: Vec<RawRecord>,
    pub total: i64,
}

/// A queryable modpack catalog: the local store or one of the upstream APIs.
///
/// `search` serves the federated search path, `page` serves reconciliation
/// (download-count descending, so growing page sizes are monotonic supersets).
/// Implementations fail with a transport-level error on non-success status;
/// callers decide whether that failure is fatal.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn search(&self, query: &SourceQuery) -> Result<SourcePage>;

    async fn page(&self, page_size: u32, offset: u32) -> Result<SourcePage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_pass_through_untouched() {
        assert_eq!(truncate_for_log("not found".into(), 2000), "not found");
    }

    #[test]
    fn truncation_never_splits_a_multibyte_char() {
        // 'é' is two bytes, so the 2000-byte cut lands mid-character.
        let body = format!("a{}", "é".repeat(1000));
        let out = truncate_for_log(body, 2000);
        assert!(out.ends_with('…'));
        // Floored to the previous boundary, one byte short of the cap.
        assert_eq!(out.trim_end_matches('…').len(), 1999);
    }

    #[test]
    fn ascii_truncation_cuts_at_the_cap() {
        let out = truncate_for_log("x".repeat(3000), 2000);
        assert_eq!(out.trim_end_matches('…').len(), 2000);
    }
}
