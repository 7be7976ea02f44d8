use crate::catalog::{Platform, SortKey};
use crate::sources::{CatalogSource, RawRecord, SourcePage, SourceQuery};
use crate::store::modpacks::{self, StoreFilter};
use crate::store::Db;
use anyhow::Result;
use async_trait::async_trait;

/// The durable store exposed through the same seam as the upstream APIs, so
/// the aggregator fans out to all three sources uniformly.
#[derive(Clone)]
pub struct LocalSource {
    db: Db,
}

impl LocalSource {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogSource for LocalSource {
    fn platform(&self) -> Platform {
        Platform::Local
    }

    async fn search(&self, query: &SourceQuery) -> Result<SourcePage> {
        let filter = StoreFilter {
            query: query.text.clone(),
            mod_loader: query.mod_loader,
            game_version: query.game_version.clone(),
        };
        let (rows, total) =
            modpacks::query_modpacks(&self.db, &filter, query.sort, query.limit, query.offset)
                .await?;
        Ok(SourcePage {
            records: rows.into_iter().map(RawRecord::Local).collect(),
            total,
        })
    }

    async fn page(&self, page_size: u32, offset: u32) -> Result<SourcePage> {
        let (rows, total) = modpacks::query_modpacks(
            &self.db,
            &StoreFilter::default(),
            SortKey::Downloads,
            page_size,
            offset,
        )
        .await?;
        Ok(SourcePage {
            records: rows.into_iter().map(RawRecord::Local).collect(),
            total,
        })
    }
}
