// HTTP API server binary for modpack-index

use anyhow::Result;
use modpack_index::aggregator::Aggregator;
use modpack_index::api::{ApiServer, AppState};
use modpack_index::cache::SearchCache;
use modpack_index::sources::curseforge::CurseForgeSource;
use modpack_index::sources::local::LocalSource;
use modpack_index::sources::modrinth::ModrinthSource;
use modpack_index::sources::CatalogSource;
use modpack_index::store::Db;
use modpack_index::util::env as env_util;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    tracing::info!("Initializing modpack-index API server");

    env_util::init_env();
    let server = ApiServer::from_env()?;

    let database_url = env_util::db_url()?;
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    let db = Db::connect(&database_url, max_connections).await?;

    let modrinth = Arc::new(ModrinthSource::new(
        env_util::env_opt("MODRINTH_BASE_URL").as_deref(),
        None,
    )?);
    let curseforge = Arc::new(CurseForgeSource::new(
        env_util::env_opt("CURSEFORGE_BASE_URL").as_deref(),
        env_util::env_opt("CURSEFORGE_API_KEY"),
        None,
    )?);
    let local = Arc::new(LocalSource::new(db.clone()));

    // Fixed source order: local store first, then the upstream catalogs.
    // This order is also the tie-break order for merged search results.
    let sources: Vec<Arc<dyn CatalogSource>> =
        vec![local, modrinth.clone(), curseforge.clone()];
    let remotes: Vec<Arc<dyn CatalogSource>> = vec![modrinth, curseforge];

    let state = AppState {
        db,
        aggregator: Aggregator::new(sources),
        cache: SearchCache::new(env_util::env_parse("SEARCH_CACHE_TTL_SECS", 3600u64)),
        remotes,
    };

    server.run(state).await
}
