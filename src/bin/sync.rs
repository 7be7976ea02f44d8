// CLI sync runner: reconcile upstream modpack catalogs into the local store.

use anyhow::{bail, Result};
use clap::Parser;
use modpack_index::sources::curseforge::CurseForgeSource;
use modpack_index::sources::modrinth::ModrinthSource;
use modpack_index::sources::CatalogSource;
use modpack_index::store::Db;
use modpack_index::sync::reconcile;
use modpack_index::util::env as env_util;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "sync", about = "Reconcile upstream modpack catalogs into the local store")]
struct Args {
    /// Platform to sync: modrinth, curseforge, or all
    #[arg(long, default_value = "all")]
    platform: String,

    /// Upstream page size (one page per run, download-count descending)
    #[arg(long, default_value_t = 100)]
    page_size: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let args = Args::parse();
    env_util::init_env();

    let database_url = env_util::db_url()?;
    let db = Db::connect(&database_url, env_util::env_parse("DB_MAX_CONNS", 5u32)).await?;

    let modrinth: Arc<dyn CatalogSource> = Arc::new(ModrinthSource::new(
        env_util::env_opt("MODRINTH_BASE_URL").as_deref(),
        None,
    )?);
    let curseforge: Arc<dyn CatalogSource> = Arc::new(CurseForgeSource::new(
        env_util::env_opt("CURSEFORGE_BASE_URL").as_deref(),
        env_util::env_opt("CURSEFORGE_API_KEY"),
        None,
    )?);

    let targets: Vec<Arc<dyn CatalogSource>> = match args.platform.to_ascii_lowercase().as_str() {
        "modrinth" => vec![modrinth],
        "curseforge" => vec![curseforge],
        "all" => vec![modrinth, curseforge],
        other => bail!("unknown platform: {other} (expected modrinth, curseforge, or all)"),
    };

    let mut fatal_failures = 0usize;
    for source in &targets {
        match reconcile(&db, source.as_ref(), args.page_size).await {
            Ok(outcome) => {
                info!(
                    platform = %outcome.platform_name,
                    succeeded = outcome.succeeded,
                    failed = outcome.failed,
                    total = outcome.total_attempted,
                    "sync finished"
                );
                for message in &outcome.per_item_errors {
                    warn!("{message}");
                }
            }
            Err(err) => {
                error!(platform = %source.platform(), error = %err, "sync failed");
                fatal_failures += 1;
            }
        }
    }

    if fatal_failures > 0 {
        bail!("{fatal_failures} platform(s) failed to sync");
    }
    Ok(())
}
