// HTTP API for the modpack index: federated search, sync triggers, status.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

use crate::aggregator::Aggregator;
use crate::cache::SearchCache;
use crate::sources::CatalogSource;
use crate::store::Db;
use std::sync::Arc;

pub use server::ApiServer;

/// Shared handler state. Adapters and the aggregator are constructed once at
/// startup and injected here; nothing is ambient.
pub struct AppState {
    pub db: Db,
    pub aggregator: Aggregator,
    pub cache: SearchCache,
    /// Upstream sources eligible for sync (the local store is not among them).
    pub remotes: Vec<Arc<dyn CatalogSource>>,
}
