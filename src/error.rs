use crate::catalog::Platform;
use thiserror::Error;

/// Failure kinds for the aggregation and sync paths.
///
/// `ItemUpsertFailed` is never returned from an operation; it exists so the
/// per-item messages recorded during a sync run are constructed (and matched)
/// one way everywhere.
#[derive(Debug, Error)]
pub enum CatalogError {
    // The platform field must not be named `source`: thiserror reserves that
    // name for the error chain and requires it to be a std::error::Error.
    #[error("{platform} unavailable: {cause}")]
    SourceUnavailable {
        platform: Platform,
        cause: anyhow::Error,
    },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(anyhow::Error),

    #[error("no items found")]
    EmptyUpstreamPage,

    #[error("Failed to sync {title}: {cause}")]
    ItemUpsertFailed { title: String, cause: String },
}
