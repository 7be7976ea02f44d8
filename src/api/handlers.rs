// HTTP request handlers for API endpoints

use crate::aggregator::SearchResponse;
use crate::api::models::{HealthResponse, SearchParams, SyncParams, SyncResponse};
use crate::api::AppState;
use crate::catalog::Platform;
use crate::error::CatalogError;
use crate::store::platforms;
use crate::sync;
use actix_web::{web, HttpResponse, Result};

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&state.db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
    }))
}

/// Federated modpack search across the local store and upstream catalogs.
pub async fn search(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let key = params.cache_key();
    if let Some(raw) = state.cache.get(&key).await {
        // Cache payloads are written by us; a parse failure just means we
        // treat it as a miss.
        if let Ok(mut cached) = serde_json::from_str::<SearchResponse>(&raw) {
            cached.cached = true;
            return Ok(HttpResponse::Ok().json(cached));
        }
    }

    let request = params.to_request();
    match state.aggregator.search(&request).await {
        Ok(response) => {
            if let Ok(raw) = serde_json::to_string(&response) {
                state.cache.put(key, raw).await;
            }
            Ok(HttpResponse::Ok().json(response))
        }
        Err(err @ CatalogError::SourceUnavailable { .. }) => Ok(HttpResponse::BadGateway()
            .json(serde_json::json!({ "error": err.to_string() }))),
        Err(err) => Ok(HttpResponse::InternalServerError()
            .json(serde_json::json!({ "error": err.to_string() }))),
    }
}

/// Trigger one reconciliation run for an upstream platform.
pub async fn trigger_sync(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<SyncParams>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let platform = match slug.to_ascii_lowercase().as_str() {
        "modrinth" => Platform::Modrinth,
        "curseforge" => Platform::CurseForge,
        _ => {
            return Ok(HttpResponse::BadRequest().json(SyncResponse::failure(
                &slug,
                format!("unknown sync platform: {slug}"),
                None,
            )));
        }
    };

    let Some(source) = state
        .remotes
        .iter()
        .find(|s| s.platform() == platform)
    else {
        return Ok(HttpResponse::BadRequest().json(SyncResponse::failure(
            platform.display_name(),
            "source not configured".to_string(),
            None,
        )));
    };

    tracing::info!(platform = %platform, page_size = params.page_size, "sync requested");

    match sync::reconcile(&state.db, source.as_ref(), params.page_size).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(SyncResponse::from_outcome(outcome))),
        Err(CatalogError::EmptyUpstreamPage) => Ok(HttpResponse::Ok().json(
            SyncResponse::failure(platform.display_name(), "no items found".to_string(), None),
        )),
        Err(err @ CatalogError::SourceUnavailable { .. }) => {
            Ok(HttpResponse::BadGateway().json(SyncResponse::failure(
                platform.display_name(),
                err.to_string(),
                Some(format!("{err:?}")),
            )))
        }
        Err(err) => Ok(HttpResponse::InternalServerError().json(SyncResponse::failure(
            platform.display_name(),
            err.to_string(),
            Some(format!("{err:?}")),
        ))),
    }
}

/// Registered platform records with their modpack counts.
pub async fn list_platforms(state: web::Data<AppState>) -> Result<HttpResponse> {
    match platforms::list_platforms(&state.db).await {
        Ok(rows) => Ok(HttpResponse::Ok().json(rows)),
        Err(err) => {
            tracing::error!(error = %err, "platform listing failed");
            Ok(HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "could not list platforms" })))
        }
    }
}
