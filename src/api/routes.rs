// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        .service(
            web::scope("/api/v1")
                .route("/search", web::get().to(handlers::search))
                .route("/sync/{platform}", web::post().to(handlers::trigger_sync))
                .route("/platforms", web::get().to(handlers::list_platforms)),
        );
}
