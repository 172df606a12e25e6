// src/router.rs

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{config::AppState, handlers};

pub fn app(app_state: AppState) -> Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/parse_xml",
            any(handlers::documents::parse_xml).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/public_shared_link_handler",
            get(handlers::shared_links::resolve_shared_link)
                .post(handlers::shared_links::resolve_shared_link),
        )
        .route("/run_automations", any(handlers::automations::run_automations))
        .route("/run_reports", any(handlers::reports::run_reports))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
