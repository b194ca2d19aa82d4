use crate::api::{handlers, AppState};
use crate::config::BackendConfig;
use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    BoxError, Router,
};
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the backend gateway router
pub fn build_router(state: AppState, config: &BackendConfig) -> Router {
    let static_dir = &config.static_dir;
    let timeout_secs = config.request_timeout_secs;

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/es-status", get(handlers::store_status))
        // Document CRUD
        .route(
            "/documents",
            get(handlers::list_documents).post(handlers::create_document),
        )
        .route(
            "/documents/",
            get(handlers::list_documents).post(handlers::create_document),
        )
        .route(
            "/documents/:id",
            get(handlers::get_document)
                .put(handlers::update_document)
                .delete(handlers::delete_document),
        )
        // Frontend contract
        .route("/get", get(handlers::get_messages))
        .route("/insert/:text", post(handlers::insert_by_path))
        .route("/search/", get(handlers::ranked_search))
        .route_service("/favicon.ico", ServeFile::new(static_dir.join("favicon.ico")))
        // Add state
        .with_state(state)
        // Browser UI
        .fallback_service(ServeDir::new(static_dir))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| {
                    handlers::handle_timeout(err, timeout_secs)
                }))
                .layer(TimeoutLayer::new(Duration::from_secs(timeout_secs))),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
