use crate::config::FrontendConfig;
use crate::frontend::{handlers, FrontendState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the frontend gateway router
pub fn build_frontend_router(state: FrontendState, config: &FrontendConfig) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Forwarded to the backend
        .route("/get", get(handlers::get_documents))
        .route("/insert/:text", post(handlers::insert_document))
        .route("/check-backend", get(handlers::check_backend))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
