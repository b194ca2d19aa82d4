use crate::error::Result;
use crate::frontend::{FrontendState, ProbeReport};
use crate::models::{FetchOutcome, InsertReceipt};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const INDEX_PAGE: &str = "/static/index.html";

/// `/` sends browsers to the UI page
pub async fn root() -> Redirect {
    Redirect::temporary(INDEX_PAGE)
}

pub async fn health_check() -> Json<crate::api::handlers::HealthResponse> {
    crate::api::handlers::health_check().await
}

#[derive(Debug, Deserialize)]
pub struct FetchQuery {
    pub query: Option<String>,
}

/// Forward `/get`. On backend failure the body is still the message shape,
/// empty and carrying `error`, with a 502 status.
pub async fn get_documents(
    State(state): State<FrontendState>,
    Query(params): Query<FetchQuery>,
) -> (StatusCode, Json<FetchOutcome>) {
    let outcome = state.backend.fetch_documents(params.query.as_deref()).await;
    let status = if outcome.is_error() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    (status, Json(outcome))
}

/// Forward an insert; errors surface as `{error, code, status}`
pub async fn insert_document(
    State(state): State<FrontendState>,
    Path(text): Path<String>,
) -> Result<(StatusCode, Json<InsertReceipt>)> {
    let receipt = state.backend.insert_via_path(&text).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Probe the backend endpoints and report each one separately
pub async fn check_backend(
    State(state): State<FrontendState>,
) -> Json<BTreeMap<String, ProbeReport>> {
    Json(state.backend.diagnose_peers().await)
}
