use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::*;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    BoxError, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Search engine cluster health; 503 whenever the engine cannot answer
pub async fn store_status(State(state): State<AppState>) -> Result<Json<Value>> {
    state
        .documents
        .store_status()
        .await
        .map(Json)
        .map_err(|e| match e {
            AppError::ServiceUnavailable(msg) => AppError::ServiceUnavailable(msg),
            other => AppError::ServiceUnavailable(other.to_string()),
        })
}

/// Create a document
pub async fn create_document(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DocumentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>)> {
    let Json(input) = payload?;
    input.validate()?;

    let created = state.documents.create_document(&input.text).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a document by ID
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>> {
    let document = state.documents.read_document(&id).await?;
    Ok(Json(document))
}

/// List documents, optionally filtered by a full-text query
pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<Document>>> {
    let documents = state.documents.list_or_search(params.q.as_deref()).await?;
    Ok(Json(documents))
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub q: Option<String>,
}

/// Replace the text of a document
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<DocumentInput>, JsonRejection>,
) -> Result<Json<Document>> {
    let Json(input) = payload?;
    input.validate()?;

    let updated = state.documents.update_document(&id, &input.text).await?;
    Ok(Json(updated))
}

/// Delete a document
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmation>> {
    state.documents.delete_document(&id).await?;
    Ok(Json(DeleteConfirmation {
        message: format!("Document {} deleted", id),
    }))
}

/// `{messages: {id: {msg_id, msg_name}}}` for the frontend
pub async fn get_messages(
    State(state): State<AppState>,
    Query(params): Query<MessagesQuery>,
) -> Result<Json<MessageSet>> {
    let messages = state.documents.messages(params.query.as_deref()).await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub query: Option<String>,
}

/// Insert with the text taken from the path
pub async fn insert_by_path(
    State(state): State<AppState>,
    Path(text): Path<String>,
) -> Result<(StatusCode, Json<InsertReceipt>)> {
    let input = DocumentInput { text };
    input.validate()?;

    let document = state.documents.create_document(&input.text).await?;
    Ok((StatusCode::CREATED, Json(InsertReceipt::inserted(document))))
}

/// Hits in engine ranking order
pub async fn ranked_search(
    State(state): State<AppState>,
    Query(params): Query<MessagesQuery>,
) -> Result<Json<Vec<RankedHit>>> {
    let query = params
        .query
        .ok_or_else(|| AppError::Validation("query parameter is required".to_string()))?;
    let hits = state.documents.ranked_search(&query).await?;
    Ok(Json(hits))
}

/// Requests cut off by the timeout layer still get the JSON error body
pub async fn handle_timeout(err: BoxError, timeout_secs: u64) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout(format!("no response within {} seconds", timeout_secs))
    } else {
        AppError::ServiceUnavailable(format!("Request could not be served: {}", err))
    }
}
