//! Document API route handlers.
//!
//! - `GET    /api/documents`          - list stored paths
//! - `GET    /api/documents/{*path}`  - read a document
//! - `PUT    /api/documents/{*path}`  - replace a document
//! - `PATCH  /api/documents/{*path}`  - merge fields (`null` removes)
//! - `DELETE /api/documents/{*path}`  - delete a document

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use showreel_core::DocumentSnapshot;

use crate::metrics::{record_document_write, record_validation_failure};
use crate::validation::{validate_document, validate_document_path, ValidationError};
use crate::AppState;

/// Errors returned by the document API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Path or body failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        };
        let body = serde_json::json!({
            "code": code,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Document as returned over HTTP.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// Document path.
    pub path: String,
    /// Document fields.
    pub data: Map<String, Value>,
}

impl DocumentResponse {
    fn from_snapshot(snapshot: DocumentSnapshot) -> Self {
        Self {
            path: snapshot.path,
            data: snapshot.data.unwrap_or_default(),
        }
    }
}

/// List of stored paths.
#[derive(Debug, Serialize)]
pub struct DocumentList {
    /// Sorted document paths.
    pub paths: Vec<String>,
}

fn checked_path(path: &str) -> Result<(), ApiError> {
    validate_document_path(path).map_err(|e| {
        record_validation_failure(e.kind());
        ApiError::from(e)
    })
}

fn checked_body(data: &Map<String, Value>) -> Result<(), ApiError> {
    validate_document(data).map_err(|e| {
        record_validation_failure(e.kind());
        ApiError::from(e)
    })
}

/// List stored document paths.
#[tracing::instrument(name = "list_documents", skip(state))]
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentList> {
    Json(DocumentList {
        paths: state.store.paths(),
    })
}

/// Read a document.
#[tracing::instrument(name = "get_document", skip(state))]
pub async fn get_document(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<DocumentResponse>, ApiError> {
    checked_path(&path)?;
    let data = state
        .store
        .get(&path)
        .ok_or_else(|| ApiError::NotFound(path.clone()))?;
    Ok(Json(DocumentResponse { path, data }))
}

/// Replace a document.
#[tracing::instrument(name = "put_document", skip(state, data))]
pub async fn put_document(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(data): Json<Map<String, Value>>,
) -> Result<Json<DocumentResponse>, ApiError> {
    checked_path(&path)?;
    checked_body(&data)?;
    let snapshot = state.store.set(&path, data);
    record_document_write("set");
    tracing::debug!("Document {} replaced", path);
    Ok(Json(DocumentResponse::from_snapshot(snapshot)))
}

/// Merge fields into a document.
#[tracing::instrument(name = "patch_document", skip(state, patch))]
pub async fn patch_document(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<DocumentResponse>, ApiError> {
    checked_path(&path)?;
    let snapshot = state.store.merge(&path, patch).map_err(|e| {
        record_validation_failure(e.kind());
        ApiError::from(e)
    })?;
    record_document_write("merge");
    tracing::debug!("Document {} merged", path);
    Ok(Json(DocumentResponse::from_snapshot(snapshot)))
}

/// Delete a document.
#[tracing::instrument(name = "delete_document", skip(state))]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<StatusCode, ApiError> {
    checked_path(&path)?;
    if !state.store.delete(&path) {
        return Err(ApiError::NotFound(path));
    }
    record_document_write("delete");
    Ok(StatusCode::NO_CONTENT)
}
