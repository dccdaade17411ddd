//! Axum route handlers for the Prospect Log API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::prospects::log::ProspectLog;
use crate::prospects::models::ProspectRecord;
use crate::prospects::sessions::SessionId;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProspectListResponse {
    pub session_id: String,
    pub count: usize,
    pub records: Vec<ProspectRecord>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
    pub warnings: Vec<String>,
}

/// GET /api/v1/prospects
pub async fn handle_list(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<ProspectListResponse>, AppError> {
    let records = match state.sessions.existing(&session).await {
        Some(log) => {
            let log = log.lock().await;
            log.records().to_vec()
        }
        None => Vec::new(),
    };
    Ok(Json(ProspectListResponse {
        session_id: session.as_str().to_string(),
        count: records.len(),
        records,
    }))
}

/// DELETE /api/v1/prospects
///
/// Destructive and immediate. Confirmation is the caller's concern.
pub async fn handle_clear(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<ClearResponse>, AppError> {
    let cleared = state.sessions.clear(&session).await;
    info!(
        "Cleared {} prospects for session '{}'",
        cleared.count,
        session.as_str()
    );

    Ok(Json(ClearResponse {
        cleared: cleared.count,
        warnings: cleared.outcome.warning().into_iter().collect(),
    }))
}

/// GET /api/v1/prospects/export.csv
pub async fn handle_export_csv(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Response, AppError> {
    let body = match state.sessions.existing(&session).await {
        Some(log) => {
            let log = log.lock().await;
            log.export_csv()
        }
        None => ProspectLog::in_memory().export_csv(),
    }
    .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV export failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"prospects.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /api/v1/prospects/export.json
pub async fn handle_export_json(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Response, AppError> {
    let body = match state.sessions.existing(&session).await {
        Some(log) => {
            let log = log.lock().await;
            log.export_json()
        }
        None => ProspectLog::in_memory().export_json(),
    }
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON export failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"prospects.json\"",
            ),
        ],
        body,
    )
        .into_response())
}
