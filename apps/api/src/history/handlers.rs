use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::history::HistoryEntry;
use crate::models::resume::TailoredResume;
use crate::state::AppState;

/// GET /api/v1/history
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    Ok(Json(state.store.list_history().await?))
}

/// GET /api/v1/history/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryEntry>, AppError> {
    let entry = state
        .store
        .get_history(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No saved CV with id {id}")))?;
    Ok(Json(entry))
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub job_title: Option<String>,
    pub company: Option<String>,
}

/// PATCH /api/v1/history/:id
/// Explicit user edit: rename the entry's job title and/or company.
pub async fn handle_rename(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<HistoryEntry>, AppError> {
    let job_title = req.job_title.as_deref().map(str::trim);
    let company = req.company.as_deref().map(str::trim);

    if job_title.map_or(true, str::is_empty) && company.map_or(true, str::is_empty) {
        return Err(AppError::Validation(
            "Provide a non-empty job_title and/or company".to_string(),
        ));
    }

    let renamed = state
        .store
        .rename_history(
            &id,
            job_title.filter(|t| !t.is_empty()),
            company.filter(|c| !c.is_empty()),
        )
        .await?;
    if !renamed {
        return Err(AppError::NotFound(format!("No saved CV with id {id}")));
    }

    let entry = state
        .store
        .get_history(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No saved CV with id {id}")))?;
    Ok(Json(entry))
}

/// DELETE /api/v1/history/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.store.delete_history(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("No saved CV with id {id}")))
    }
}

#[derive(Serialize)]
pub struct PdfResponse {
    pub entry_id: String,
    pub mime_type: String,
    pub data_uri: String,
}

/// POST /api/v1/history/:id/pdf
/// Regenerates the document for a stored entry via the render queue.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PdfResponse>, AppError> {
    let document = state.coordinator.generate_pdf(&id).await?;
    Ok(Json(PdfResponse {
        entry_id: id,
        mime_type: document.mime_type.clone(),
        data_uri: document.to_data_uri(),
    }))
}

/// GET /api/v1/resume/current
/// The most recently generated résumé (legacy simple path).
pub async fn handle_current_resume(
    State(state): State<AppState>,
) -> Result<Json<TailoredResume>, AppError> {
    let resume = state
        .store
        .current_resume()
        .await?
        .ok_or_else(|| AppError::NotFound("No tailored CV has been generated yet".to_string()))?;
    Ok(Json(resume))
}
