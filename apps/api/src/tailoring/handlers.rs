use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::history::HistoryEntry;
use crate::models::job::JobPosting;
use crate::state::AppState;
use crate::tailoring::orchestrator::Stage;

/// POST /api/v1/tailor
/// Body: the job posting as scraped on the client. Runs the full pipeline
/// through the coordinator and returns the new history entry.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(job): Json<JobPosting>,
) -> Result<Json<HistoryEntry>, AppError> {
    let entry = state.coordinator.tailor(job).await?;
    Ok(Json(entry))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub stage: Stage,
}

/// GET /api/v1/tailor/status
/// Current pipeline stage, for progress display.
pub async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        stage: state.coordinator.stage(),
    })
}
