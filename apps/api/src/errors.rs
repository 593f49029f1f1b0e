use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::coordinator::PdfRequestError;
use crate::render::RenderError;
use crate::tailoring::TailorError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Tailor(#[from] TailorError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PdfRequestError> for AppError {
    fn from(e: PdfRequestError) -> Self {
        match e {
            PdfRequestError::UnknownEntry(id) => {
                AppError::NotFound(format!("No saved CV with id {id}"))
            }
            PdfRequestError::Store(e) => AppError::Database(e),
            PdfRequestError::Render(e) => AppError::Render(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Tailor(e) => tailor_response(e),
            AppError::Render(e) => match e {
                RenderError::Timeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "RENDER_TIMEOUT",
                    e.to_string(),
                ),
                _ => {
                    tracing::error!("Render error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "RENDER_ERROR",
                        "Document rendering failed".to_string(),
                    )
                }
            },
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn tailor_response(e: &TailorError) -> (StatusCode, &'static str, String) {
    match e {
        // User-correctable, caught before any network call.
        TailorError::MissingBaseResume | TailorError::MissingApiKey => {
            (StatusCode::BAD_REQUEST, "CONFIGURATION_ERROR", e.to_string())
        }
        // Surfaced verbatim, status and body included, for diagnostics.
        TailorError::Provider(p) => {
            tracing::error!("Provider error: {p}");
            (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", p.to_string())
        }
        TailorError::ProviderTimeout => (
            StatusCode::GATEWAY_TIMEOUT,
            "PROVIDER_TIMEOUT",
            e.to_string(),
        ),
        // The raw model output was already logged where extraction failed;
        // the user sees a generic message.
        TailorError::Extraction(_) => (
            StatusCode::BAD_GATEWAY,
            "EXTRACTION_ERROR",
            "The model did not return valid structured data".to_string(),
        ),
        TailorError::Persistence(err) => {
            tracing::error!("Database error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
            )
        }
        TailorError::Unavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "UNAVAILABLE",
            e.to_string(),
        ),
    }
}
