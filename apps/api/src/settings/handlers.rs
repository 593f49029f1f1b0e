//! Settings surface: provider configuration and the base résumé.
//!
//! The base résumé arrives either as pasted text or as an uploaded PDF
//! whose text is extracted locally.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::ProviderKind;
use crate::state::AppState;
use crate::store::Settings;

/// Settings as shown to the client. The API key never leaves the service
/// in full.
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub tailor_prompt: Option<String>,
}

impl From<Settings> for SettingsView {
    fn from(s: Settings) -> Self {
        SettingsView {
            provider: s.provider,
            api_key: mask_key(&s.api_key),
            model: s.model,
            tailor_prompt: s.tailor_prompt,
        }
    }
}

/// Keeps the last four characters so the user can tell keys apart.
fn mask_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let visible: String = trimmed
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("••••{visible}")
}

/// GET /api/v1/settings
pub async fn handle_get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsView>, AppError> {
    Ok(Json(state.store.settings().await?.into()))
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    /// An empty string clears the custom template back to the default.
    pub tailor_prompt: Option<String>,
}

/// PUT /api/v1/settings
/// Partial update: only provided fields change.
pub async fn handle_save_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsView>, AppError> {
    let mut settings = state.store.settings().await?;

    if let Some(provider) = update.provider {
        let kind = ProviderKind::parse(&provider)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        settings.provider = kind.as_str().to_string();
    }
    if let Some(api_key) = update.api_key {
        settings.api_key = api_key.trim().to_string();
    }
    if let Some(model) = update.model {
        let model = model.trim();
        if model.is_empty() {
            return Err(AppError::Validation("model must not be empty".to_string()));
        }
        settings.model = model.to_string();
    }
    if let Some(prompt) = update.tailor_prompt {
        settings.tailor_prompt = if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        };
    }

    state.store.save_settings(&settings).await?;
    info!(provider = %settings.provider, model = %settings.model, "settings saved");
    Ok(Json(settings.into()))
}

#[derive(Debug, Serialize)]
pub struct BaseResumeView {
    pub content: String,
}

/// GET /api/v1/base-resume
pub async fn handle_get_base_resume(
    State(state): State<AppState>,
) -> Result<Json<BaseResumeView>, AppError> {
    let content = state
        .store
        .base_resume()
        .await?
        .ok_or_else(|| AppError::NotFound("No base CV set".to_string()))?;
    Ok(Json(BaseResumeView { content }))
}

#[derive(Debug, Deserialize)]
pub struct BaseResumeUpdate {
    pub content: String,
}

/// PUT /api/v1/base-resume
/// Manual paste path. Overwrites the stored singleton.
pub async fn handle_save_base_resume(
    State(state): State<AppState>,
    Json(update): Json<BaseResumeUpdate>,
) -> Result<StatusCode, AppError> {
    let content = update.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation(
            "Base CV text must not be empty".to_string(),
        ));
    }
    state.store.save_base_resume(content).await?;
    info!(characters = content.len(), "base CV saved");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/base-resume/upload
/// Multipart PDF upload. Text is extracted locally and saved as the base
/// résumé; the extracted text is returned so the client can show it.
pub async fn handle_upload_base_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BaseResumeView>, AppError> {
    let mut pdf_bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
            pdf_bytes = Some(bytes);
        }
    }

    let pdf_bytes =
        pdf_bytes.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    let content = pdf_extract::extract_text_from_mem(&pdf_bytes)
        .map_err(|e| AppError::Validation(format!("Could not extract text from the PDF: {e}")))?;
    let content = content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation(
            "The uploaded PDF contained no extractable text".to_string(),
        ));
    }

    state.store.save_base_resume(&content).await?;
    info!(characters = content.len(), "base CV extracted from PDF and saved");
    Ok(Json(BaseResumeView { content }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_key_keeps_only_the_tail() {
        assert_eq!(mask_key("sk-abcdef123456"), "••••3456");
        assert_eq!(mask_key(""), "");
        assert_eq!(mask_key("  "), "");
    }

    #[test]
    fn mask_key_handles_short_keys() {
        assert_eq!(mask_key("ab"), "••••ab");
    }
}
