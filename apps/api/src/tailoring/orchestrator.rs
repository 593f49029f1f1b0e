//! Tailoring orchestrator — one end-to-end run of the pipeline.
//!
//! Flow: scraped posting in hand → load base résumé + settings (guards) →
//! render prompt → provider call → JSON recovery → append history →
//! persist as current résumé.
//!
//! Runs execute inside the coordinator task, so they are serialized and the
//! history log keeps a single writer.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::llm_client::extract::{extract_json, JsonExtractionError};
use crate::llm_client::prompts::{self, PromptFields};
use crate::llm_client::{ProviderClient, ProviderError, ProviderKind};
use crate::models::history::{next_entry_id, HistoryEntry};
use crate::models::job::JobPosting;
use crate::models::resume::TailoredResume;
use crate::store::Store;

/// Bound on a single provider round-trip. A hung call fails the run instead
/// of stalling it indefinitely.
const PROVIDER_DEADLINE: Duration = Duration::from_secs(120);

/// Where the pipeline currently is. Published so UI surfaces can show
/// progress; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Scraping,
    AwaitingConfig,
    Requesting,
    Parsing,
    Persisting,
    Done,
    Failed,
}

#[derive(Debug, Error)]
pub enum TailorError {
    #[error("No base CV set. Save your base résumé before tailoring.")]
    MissingBaseResume,

    #[error("No API key set. Configure a provider API key in settings.")]
    MissingApiKey,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("The provider did not respond within {}s", PROVIDER_DEADLINE.as_secs())]
    ProviderTimeout,

    #[error(transparent)]
    Extraction(#[from] JsonExtractionError),

    #[error("Failed to persist the tailored résumé: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("The tailoring service is shutting down")]
    Unavailable,
}

/// Runs one full tailoring pipeline for an already-scraped posting.
/// `on_stage` fires at every transition; the caller decides how to publish.
pub async fn run(
    store: &Store,
    provider: &ProviderClient,
    job: JobPosting,
    mut on_stage: impl FnMut(Stage),
) -> Result<HistoryEntry, TailorError> {
    on_stage(Stage::AwaitingConfig);
    let base_cv = store
        .base_resume()
        .await?
        .ok_or(TailorError::MissingBaseResume)?;
    let settings = store.settings().await?;
    if settings.api_key.trim().is_empty() {
        return Err(TailorError::MissingApiKey);
    }
    let kind = ProviderKind::parse(&settings.provider)?;

    let template = settings
        .tailor_prompt
        .as_deref()
        .unwrap_or(prompts::DEFAULT_TAILOR_PROMPT);
    let prompt = prompts::render(
        template,
        &PromptFields {
            base_cv: &base_cv,
            job_title: &job.title,
            job_company: &job.company,
            job_location: &job.location,
            job_description: &job.description,
        },
    );

    on_stage(Stage::Requesting);
    info!(
        provider = kind.as_str(),
        model = %settings.model,
        job_title = %job.title,
        company = %job.company,
        "requesting tailored résumé"
    );
    let text = timeout(
        PROVIDER_DEADLINE,
        provider.generate(
            kind,
            &settings.model,
            &settings.api_key,
            &prompt,
            prompts::TAILOR_SYSTEM,
        ),
    )
    .await
    .map_err(|_| TailorError::ProviderTimeout)??;

    on_stage(Stage::Parsing);
    let value = match extract_json(&text) {
        Ok(value) => value,
        Err(e) => {
            // The user-facing message stays generic; the raw text is only
            // logged.
            warn!(response = %text, "model output was not recoverable as JSON");
            return Err(e.into());
        }
    };
    let resume: TailoredResume = match serde_json::from_value(value) {
        Ok(resume) => resume,
        Err(e) => {
            warn!(error = %e, "recovered JSON did not match the résumé shape; defaulting");
            TailoredResume::default()
        }
    };

    on_stage(Stage::Persisting);
    let entry = HistoryEntry {
        id: next_entry_id(),
        url: job.url,
        job_title: job.title,
        company: job.company,
        cv_data: resume,
        created_at: Utc::now(),
    };
    store.append_history(&entry).await?;
    // Legacy simple path: the most recent result also lives on its own key.
    store.save_current_resume(&entry.cv_data).await?;

    on_stage(Stage::Done);
    info!(entry_id = %entry.id, "tailoring run complete");
    Ok(entry)
}
