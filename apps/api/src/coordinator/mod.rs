//! Background coordinator — the long-lived task every cross-surface
//! message flows through.
//!
//! Tailoring runs execute inside the command loop, so concurrent requests
//! queue behind each other and the history log has exactly one writer.
//! Document generation is handed off to the render queue, which tracks each
//! request individually; the command loop never blocks on a render.

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info};

use crate::llm_client::ProviderClient;
use crate::models::history::HistoryEntry;
use crate::models::job::JobPosting;
use crate::render::{RenderError, RenderQueueHandle, RenderedDocument};
use crate::store::Store;
use crate::tailoring::orchestrator::{self, Stage, TailorError};

/// Commands accepted by the coordinator task.
enum Command {
    /// A scraped posting is ready; run the tailoring pipeline for it.
    Tailor {
        job: JobPosting,
        reply: oneshot::Sender<Result<HistoryEntry, TailorError>>,
    },
    /// Produce a document for a stored history entry.
    GeneratePdf {
        entry_id: String,
        reply: oneshot::Sender<Result<RenderedDocument, PdfRequestError>>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PdfRequestError {
    #[error("No saved CV with id {0}")]
    UnknownEntry(String),

    #[error("Failed to load the CV: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    stage: watch::Receiver<Stage>,
}

impl CoordinatorHandle {
    /// Submits a tailoring run and waits for its outcome. Runs queue behind
    /// any run already in flight.
    pub async fn tailor(&self, job: JobPosting) -> Result<HistoryEntry, TailorError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Tailor { job, reply })
            .await
            .map_err(|_| TailorError::Unavailable)?;
        response.await.map_err(|_| TailorError::Unavailable)?
    }

    /// Requests a rendered document for a stored history entry.
    pub async fn generate_pdf(&self, entry_id: &str) -> Result<RenderedDocument, PdfRequestError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::GeneratePdf {
                entry_id: entry_id.to_string(),
                reply,
            })
            .await
            .map_err(|_| PdfRequestError::Render(RenderError::Unavailable))?;
        response
            .await
            .map_err(|_| PdfRequestError::Render(RenderError::Unavailable))?
    }

    /// Latest published pipeline stage.
    pub fn stage(&self) -> Stage {
        *self.stage.borrow()
    }
}

/// Spawns the coordinator task and returns its handle.
pub fn spawn(store: Store, provider: ProviderClient, renderer: RenderQueueHandle) -> CoordinatorHandle {
    let (commands, inbox) = mpsc::channel(32);
    let (stage_tx, stage_rx) = watch::channel(Stage::Idle);
    tokio::spawn(run_loop(store, provider, renderer, inbox, stage_tx));
    CoordinatorHandle {
        commands,
        stage: stage_rx,
    }
}

async fn run_loop(
    store: Store,
    provider: ProviderClient,
    renderer: RenderQueueHandle,
    mut inbox: mpsc::Receiver<Command>,
    stage: watch::Sender<Stage>,
) {
    info!("background coordinator started");
    while let Some(command) = inbox.recv().await {
        match command {
            Command::Tailor { job, reply } => {
                // The posting arrives pre-scraped; the run is marked started
                // on receipt.
                let _ = stage.send(Stage::Scraping);
                let result = orchestrator::run(&store, &provider, job, |s| {
                    let _ = stage.send(s);
                })
                .await;
                if let Err(e) = &result {
                    let _ = stage.send(Stage::Failed);
                    error!(error = %e, "tailoring run failed");
                }
                let _ = reply.send(result);
            }
            Command::GeneratePdf { entry_id, reply } => {
                // Hand off so a slow render never blocks queued tailoring
                // commands.
                let store = store.clone();
                let renderer = renderer.clone();
                tokio::spawn(async move {
                    let _ = reply.send(generate_pdf(&store, &renderer, &entry_id).await);
                });
            }
        }
    }
}

async fn generate_pdf(
    store: &Store,
    renderer: &RenderQueueHandle,
    entry_id: &str,
) -> Result<RenderedDocument, PdfRequestError> {
    let entry = store
        .get_history(entry_id)
        .await?
        .ok_or_else(|| PdfRequestError::UnknownEntry(entry_id.to_string()))?;
    Ok(renderer.render(entry.cv_data).await?)
}
