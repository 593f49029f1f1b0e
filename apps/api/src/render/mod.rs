//! Document rendering — the boundary to the layout collaborator.
//!
//! Requests go through a queue actor mirroring the lifecycle of an
//! on-demand rendering surface: a single worker renders one document at a
//! time while the queue tracks every outstanding request by id. Multiple
//! callers can wait concurrently and each gets its own completion channel;
//! a new request never displaces an earlier one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::resume::TailoredResume;

pub mod html;

/// Bound on one render. A wedged renderer fails its request instead of
/// holding the completion channel forever.
const RENDER_DEADLINE: Duration = Duration::from_secs(30);

/// A finished document artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl RenderedDocument {
    /// Data-URI form, the shape UI surfaces consume directly.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Document rendering failed: {0}")]
    Failed(String),

    #[error("Document rendering timed out")]
    Timeout,

    #[error("The rendering worker is not running")]
    Unavailable,
}

/// The layout collaborator. Its internals (pagination, fonts, markup) are
/// out of scope here; this contract is the whole boundary.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, resume: &TailoredResume) -> Result<RenderedDocument, RenderError>;
}

struct RenderRequest {
    id: Uuid,
    resume: TailoredResume,
}

enum QueueMessage {
    Submit {
        request: RenderRequest,
        reply: oneshot::Sender<Result<RenderedDocument, RenderError>>,
    },
    Finished {
        id: Uuid,
        result: Result<RenderedDocument, RenderError>,
    },
}

#[derive(Clone)]
pub struct RenderQueueHandle {
    messages: mpsc::UnboundedSender<QueueMessage>,
}

impl RenderQueueHandle {
    /// Submits a résumé for rendering and waits for its completion.
    pub async fn render(&self, resume: TailoredResume) -> Result<RenderedDocument, RenderError> {
        let (reply, response) = oneshot::channel();
        let request = RenderRequest {
            id: Uuid::new_v4(),
            resume,
        };
        self.messages
            .send(QueueMessage::Submit { request, reply })
            .map_err(|_| RenderError::Unavailable)?;
        response.await.map_err(|_| RenderError::Unavailable)?
    }
}

/// Spawns the queue and worker tasks and returns the submission handle.
pub fn spawn_queue(renderer: Arc<dyn DocumentRenderer>) -> RenderQueueHandle {
    let (msg_tx, msg_rx) = mpsc::unbounded_channel();
    let (work_tx, work_rx) = mpsc::channel(32);
    tokio::spawn(queue_loop(msg_rx, work_tx));
    tokio::spawn(worker_loop(renderer, work_rx, msg_tx.clone()));
    RenderQueueHandle { messages: msg_tx }
}

async fn queue_loop(
    mut messages: mpsc::UnboundedReceiver<QueueMessage>,
    work: mpsc::Sender<RenderRequest>,
) {
    // Pending completions keyed by request id.
    let mut pending: HashMap<Uuid, oneshot::Sender<Result<RenderedDocument, RenderError>>> =
        HashMap::new();

    while let Some(message) = messages.recv().await {
        match message {
            QueueMessage::Submit { request, reply } => {
                let id = request.id;
                if work.send(request).await.is_err() {
                    let _ = reply.send(Err(RenderError::Unavailable));
                    continue;
                }
                pending.insert(id, reply);
            }
            QueueMessage::Finished { id, result } => match pending.remove(&id) {
                // The caller may have given up waiting; dropping the value
                // is the right outcome then.
                Some(reply) => {
                    let _ = reply.send(result);
                }
                None => warn!(request_id = %id, "completion for an unknown render request"),
            },
        }
    }
}

async fn worker_loop(
    renderer: Arc<dyn DocumentRenderer>,
    mut work: mpsc::Receiver<RenderRequest>,
    messages: mpsc::UnboundedSender<QueueMessage>,
) {
    while let Some(request) = work.recv().await {
        let result = match timeout(RENDER_DEADLINE, renderer.render(&request.resume)).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout),
        };
        if let Err(e) = &result {
            error!(request_id = %request.id, error = %e, "document rendering failed");
        }
        if messages
            .send(QueueMessage::Finished {
                id: request.id,
                result,
            })
            .is_err()
        {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::PersonalInfo;

    /// Echoes the résumé's name so each caller can verify it got its own
    /// completion, not someone else's.
    struct EchoRenderer;

    #[async_trait]
    impl DocumentRenderer for EchoRenderer {
        async fn render(&self, resume: &TailoredResume) -> Result<RenderedDocument, RenderError> {
            Ok(RenderedDocument {
                bytes: Bytes::from(format!("doc:{}", resume.personal.name)),
                mime_type: "text/plain".to_string(),
            })
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl DocumentRenderer for FailingRenderer {
        async fn render(&self, _: &TailoredResume) -> Result<RenderedDocument, RenderError> {
            Err(RenderError::Failed("synthetic failure".to_string()))
        }
    }

    fn resume_named(name: &str) -> TailoredResume {
        TailoredResume {
            personal: PersonalInfo {
                name: name.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn concurrent_requests_each_get_their_own_document() {
        let queue = spawn_queue(Arc::new(EchoRenderer));

        let (a, b, c) = tokio::join!(
            queue.render(resume_named("Ada")),
            queue.render(resume_named("Bob")),
            queue.render(resume_named("Cyd")),
        );

        assert_eq!(a.unwrap().bytes, Bytes::from("doc:Ada"));
        assert_eq!(b.unwrap().bytes, Bytes::from("doc:Bob"));
        assert_eq!(c.unwrap().bytes, Bytes::from("doc:Cyd"));
    }

    #[tokio::test]
    async fn renderer_failure_reaches_the_caller() {
        let queue = spawn_queue(Arc::new(FailingRenderer));
        let err = queue.render(resume_named("Ada")).await.unwrap_err();
        assert!(matches!(err, RenderError::Failed(msg) if msg == "synthetic failure"));
    }

    #[test]
    fn data_uri_has_mime_and_base64_payload() {
        let doc = RenderedDocument {
            bytes: Bytes::from_static(b"hello"),
            mime_type: "text/html".to_string(),
        };
        assert_eq!(doc.to_data_uri(), "data:text/html;base64,aGVsbG8=");
    }
}
