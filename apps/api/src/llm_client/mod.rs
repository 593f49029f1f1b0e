//! LLM client — the single point of entry for all provider calls.
//!
//! ARCHITECTURAL RULE: no other module may call a vendor API directly.
//! All LLM interactions MUST go through this module.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod anthropic;
pub mod extract;
pub mod gemini;
pub mod openai;
pub mod prompts;

/// Sampling temperature for every call. Kept low so the model favors
/// deterministic structured output.
pub const TEMPERATURE: f64 = 0.3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// The closed set of supported vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Anthropic,
}

impl ProviderKind {
    /// Parses a stored provider name. Anything outside the supported set
    /// fails here, before any request is built.
    pub fn parse(value: &str) -> Result<Self, ProviderError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(ProviderError::Unsupported(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unsupported provider: {0}")]
    Unsupported(String),

    #[error("Request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status. The body is captured verbatim for
    /// diagnostics, never parsed.
    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response did not match the expected shape: {detail}")]
    ResponseShape {
        provider: &'static str,
        detail: String,
    },
}

/// Vendor base URLs. Overridable so tests can point the client at a mock
/// HTTP server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub openai: String,
    pub gemini: String,
    pub anthropic: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            openai: "https://api.openai.com".to_string(),
            gemini: "https://generativelanguage.googleapis.com".to_string(),
            anthropic: "https://api.anthropic.com".to_string(),
        }
    }
}

/// The single LLM client used by the tailoring pipeline. One outbound call
/// per invocation, no retries; failures surface to the caller, which decides
/// whether to re-invoke.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: Client,
    endpoints: Endpoints,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient {
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            endpoints,
        }
    }

    /// Sends `prompt` (with `system` as the system instruction) to the given
    /// vendor and returns the completion text.
    pub async fn generate(
        &self,
        provider: ProviderKind,
        model: &str,
        api_key: &str,
        prompt: &str,
        system: &str,
    ) -> Result<String, ProviderError> {
        match provider {
            ProviderKind::OpenAi => {
                openai::generate(&self.http, &self.endpoints.openai, model, api_key, prompt, system)
                    .await
            }
            ProviderKind::Gemini => {
                gemini::generate(&self.http, &self.endpoints.gemini, model, api_key, prompt, system)
                    .await
            }
            ProviderKind::Anthropic => {
                anthropic::generate(
                    &self.http,
                    &self.endpoints.anthropic,
                    model,
                    api_key,
                    prompt,
                    system,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ProviderClient {
        let url = server.uri();
        ProviderClient::with_endpoints(Endpoints {
            openai: url.clone(),
            gemini: url.clone(),
            anthropic: url,
        })
    }

    #[test]
    fn parse_accepts_supported_vendors_case_insensitively() {
        assert_eq!(ProviderKind::parse("openai").unwrap(), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse("Gemini").unwrap(), ProviderKind::Gemini);
        assert_eq!(
            ProviderKind::parse(" ANTHROPIC ").unwrap(),
            ProviderKind::Anthropic
        );
    }

    #[test]
    fn parse_rejects_unknown_vendor() {
        let err = ProviderKind::parse("llama").unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported(name) if name == "llama"));
    }

    #[tokio::test]
    async fn openai_success_extracts_completion_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "  tailored text  "}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate(ProviderKind::OpenAi, "gpt-4.1-mini", "sk-test", "p", "s")
            .await
            .unwrap();
        assert_eq!(text, "tailored text");
    }

    #[tokio::test]
    async fn gemini_success_extracts_completion_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "g-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    {"content": {"role": "model", "parts": [{"text": "gemini says hi"}]}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate(ProviderKind::Gemini, "gemini-2.5-flash", "g-test", "p", "s")
            .await
            .unwrap();
        assert_eq!(text, "gemini says hi");
    }

    #[tokio::test]
    async fn anthropic_success_extracts_first_text_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "a-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": "claude says hi"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate(ProviderKind::Anthropic, "claude-sonnet-4-5", "a-test", "p", "s")
            .await
            .unwrap();
        assert_eq!(text, "claude says hi");
    }

    #[tokio::test]
    async fn non_success_status_surfaces_body_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"error":"bad key"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate(ProviderKind::OpenAi, "gpt-4.1-mini", "sk-bad", "p", "s")
            .await
            .unwrap_err();
        match err {
            ProviderError::Http { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, r#"{"error":"bad key"}"#);
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_a_shape_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate(ProviderKind::OpenAi, "gpt-4.1-mini", "sk-test", "p", "s")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ResponseShape { .. }));
    }
}
