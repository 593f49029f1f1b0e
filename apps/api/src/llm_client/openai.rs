//! OpenAI chat-completions wire format.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ProviderError, TEMPERATURE};

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub(super) async fn generate(
    http: &Client,
    base_url: &str,
    model: &str,
    api_key: &str,
    prompt: &str,
    system: &str,
) -> Result<String, ProviderError> {
    let body = Request {
        model,
        messages: vec![
            Message {
                role: "system",
                content: system,
            },
            Message {
                role: "user",
                content: prompt,
            },
        ],
        temperature: TEMPERATURE,
    };

    let response = http
        .post(format!(
            "{}/v1/chat/completions",
            base_url.trim_end_matches('/')
        ))
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|source| ProviderError::Transport {
            provider: PROVIDER,
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Http {
            provider: PROVIDER,
            status: status.as_u16(),
            body,
        });
    }

    let parsed: Response =
        response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseShape {
                provider: PROVIDER,
                detail: e.to_string(),
            })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| ProviderError::ResponseShape {
            provider: PROVIDER,
            detail: "no completion text in choices".to_string(),
        })
}
