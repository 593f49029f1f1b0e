//! Anthropic messages wire format.
//!
//! The system instruction is a top-level field, `max_tokens` is required,
//! and the versioning header must accompany every request.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ProviderError, TEMPERATURE};

const PROVIDER: &str = "anthropic";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
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
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
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
        max_tokens: MAX_TOKENS,
        system,
        messages: vec![Message {
            role: "user",
            content: prompt,
        }],
        temperature: TEMPERATURE,
    };

    let response = http
        .post(format!("{}/v1/messages", base_url.trim_end_matches('/')))
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
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
        .content
        .into_iter()
        .find(|block| block.block_type == "text")
        .and_then(|block| block.text)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| ProviderError::ResponseShape {
            provider: PROVIDER,
            detail: "no text block in content".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_puts_system_at_top_level() {
        let body = Request {
            model: "claude-sonnet-4-5",
            max_tokens: MAX_TOKENS,
            system: "sys",
            messages: vec![Message {
                role: "user",
                content: "hello",
            }],
            temperature: TEMPERATURE,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["system"], "sys");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], MAX_TOKENS);
    }

    #[test]
    fn non_text_blocks_are_skipped() {
        let parsed: Response = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "tool_use", "text": null},
                {"type": "text", "text": "hello"}
            ]
        }))
        .unwrap();
        let text = parsed
            .content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text)
            .unwrap();
        assert_eq!(text, "hello");
    }
}
