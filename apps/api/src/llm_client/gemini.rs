//! Gemini generateContent wire format.
//!
//! Gemini has no top-level system field; the system instruction is inlined
//! into the single user content block. The model name rides in the URL path,
//! not the body.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ProviderError, TEMPERATURE};

const PROVIDER: &str = "gemini";

#[derive(Debug, Serialize)]
struct Request {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct Response {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
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
        contents: vec![Content {
            role: "user",
            parts: vec![Part {
                text: format!("System Instruction: {system}\n\n{prompt}"),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
        },
    };

    let response = http
        .post(format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        ))
        .header("x-goog-api-key", api_key)
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
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .and_then(|part| part.text)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| ProviderError::ResponseShape {
            provider: PROVIDER,
            detail: "no text part in first candidate".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_inlines_system_instruction_into_user_part() {
        let body = Request {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: "System Instruction: sys\n\nhello".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert!(json["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("System Instruction: sys"));
        assert!(json["generationConfig"]["temperature"].as_f64().unwrap() <= 0.3);
    }

    #[test]
    fn candidate_without_parts_decodes() {
        let parsed: Response = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"role": "model"}}]
        }))
        .unwrap();
        assert!(parsed.candidates[0].content.parts.is_empty());
    }
}
