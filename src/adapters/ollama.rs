//! Client for an Ollama-compatible text-generation server.
//!
//! Only the non-streaming `/api/generate` endpoint is used. The model is
//! asked for a JSON array of `{answer, question}` objects; since small models
//! do not always comply, [`parse_model_output`] also accepts a wrapped array
//! or plain `WORD: clue` lines.

use crate::config::toml_config::GeneratorConfig;
use crate::domain::model::RawClue;
use crate::domain::ports::ClueSource;
use crate::utils::error::GenerationError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
    timeout_seconds: u64,
}

impl OllamaClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn prompt(topic: &str, count: usize) -> String {
        format!(
            "Create {count} crossword entries about the topic \"{topic}\".\n\
             Respond with a JSON array only. Each element is an object with two fields:\n\
             \"answer\": a single English word, letters only, 3 to 15 letters long;\n\
             \"question\": a one-sentence clue that does not contain the answer.\n\
             Every answer must be different."
        )
    }
}

#[async_trait]
impl ClueSource for OllamaClient {
    async fn generate(&self, topic: &str, count: usize) -> Result<Vec<RawClue>, GenerationError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = GenerateRequest {
            model: &self.model,
            prompt: Self::prompt(topic, count),
            stream: false,
            format: "json",
            options: self.temperature.map(|temperature| GenerateOptions { temperature }),
        };

        tracing::debug!("Making generation request to: {}", url);
        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout {
                    seconds: self.timeout_seconds,
                }
            } else {
                GenerationError::Unreachable(e)
            }
        })?;

        let status = response.status();
        tracing::debug!("Generation response status: {}", status);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaError>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(GenerationError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let payload: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::MalformedResponse {
                    reason: format!("unexpected response body: {}", e),
                })?;
        tracing::debug!("Model output: {} bytes", payload.response.len());

        parse_model_output(&payload.response)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Parses free-form model text into raw pairs.
pub fn parse_model_output(text: &str) -> Result<Vec<RawClue>, GenerationError> {
    let text = strip_json_fences(text);

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        let pairs = pairs_from_json(&value);
        if !pairs.is_empty() {
            return Ok(pairs);
        }
    }

    let pairs = pairs_from_lines(text)?;
    if pairs.is_empty() {
        return Err(GenerationError::MalformedResponse {
            reason: "no word/clue pairs found in model output".to_string(),
        });
    }
    Ok(pairs)
}

fn pairs_from_json(value: &Value) -> Vec<RawClue> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<RawClue>(item.clone()).ok())
            .collect(),
        Value::Object(map) => {
            if let Ok(single) = serde_json::from_value::<RawClue>(value.clone()) {
                return vec![single];
            }
            // 模型常把陣列包在任意鍵底下，例如 {"entries": [...]}
            map.values()
                .map(pairs_from_json)
                .find(|pairs| !pairs.is_empty())
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

fn pairs_from_lines(text: &str) -> Result<Vec<RawClue>, GenerationError> {
    let re = Regex::new(r"^\s*(?:\d+[.)]\s*)?\**([A-Za-z][A-Za-z ]*?)\**\s*[:\-]\s+(.+?)\s*$")
        .map_err(|e| GenerationError::MalformedResponse {
            reason: e.to_string(),
        })?;

    Ok(text
        .lines()
        .filter_map(|line| re.captures(line))
        .map(|caps| RawClue::new(caps[1].trim(), caps[2].trim()))
        .collect())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}
