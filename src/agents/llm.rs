// src/agents/llm.rs

//! Shared OpenRouter chat-completions client.
//!
//! Every remote call in the crate goes through [`LlmClient::chat`], which
//! owns the retry policy: bounded attempts with linear backoff on retryable
//! HTTP statuses, and a one-time swap to the fallback model after the first
//! retryable failure on the default model. Non-retryable failures are raised
//! immediately.

use crate::config::SolverConfig;
use serde::Serialize;
use serde_json::{Value, json};
use std::thread;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;
const BACKOFF: Duration = Duration::from_secs(2);
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One OpenAI-style chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::blocking::Client,
    config: SolverConfig,
}

impl LlmClient {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            config,
        }
    }

    /// Send a chat request and return the first choice's content, trimmed.
    ///
    /// `response_format` is forwarded verbatim (e.g. `{"type": "json_object"}`);
    /// when present, `provider.require_parameters` is set so the routed model
    /// is guaranteed to honor it.
    pub fn chat(
        &self,
        messages: &[ChatMessage],
        response_format: Option<Value>,
    ) -> Result<String, LlmError> {
        let mut model = self.config.default_model.clone();

        for attempt in 0..MAX_RETRIES {
            let mut payload = json!({
                "model": model,
                "messages": messages,
                "temperature": 0.0,
                "stream": false,
                "usage": { "include": true },
            });
            if let Some(format) = &response_format {
                payload["response_format"] = format.clone();
                payload["provider"] = json!({ "require_parameters": true });
            }

            let mut request = self
                .http
                .post(format!("{}/chat/completions", self.config.base_url))
                .bearer_auth(&self.config.api_key)
                .timeout(Duration::from_secs(60))
                .json(&payload);
            if let Some(referer) = &self.config.referer {
                request = request.header("HTTP-Referer", referer);
            }
            if let Some(title) = &self.config.title {
                request = request.header("X-Title", title);
            }

            let response = request.send()?;
            let status = response.status();

            if status.is_success() {
                let body: Value = response
                    .json()
                    .map_err(|err| LlmError::Malformed(err.to_string()))?;
                return extract_content(&body);
            }

            let error = LlmError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            };
            if !RETRYABLE_STATUSES.contains(&status.as_u16()) || attempt == MAX_RETRIES - 1 {
                return Err(error);
            }
            tracing::warn!(model = %model, attempt, error = %error, "retryable LLM failure");

            // Switch to the fallback model after the first failure with the
            // default model.
            if attempt == 0 && model != self.config.fallback_model {
                model = self.config.fallback_model.clone();
            }

            thread::sleep(BACKOFF * (attempt + 1));
        }

        unreachable!("retry loop always returns within MAX_RETRIES attempts")
    }
}

fn extract_content(body: &Value) -> Result<String, LlmError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.trim().to_string())
        .ok_or_else(|| LlmError::Malformed("response missing choices[0].message.content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice_content() {
        let body = json!({
            "choices": [{ "message": { "content": "  result = 2 + 2  " } }]
        });
        assert_eq!(extract_content(&body).unwrap(), "result = 2 + 2");
    }

    #[test]
    fn missing_content_is_malformed() {
        let body = json!({ "choices": [] });
        assert!(matches!(
            extract_content(&body),
            Err(LlmError::Malformed(_))
        ));
    }
}
