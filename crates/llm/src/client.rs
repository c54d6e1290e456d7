//! Chat-completion client for OpenAI-compatible endpoints.
//!
//! [`OpenAiChat`] talks to any `/chat/completions` endpoint (OpenAI,
//! DeepSeek, Qwen). The pipeline depends on the [`ChatModel`] trait so
//! tests can substitute an in-memory model.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// Request timeout for a single completion call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Sampling temperature for every stage.
const TEMPERATURE: f64 = 0.3;

/// Model-name aliases resolved before the request is built.
const MODEL_ALIASES: &[(&str, &str)] = &[("deepseek", "deepseek-chat")];

/// Longest content preview included in request/response logs.
const LOG_PREVIEW_CHARS: usize = 200;

/// One role-tagged message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Errors from the generation-service collaborator.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status code.
    #[error("LLM API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for diagnosis.
        body: String,
    },

    /// The response body does not have the expected completion shape.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// The seam between the pipeline and the generation service.
///
/// `json_mode` asks the endpoint for a structured-output response; the
/// returned text is still free-form and goes through the extractor.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], json_mode: bool)
        -> Result<String, LlmError>;
}

/// Production [`ChatModel`] over an OpenAI-compatible HTTP endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    /// Create a client for the given endpoint.
    ///
    /// * `base_url` - e.g. `https://api.openai.com/v1`.
    /// * `model`    - model name; the `deepseek` alias resolves to
    ///                `deepseek-chat`.
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest HTTP client");
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    /// The completions URL for this endpoint.
    ///
    /// DeepSeek-style bases that omit the `/v1` path segment get it
    /// appended, matching what their API actually serves.
    fn completions_url(&self) -> String {
        let mut base = self.base_url.trim_end_matches('/').to_string();
        if !base.contains("/v1") && base.to_lowercase().contains("deepseek") {
            base.push_str("/v1");
        }
        format!("{base}/chat/completions")
    }

    fn resolved_model(&self) -> &str {
        let wanted = self.model.trim();
        MODEL_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(wanted))
            .map(|(_, resolved)| *resolved)
            .unwrap_or(wanted)
    }

    fn messages_summary(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let preview: String = m.content.chars().take(LOG_PREVIEW_CHARS).collect();
                let ellipsis = if m.content.chars().count() > LOG_PREVIEW_CHARS {
                    "..."
                } else {
                    ""
                };
                format!(
                    "[{i}] {}({} chars): {preview:?}{ellipsis}",
                    m.role,
                    m.content.chars().count()
                )
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[async_trait::async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        json_mode: bool,
    ) -> Result<String, LlmError> {
        let url = self.completions_url();
        let model = self.resolved_model();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": TEMPERATURE,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        tracing::info!(
            url = %url,
            model,
            messages_count = messages.len(),
            json_mode,
            "LLM request: {}",
            Self::messages_summary(messages),
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response.json().await?;
        let message = data
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| LlmError::MalformedResponse("no choices[0].message".to_string()))?;

        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let reasoning = message
            .get("reasoning_content")
            .and_then(Value::as_str)
            .unwrap_or_default();

        // Some reasoning models leave `content` empty and put everything
        // into `reasoning_content`.
        let text = if content.is_empty() && !reasoning.is_empty() {
            tracing::info!("LLM: using reasoning_content as content (content was empty)");
            reasoning
        } else {
            content
        }
        .trim()
        .to_string();

        tracing::info!(
            status = status.as_u16(),
            content_len = text.chars().count(),
            reasoning_len = reasoning.chars().count(),
            usage = %data.get("usage").cloned().unwrap_or_default(),
            "LLM response",
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(base_url: &str, model: &str) -> OpenAiChat {
        OpenAiChat::new(base_url.to_string(), "key".to_string(), model.to_string())
    }

    #[test]
    fn completions_url_keeps_v1_bases() {
        let c = chat("https://api.openai.com/v1", "gpt-4o-mini");
        assert_eq!(
            c.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn completions_url_appends_v1_for_deepseek() {
        let c = chat("https://api.deepseek.com", "deepseek");
        assert_eq!(
            c.completions_url(),
            "https://api.deepseek.com/v1/chat/completions"
        );
    }

    #[test]
    fn completions_url_strips_trailing_slash() {
        let c = chat("https://api.openai.com/v1/", "gpt-4o-mini");
        assert_eq!(
            c.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn model_alias_resolves() {
        assert_eq!(chat("http://x", "deepseek").resolved_model(), "deepseek-chat");
        assert_eq!(chat("http://x", " DeepSeek ").resolved_model(), "deepseek-chat");
        assert_eq!(chat("http://x", "gpt-4o-mini").resolved_model(), "gpt-4o-mini");
    }

    #[test]
    fn messages_summary_previews_content() {
        let messages = vec![
            ChatMessage::system("short"),
            ChatMessage::user("x".repeat(500)),
        ];
        let summary = OpenAiChat::messages_summary(&messages);
        assert!(summary.contains("[0] system(5 chars)"));
        assert!(summary.contains("[1] user(500 chars)"));
        assert!(summary.contains("..."));
    }
}
