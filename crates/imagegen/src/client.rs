//! gptunnel media API client.
//!
//! Wraps the create / result / download round trip behind the
//! [`ImageRenderer`] trait. Service-side failures (non-zero codes, failed
//! jobs, timeouts, empty assets) are soft: they log a warning and yield
//! `Ok(None)` so the caller can skip the image. Only transport-level
//! failures surface as errors.

use std::time::Duration;

use serde_json::Value;

use crate::poll::{poll_until_done, PollOutcome, PollStatus};

/// Base URL of the gptunnel media API.
pub const GPTUNNEL_MEDIA_BASE: &str = "https://gptunnel.ru/v1/media";

/// Interval between result polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Maximum total wait for a rendering job.
pub const POLL_MAX_WAIT: Duration = Duration::from_secs(120);

/// Request timeout for a single HTTP call; slightly above the poll budget
/// so the create call can never outlive the whole job.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(130);

/// Errors from the image-rendering collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status code.
    #[error("image API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for diagnosis.
        body: String,
    },
}

/// The seam between the pipeline and the image-rendering service.
#[async_trait::async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Render `prompt` into image bytes, or `None` on a soft failure.
    async fn render(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<Option<Vec<u8>>, ImageGenError>;
}

/// Production [`ImageRenderer`] over the gptunnel media API.
pub struct GptunnelClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GptunnelClient {
    /// Create a client with the production base URL.
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(GPTUNNEL_MEDIA_BASE.to_string(), api_key, model)
    }

    /// Create a client against a specific base URL.
    pub fn with_base_url(base_url: String, api_key: String, model: String) -> Self {
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

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ImageGenError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .header("Authorization", &self.api_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGenError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// One poll of the result endpoint, mapped to a [`PollStatus`].
    async fn fetch_status(&self, task_id: &str) -> Result<PollStatus, ImageGenError> {
        let result = self
            .post_json("result", &serde_json::json!({"task_id": task_id}))
            .await?;
        if result.get("code").and_then(Value::as_i64) != Some(0) {
            tracing::warn!(task_id, response = %result, "gptunnel result returned an error code");
            return Ok(PollStatus::Failed);
        }
        match result.get("status").and_then(Value::as_str) {
            Some("done") => match result.get("url").and_then(Value::as_str) {
                Some(url) if !url.is_empty() => Ok(PollStatus::Done(url.to_string())),
                _ => {
                    tracing::warn!(task_id, response = %result, "gptunnel job done but no url");
                    Ok(PollStatus::Failed)
                }
            },
            Some("failed") | Some("error") => {
                tracing::warn!(task_id, response = %result, "gptunnel job failed");
                Ok(PollStatus::Failed)
            }
            _ => Ok(PollStatus::Pending),
        }
    }

    async fn download(&self, url: &str) -> Result<Option<Vec<u8>>, ImageGenError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGenError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            tracing::warn!(url, "gptunnel asset download returned an empty body");
            return Ok(None);
        }
        tracing::info!(url, size = bytes.len(), "downloaded rendered image");
        Ok(Some(bytes.to_vec()))
    }
}

#[async_trait::async_trait]
impl ImageRenderer for GptunnelClient {
    async fn render(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<Option<Vec<u8>>, ImageGenError> {
        let created = self
            .post_json(
                "create",
                &serde_json::json!({
                    "model": self.model,
                    "prompt": prompt,
                    "ar": aspect_ratio,
                }),
            )
            .await?;

        if created.get("code").and_then(Value::as_i64) != Some(0) {
            tracing::warn!(response = %created, "gptunnel create failed");
            return Ok(None);
        }
        let Some(task_id) = created.get("id").and_then(Value::as_str).filter(|s| !s.is_empty())
        else {
            tracing::warn!(response = %created, "gptunnel create returned no task id");
            return Ok(None);
        };

        tracing::info!(task_id, "gptunnel job created, polling for result");
        let outcome = poll_until_done(POLL_INTERVAL, POLL_MAX_WAIT, || {
            self.fetch_status(task_id)
        })
        .await?;

        match outcome {
            PollOutcome::Done(url) => self.download(&url).await,
            PollOutcome::Failed => Ok(None),
            PollOutcome::TimedOut => {
                tracing::warn!(task_id, "gptunnel job timed out");
                Ok(None)
            }
        }
    }
}
