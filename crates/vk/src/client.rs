//! VK API client producing source snapshots.

use std::time::Duration;

use chrono::DateTime;
use serde_json::Value;

use adsmith_core::snapshot::{engagement, ContentItem, GroupInfo, SourceSnapshot};

use crate::link::parse_group_link;

/// VK API method base URL.
const VK_API_BASE: &str = "https://api.vk.com/method";

/// Request timeout for a single VK API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the content-source collaborator.
#[derive(Debug, thiserror::Error)]
pub enum VkError {
    /// The link does not contain a usable group reference. User-facing.
    #[error("Не удалось извлечь ID или короткое имя группы из ссылки")]
    BadLink,

    /// The referenced group does not exist or is inaccessible. User-facing.
    #[error("Группа не найдена")]
    GroupNotFound,

    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// VK returned an error payload.
    #[error("VK API error {code}: {message}")]
    Api {
        /// VK error code.
        code: i64,
        /// VK error message.
        message: String,
    },
}

impl From<VkError> for adsmith_core::GenerationError {
    fn from(e: VkError) -> Self {
        match e {
            VkError::BadLink | VkError::GroupNotFound => {
                adsmith_core::GenerationError::Validation(e.to_string())
            }
            VkError::Request(_) | VkError::Api { .. } => {
                adsmith_core::GenerationError::Transport(e.to_string())
            }
        }
    }
}

/// HTTP client for the VK API.
pub struct VkClient {
    client: reqwest::Client,
    access_token: String,
    api_version: String,
}

impl VkClient {
    pub fn new(access_token: String, api_version: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest HTTP client");
        Self {
            client,
            access_token,
            api_version,
        }
    }

    /// Call one VK API method and unwrap its `response` envelope.
    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Value, VkError> {
        let mut query: Vec<(&str, &str)> = vec![
            ("access_token", self.access_token.as_str()),
            ("v", self.api_version.as_str()),
        ];
        query.extend_from_slice(params);

        let data: Value = self
            .client
            .get(format!("{VK_API_BASE}/{method}"))
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = data.get("error") {
            return Err(VkError::Api {
                code: error.get("error_code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("error_msg")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }
        Ok(data.get("response").cloned().unwrap_or(Value::Null))
    }

    /// Resolve a pasted group link into a snapshot of the group and its
    /// `posts_count` most recent wall posts.
    pub async fn fetch_group_snapshot(
        &self,
        link: &str,
        posts_count: u32,
    ) -> Result<SourceSnapshot, VkError> {
        tracing::info!(link, posts_count, "vk: fetching group snapshot");
        let group_ref = parse_group_link(link).ok_or(VkError::BadLink)?;

        let response = self
            .call("groups.getById", &[("group_ids", group_ref.as_str())])
            .await?;
        // 5.131 returns a bare array; newer versions wrap it in `groups`.
        let groups = response
            .get("groups")
            .and_then(Value::as_array)
            .or_else(|| response.as_array())
            .cloned()
            .unwrap_or_default();
        let raw = groups.first().ok_or(VkError::GroupNotFound)?;

        let group = GroupInfo {
            id: raw.get("id").and_then(Value::as_i64).unwrap_or(0),
            screen_name: str_field(raw, "screen_name"),
            name: str_field(raw, "name"),
            description: str_field(raw, "description"),
            members_count: raw.get("members_count").and_then(Value::as_i64).unwrap_or(0),
            status: match raw.get("status") {
                Some(Value::Object(obj)) => obj
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => String::new(),
            },
        };
        if group.id == 0 {
            return Err(VkError::GroupNotFound);
        }

        let owner_id = (-group.id).to_string();
        let count = posts_count.to_string();
        let wall = self
            .call(
                "wall.get",
                &[
                    ("owner_id", owner_id.as_str()),
                    ("count", count.as_str()),
                    ("filter", "owner"),
                ],
            )
            .await?;

        let posts: Vec<ContentItem> = wall
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(parse_post).collect())
            .unwrap_or_default();

        tracing::info!(
            group = %group.name,
            members = group.members_count,
            posts = posts.len(),
            "vk: snapshot ready",
        );
        Ok(SourceSnapshot { group, posts })
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn counter(item: &Value, key: &str) -> i64 {
    item.get(key)
        .and_then(|v| v.get("count"))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

fn parse_post(item: &Value) -> ContentItem {
    let likes = counter(item, "likes");
    let comments = counter(item, "comments");
    let reposts = counter(item, "reposts");
    let views = counter(item, "views");
    ContentItem {
        post_id: item.get("id").and_then(Value::as_i64).unwrap_or(0),
        likes,
        comments,
        reposts,
        views,
        engagement: engagement(likes, comments, reposts, views),
        text: str_field(item, "text").trim().to_string(),
        posted_at: item
            .get("date")
            .and_then(Value::as_i64)
            .and_then(|ts| DateTime::from_timestamp(ts, 0)),
    }
}
