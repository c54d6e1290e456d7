//! Environment-backed configuration.
//!
//! Read once at startup. Required tokens fail fast with a user-readable
//! message; everything else has a sensible default.

/// Runtime configuration for the bot process.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub vk_access_token: String,
    pub vk_api_version: String,

    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,

    /// Image rendering is optional; without a key the pipeline produces
    /// prompts but no rendered images.
    pub gptunnel_api_key: Option<String>,
    pub gptunnel_image_model: String,
}

/// A required environment variable is missing or empty.
#[derive(Debug, thiserror::Error)]
#[error("Укажите {0} в .env")]
pub struct MissingVar(pub &'static str);

impl Config {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, MissingVar> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MissingVar> {
        let get = |name| lookup(name).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(MissingVar(name));

        Ok(Self {
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            vk_access_token: required("VK_ACCESS_TOKEN")?,
            vk_api_version: get("VK_API_VERSION").unwrap_or_else(|| "5.131".to_string()),
            llm_api_key: required("LLM_API_KEY")?,
            llm_base_url: get("LLM_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            gptunnel_api_key: get("GPTUNNEL_API_KEY"),
            gptunnel_image_model: get("GPTUNNEL_IMAGE_MODEL")
                .unwrap_or_else(|| "google-imagen-4".to_string()),
        })
    }
}
