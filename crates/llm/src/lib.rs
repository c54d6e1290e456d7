//! Generation-service collaborator: chat-completion client and the JSON
//! response extractor.
//!
//! The [`ChatModel`](client::ChatModel) trait is the seam the pipeline
//! depends on; [`OpenAiChat`](client::OpenAiChat) is the production
//! implementation for OpenAI-compatible endpoints (OpenAI, DeepSeek, Qwen).

pub mod client;
pub mod extract;

pub use client::{ChatMessage, ChatModel, LlmError, OpenAiChat};
pub use extract::{extract_json_from_text, ExtractError};
