//! Campaign draft types produced by the generation pipeline.

use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;

/// One generated ad variant.
///
/// Stage 2 fills the textual fields; stage 3 adds the full image prompt
/// and, when rendering is configured, the rendered image bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdVariant {
    pub segment_name: String,
    pub headline: String,
    pub body_text: String,
    pub cta: String,
    pub visual_concept: String,
    /// Short prompt proposed by stage 2 alongside the copy.
    pub image_prompt_short: String,
    /// Full prompt generated by stage 3.
    pub image_prompt: String,
    /// Rendered image bytes, when the image service produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
    /// Model's note on why this variant fits the segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// The complete generation result handed to delivery.
///
/// Owned exclusively by one run; never shared across chats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignDraft {
    pub analysis: Analysis,
    pub ads: Vec<AdVariant>,
    pub keywords: Vec<String>,
    pub objective: String,
}
