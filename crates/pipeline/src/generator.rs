//! Campaign generator: snapshot in, campaign draft out.
//!
//! Failure semantics: a stage whose response does not contain the expected
//! JSON aborts the whole run as [`GenerationError::Parse`]; collaborator
//! transport failures propagate as [`GenerationError::Transport`]. Image
//! rendering is the exception — one variant's rendering failure is logged
//! and skipped, never aborting the remaining variants or the draft.

use std::sync::Arc;

use serde_json::{json, Value};

use adsmith_core::{Analysis, AdVariant, CampaignDraft, GenerationError, SourceSnapshot};
use adsmith_imagegen::ImageRenderer;
use adsmith_llm::{extract_json_from_text, ChatMessage, ChatModel, LlmError};

use crate::prompts;

/// How many top posts are digested into the stage-1 prompt.
const DIGEST_LIMIT: usize = 15;

/// Aspect ratio requested for every rendered ad image.
const ASPECT_RATIO: &str = "1:1";

/// Longest raw-response preview written to the log on a parse failure.
const RAW_PREVIEW_CHARS: usize = 800;

/// Fallback segment name for ads the model left unlabeled.
const FALLBACK_SEGMENT: &str = "Аудитория";

/// The three-stage generation pipeline.
pub struct CampaignGenerator {
    chat: Arc<dyn ChatModel>,
    /// `None` when no image-rendering credential is configured; the
    /// pipeline then produces prompts but no rendered images.
    renderer: Option<Arc<dyn ImageRenderer>>,
}

impl CampaignGenerator {
    pub fn new(chat: Arc<dyn ChatModel>, renderer: Option<Arc<dyn ImageRenderer>>) -> Self {
        Self { chat, renderer }
    }

    /// Run all three stages over one snapshot.
    pub async fn generate(&self, snapshot: &SourceSnapshot) -> Result<CampaignDraft, GenerationError> {
        tracing::info!(group = %snapshot.group.name, "campaign: generation start");
        let analysis = self.stage1_analysis(snapshot).await?;
        let ads_raw = self.stage2_ads(&analysis).await?;
        let keywords = analysis.keywords();

        let mut ads = Vec::with_capacity(ads_raw.len());
        for raw in &ads_raw {
            let field = |key: &str| -> String {
                raw.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            let segment_name = raw
                .get("segment_name")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(FALLBACK_SEGMENT)
                .to_string();
            let headline = field("headline");
            let visual_concept = field("visual_concept");
            let segment_description = analysis.segment_description(&segment_name);
            let image_prompt = self
                .stage3_image_prompt(&headline, &visual_concept, &segment_description)
                .await?;
            ads.push(AdVariant {
                segment_name,
                headline,
                body_text: field("body_text"),
                cta: field("cta"),
                visual_concept,
                image_prompt_short: field("image_prompt_short"),
                image_prompt,
                image: None,
                reasoning: raw
                    .get("reasoning")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            });
        }

        if let Some(renderer) = &self.renderer {
            self.render_images(renderer.as_ref(), &mut ads).await;
        }

        tracing::info!(ads = ads.len(), "campaign: generation done");
        Ok(CampaignDraft {
            objective: analysis.objective(),
            analysis,
            ads,
            keywords,
        })
    }

    /// Stage 1: analyse the group and its top posts.
    async fn stage1_analysis(&self, snapshot: &SourceSnapshot) -> Result<Analysis, GenerationError> {
        tracing::info!(group = %snapshot.group.name, "campaign: stage1 analysis start");
        let digest: Vec<Value> = snapshot
            .top_by_engagement(DIGEST_LIMIT)
            .into_iter()
            .map(|post| {
                json!({
                    "text": post.text,
                    "engagement": post.engagement,
                    "likes": post.likes,
                    "comments": post.comments,
                    "reposts": post.reposts,
                    "views": post.views,
                })
            })
            .collect();
        let user = prompts::build_user_analysis(
            &snapshot.group.name,
            &snapshot.group.description,
            snapshot.group.members_count,
            &digest,
        );
        let raw = self
            .chat
            .complete(
                &[
                    ChatMessage::system(prompts::SYSTEM_ANALYSIS),
                    ChatMessage::user(user),
                ],
                true,
            )
            .await
            .map_err(transport)?;
        let value = extract_or_log("stage1", &raw)?;

        let mut analysis = Analysis::new(value);
        analysis.ensure_campaign_defaults();
        tracing::info!("campaign: stage1 analysis done");
        Ok(analysis)
    }

    /// Stage 2: ad copy per segment.
    ///
    /// An absent or non-list `ads` field degrades to an empty list.
    async fn stage2_ads(&self, analysis: &Analysis) -> Result<Vec<Value>, GenerationError> {
        tracing::info!("campaign: stage2 ads start");
        let analysis_json = serde_json::to_string_pretty(analysis.as_value())
            .unwrap_or_else(|_| "{}".to_string());
        let raw = self
            .chat
            .complete(
                &[
                    ChatMessage::system(prompts::SYSTEM_ADS),
                    ChatMessage::user(prompts::build_user_ads(&analysis_json)),
                ],
                true,
            )
            .await
            .map_err(transport)?;
        let value = extract_or_log("stage2", &raw)?;

        let ads = value
            .get("ads")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        tracing::info!(ads_count = ads.len(), "campaign: stage2 ads done");
        Ok(ads)
    }

    /// Stage 3: full image prompt for one variant (plain-text completion).
    async fn stage3_image_prompt(
        &self,
        headline: &str,
        visual_concept: &str,
        segment_description: &str,
    ) -> Result<String, GenerationError> {
        let raw = self
            .chat
            .complete(
                &[
                    ChatMessage::system(prompts::SYSTEM_IMAGE_PROMPT),
                    ChatMessage::user(prompts::build_user_image_prompt(
                        headline,
                        visual_concept,
                        segment_description,
                    )),
                ],
                false,
            )
            .await
            .map_err(transport)?;
        Ok(raw.trim().to_string())
    }

    /// Render an image per variant; failures are logged and skipped.
    async fn render_images(&self, renderer: &dyn ImageRenderer, ads: &mut [AdVariant]) {
        for (i, ad) in ads.iter_mut().enumerate() {
            if ad.image_prompt.is_empty() {
                continue;
            }
            match renderer.render(&ad.image_prompt, ASPECT_RATIO).await {
                Ok(Some(bytes)) => {
                    tracing::info!(ad = i + 1, size = bytes.len(), "campaign: image rendered");
                    ad.image = Some(bytes);
                }
                Ok(None) => {
                    tracing::warn!(ad = i + 1, "campaign: image rendering skipped");
                }
                Err(e) => {
                    tracing::warn!(ad = i + 1, error = %e, "campaign: image rendering failed");
                }
            }
        }
    }
}

fn transport(e: LlmError) -> GenerationError {
    GenerationError::Transport(e.to_string())
}

/// Extract a JSON object from a stage response, logging a raw preview on
/// failure so the malformed output can be diagnosed.
fn extract_or_log(stage: &str, raw: &str) -> Result<Value, GenerationError> {
    extract_json_from_text(raw).map_err(|e| {
        let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
        tracing::warn!(stage, error = %e, raw_preview = %preview, "campaign: JSON extraction failed");
        GenerationError::Parse(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Mutex;

    use adsmith_core::snapshot::{ContentItem, GroupInfo};
    use adsmith_imagegen::ImageGenError;

    /// Chat model replaying canned responses in order.
    struct ScriptedChat {
        responses: Mutex<Vec<String>>,
    }

    impl ScriptedChat {
        fn new(responses: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ChatModel for ScriptedChat {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _json_mode: bool,
        ) -> Result<String, LlmError> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .expect("scripted chat ran out of responses"))
        }
    }

    /// Renderer that succeeds or soft-fails per call, in order.
    struct ScriptedRenderer {
        outcomes: Mutex<Vec<Option<Vec<u8>>>>,
    }

    #[async_trait::async_trait]
    impl ImageRenderer for ScriptedRenderer {
        async fn render(
            &self,
            _prompt: &str,
            _aspect_ratio: &str,
        ) -> Result<Option<Vec<u8>>, ImageGenError> {
            Ok(self.outcomes.lock().unwrap().remove(0))
        }
    }

    fn snapshot() -> SourceSnapshot {
        let posts = (0..3)
            .map(|i| ContentItem {
                post_id: i,
                likes: 10 * (i + 1),
                comments: 5,
                reposts: 2,
                views: 100,
                engagement: adsmith_core::snapshot::engagement(10 * (i + 1), 5, 2, 100),
                text: format!("пост {i}"),
                posted_at: None,
            })
            .collect();
        SourceSnapshot {
            group: GroupInfo {
                id: 1,
                screen_name: "bikes".to_string(),
                name: "Велоклуб".to_string(),
                description: "Сообщество о велосипедах".to_string(),
                members_count: 1500,
                status: String::new(),
            },
            posts,
        }
    }

    const ANALYSIS_NO_CAMPAIGN: &str = r#"{
        "project_summary": "Велоклуб для городских райдеров",
        "audience_segments": [
            {"segment_name": "Новички", "description": "Первый велосипед", "age_range": "18-30", "gender": "all"}
        ],
        "keywords": ["велосипед", "город"]
    }"#;

    const TWO_ADS: &str = r#"{
        "ads": [
            {"segment_name": "Новички", "headline": "Первый велосипед", "body_text": "Текст 1",
             "cta": "Выбрать", "visual_concept": "город", "image_prompt_short": "city bike"},
            {"segment_name": "Профи", "headline": "Апгрейд", "body_text": "Текст 2",
             "cta": "Смотреть", "visual_concept": "трасса", "image_prompt_short": "race bike"}
        ]
    }"#;

    #[tokio::test]
    async fn missing_campaign_settings_get_documented_defaults() {
        let chat = ScriptedChat::new(vec![ANALYSIS_NO_CAMPAIGN, TWO_ADS, "prompt one", "prompt two"]);
        let generator = CampaignGenerator::new(chat, None);
        let draft = generator.generate(&snapshot()).await.unwrap();

        let vk = draft.analysis.campaign().expect("defaults installed");
        assert_eq!(vk["age_from"], 18);
        assert_eq!(vk["age_to"], 55);
        assert_eq!(vk["budget_daily_rub"], 500);
        assert_eq!(vk["bid_rub"], 15);
        assert_eq!(vk["country"], "1");
    }

    #[tokio::test]
    async fn maps_ads_and_fills_image_prompts() {
        let chat = ScriptedChat::new(vec![ANALYSIS_NO_CAMPAIGN, TWO_ADS, "prompt one", "prompt two"]);
        let generator = CampaignGenerator::new(chat, None);
        let draft = generator.generate(&snapshot()).await.unwrap();

        assert_eq!(draft.ads.len(), 2);
        assert_eq!(draft.ads[0].headline, "Первый велосипед");
        assert_eq!(draft.ads[0].image_prompt, "prompt one");
        assert_eq!(draft.ads[1].image_prompt, "prompt two");
        assert_eq!(draft.keywords, vec!["велосипед", "город"]);
        assert_eq!(draft.objective, "traffic");
        assert!(draft.ads.iter().all(|ad| ad.image.is_none()));
    }

    #[tokio::test]
    async fn non_list_ads_degrade_to_empty_draft() {
        let chat = ScriptedChat::new(vec![ANALYSIS_NO_CAMPAIGN, r#"{"ads": "нет"}"#]);
        let generator = CampaignGenerator::new(chat, None);
        let draft = generator.generate(&snapshot()).await.unwrap();
        assert!(draft.ads.is_empty());
    }

    #[tokio::test]
    async fn stage1_garbage_aborts_with_parse_error() {
        let chat = ScriptedChat::new(vec!["никакого JSON здесь нет"]);
        let generator = CampaignGenerator::new(chat, None);
        let result = generator.generate(&snapshot()).await;
        assert_matches!(result, Err(GenerationError::Parse(_)));
    }

    #[tokio::test]
    async fn one_failed_render_never_aborts_the_draft() {
        let chat = ScriptedChat::new(vec![ANALYSIS_NO_CAMPAIGN, TWO_ADS, "prompt one", "prompt two"]);
        let renderer = Arc::new(ScriptedRenderer {
            outcomes: Mutex::new(vec![Some(vec![1, 2, 3]), None]),
        });
        let generator = CampaignGenerator::new(chat, Some(renderer));
        let draft = generator.generate(&snapshot()).await.unwrap();

        assert_eq!(draft.ads.len(), 2);
        assert_eq!(draft.ads[0].image.as_deref(), Some(&[1u8, 2, 3][..]));
        assert!(draft.ads[1].image.is_none());
    }

    #[tokio::test]
    async fn unlabeled_ad_gets_fallback_segment() {
        let chat = ScriptedChat::new(vec![
            ANALYSIS_NO_CAMPAIGN,
            r#"{"ads": [{"headline": "Без сегмента"}]}"#,
            "prompt",
        ]);
        let generator = CampaignGenerator::new(chat, None);
        let draft = generator.generate(&snapshot()).await.unwrap();
        assert_eq!(draft.ads[0].segment_name, FALLBACK_SEGMENT);
        assert_eq!(draft.ads[0].body_text, "");
    }
}
