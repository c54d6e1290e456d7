//! Prompt texts and user-prompt builders for the three pipeline stages.
//!
//! The system prompts pin down the exact JSON keys the generator reads;
//! anything else the model adds is carried along untouched.

use serde_json::Value;

/// Stage 1: group analysis.
pub const SYSTEM_ANALYSIS: &str = "\
Ты — опытный маркетолог-аналитик. Тебе дают описание сообщества ВКонтакте \
и его самые вовлекающие посты. Проанализируй тематику, аудиторию и стиль \
сообщества и верни СТРОГО один JSON-объект со следующими ключами:
- \"project_summary\": краткое описание проекта и его ценности (2-4 предложения);
- \"audience_segments\": массив из 2-4 сегментов аудитории, каждый объект \
{\"segment_name\", \"description\", \"age_range\" (например \"25-34\"), \"gender\" \
(\"male\", \"female\" или \"all\")};
- \"vk_campaign\": настройки кампании {\"campaign_name\", \"budget_daily_rub\", \
\"budget_total_rub\", \"link_url\", \"bid_type\", \"bid_rub\", \"age_from\", \"age_to\", \
\"country\", \"region_ids\", \"interest_ids\"};
- \"keywords\": массив из 10-20 ключевых слов для таргетинга;
- \"content_recommendations\": рекомендации по контенту (1-3 предложения);
- \"campaign_objective\": цель кампании, например \"traffic\" или \"leads\".
Отвечай только JSON, без пояснений.";

/// Stage 2: ad copy per segment.
pub const SYSTEM_ADS: &str = "\
Ты — копирайтер перформанс-рекламы ВКонтакте. На основе анализа сообщества \
составь рекламные объявления: по одному на каждый сегмент аудитории. Верни \
СТРОГО один JSON-объект вида {\"ads\": [...]}, где каждый элемент — объект \
{\"segment_name\", \"headline\" (до 40 символов), \"body_text\" (до 300 символов), \
\"cta\", \"visual_concept\", \"image_prompt_short\", \"reasoning\"}. \
Пиши по-русски, конкретно, без клише. Отвечай только JSON.";

/// Stage 3: full image prompt for one variant.
pub const SYSTEM_IMAGE_PROMPT: &str = "\
You write prompts for an image generation model. Given an ad headline, a \
visual concept and an audience description, produce ONE detailed English \
prompt for a photorealistic 1:1 advertising image. No text overlays, no \
logos, no watermarks. Reply with the prompt only.";

/// Build the stage-1 user prompt from the group identity and the digest
/// of its top posts.
pub fn build_user_analysis(
    group_name: &str,
    group_description: &str,
    members_count: i64,
    top_posts: &[Value],
) -> String {
    let posts_json =
        serde_json::to_string_pretty(top_posts).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Сообщество: {group_name}\n\
         Описание: {group_description}\n\
         Подписчиков: {members_count}\n\n\
         Самые вовлекающие посты (статистика и текст):\n{posts_json}"
    )
}

/// Build the stage-2 user prompt from the serialized stage-1 result.
pub fn build_user_ads(analysis_json: &str) -> String {
    format!("Анализ сообщества:\n{analysis_json}\n\nСоставь объявления по сегментам.")
}

/// Build the stage-3 user prompt for one variant.
pub fn build_user_image_prompt(
    headline: &str,
    visual_concept: &str,
    segment_description: &str,
) -> String {
    format!(
        "Headline: {headline}\n\
         Visual concept: {visual_concept}\n\
         Audience: {segment_description}"
    )
}
