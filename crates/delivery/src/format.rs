//! Draft formatting: ordered deliverable blocks and text chunking.

use adsmith_core::ads_requests::build_ads_requests;
use adsmith_core::targeting::{country_label, gender_label, parse_age_range, region_list_labels};
use adsmith_core::{AdVariant, CampaignDraft};
use serde_json::Value;

/// At most this many keywords are shown in the keyword block.
const KEYWORDS_SHOWN: usize = 20;

/// One deliverable unit: text, optionally carrying a photo.
#[derive(Debug, Clone)]
pub struct Block {
    pub text: String,
    /// Raw rendered image bytes; prepared for transport at send time.
    pub photo: Option<Vec<u8>>,
}

impl Block {
    fn text_only(text: String) -> Self {
        Self { text, photo: None }
    }
}

/// Split `text` into consecutive fixed-width chunks of at most `limit`
/// characters.
///
/// A pure slice: no word-boundary handling, concatenation reproduces the
/// input exactly, and the result has `ceil(len / limit)` chunks.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    assert!(limit > 0, "chunk limit must be positive");
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Human-readable targeting line for one variant.
fn targeting_readout(ad: &AdVariant, draft: &CampaignDraft) -> String {
    let segment = draft.analysis.segment_by_name(&ad.segment_name);
    let campaign = draft.analysis.campaign();
    let get = |v: Option<&Value>, key: &str| -> Option<String> {
        v.and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let (age_from, age_to) = get(segment, "age_range")
        .as_deref()
        .and_then(parse_age_range)
        .unwrap_or_else(|| {
            let num = |key: &str, default: i64| {
                campaign
                    .and_then(|c| c.get(key))
                    .and_then(Value::as_i64)
                    .unwrap_or(default)
            };
            (num("age_from", 18), num("age_to", 55))
        });

    let gender = get(segment, "gender").unwrap_or_default();
    let geo = match get(campaign, "region_ids") {
        Some(regions) => region_list_labels(&regions).join(", "),
        None => {
            country_label(&get(campaign, "country").unwrap_or_else(|| "1".to_string())).to_string()
        }
    };

    format!("🎯 Таргетинг: {age_from}–{age_to}, {}, {geo}", gender_label(&gender))
}

/// One variant's block, numbered from 1.
fn format_ad_block(ad: &AdVariant, index: usize, draft: &CampaignDraft) -> String {
    let lines = [
        format!("━━━ Вариант {index} · {} ━━━", ad.segment_name),
        String::new(),
        format!("📌 Заголовок: {}", ad.headline),
        String::new(),
        "Текст:".to_string(),
        ad.body_text.clone(),
        String::new(),
        format!("CTA: {}", ad.cta),
        String::new(),
        format!("Визуальная концепция: {}", ad.visual_concept),
        String::new(),
        targeting_readout(ad, draft),
        String::new(),
        "🖼 Промпт для генерации изображения:".to_string(),
        ad.image_prompt.clone(),
        String::new(),
    ];
    lines.join("\n")
}

/// Render a draft into its ordered deliverable blocks.
///
/// Order: summary, content recommendations, keywords, one block per
/// variant (carrying its rendered image when present), then the VK Ads
/// API request preview.
pub fn format_campaign(draft: &CampaignDraft) -> Vec<Block> {
    let mut blocks = Vec::new();

    if let Some(summary) = draft.analysis.summary() {
        blocks.push(Block::text_only(format!("📊 Анализ группы\n\n{summary}")));
    }
    if let Some(recommendations) = draft.analysis.content_recommendations() {
        blocks.push(Block::text_only(format!(
            "💡 Рекомендации по контенту\n\n{recommendations}"
        )));
    }
    if !draft.keywords.is_empty() {
        let shown: Vec<&str> = draft
            .keywords
            .iter()
            .take(KEYWORDS_SHOWN)
            .map(String::as_str)
            .collect();
        blocks.push(Block::text_only(format!(
            "🏷 Ключевые слова для таргета: {}",
            shown.join(", ")
        )));
    }

    for (i, ad) in draft.ads.iter().enumerate() {
        blocks.push(Block {
            text: format_ad_block(ad, i + 1, draft),
            photo: ad.image.clone(),
        });
    }

    let requests = build_ads_requests(draft, "0");
    let payload = serde_json::json!({"vk_ads_api_requests": requests});
    blocks.push(Block::text_only("📤 Запросы в VK Ads API (JSON):".to_string()));
    blocks.push(Block::text_only(
        serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string()),
    ));

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsmith_core::Analysis;
    use serde_json::json;

    fn variant(segment: &str) -> AdVariant {
        AdVariant {
            segment_name: segment.to_string(),
            headline: "Заголовок".to_string(),
            body_text: "Текст".to_string(),
            cta: "Жми".to_string(),
            visual_concept: "концепция".to_string(),
            image_prompt_short: String::new(),
            image_prompt: "a bike at sunset".to_string(),
            image: None,
            reasoning: None,
        }
    }

    fn draft() -> CampaignDraft {
        let mut analysis = Analysis::new(json!({
            "project_summary": "Сообщество велосипедистов",
            "content_recommendations": "Больше видео",
            "audience_segments": [
                {"segment_name": "Новички", "description": "Первый велосипед",
                 "age_range": "18-30", "gender": "female"}
            ],
        }));
        analysis.ensure_campaign_defaults();
        CampaignDraft {
            analysis,
            ads: vec![variant("Новички")],
            keywords: (0..25).map(|i| format!("kw{i}")).collect(),
            objective: "traffic".to_string(),
        }
    }

    // -- Chunking --

    #[test]
    fn chunking_produces_ceil_len_over_limit_chunks() {
        let text = "абвгд".repeat(100); // 500 chars
        let chunks = chunk_text(&text, 150);
        assert_eq!(chunks.len(), 4); // ceil(500/150)
        assert!(chunks.iter().all(|c| c.chars().count() <= 150));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunking_exact_multiple_has_no_empty_tail() {
        let chunks = chunk_text(&"x".repeat(300), 100);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() == 100));
    }

    #[test]
    fn chunking_short_text_is_single_chunk() {
        assert_eq!(chunk_text("короткий", 4096), vec!["короткий"]);
    }

    #[test]
    fn chunking_empty_text_yields_no_chunks() {
        assert!(chunk_text("", 10).is_empty());
    }

    // -- Block order and contents --

    #[test]
    fn blocks_come_in_documented_order() {
        let blocks = format_campaign(&draft());
        assert!(blocks[0].text.starts_with("📊 Анализ группы"));
        assert!(blocks[1].text.starts_with("💡 Рекомендации"));
        assert!(blocks[2].text.starts_with("🏷 Ключевые слова"));
        assert!(blocks[3].text.contains("━━━ Вариант 1 · Новички ━━━"));
        assert!(blocks[4].text.starts_with("📤 Запросы в VK Ads API"));
        assert!(blocks[5].text.contains("vk_ads_api_requests"));
    }

    #[test]
    fn missing_summary_drops_its_block() {
        let mut d = draft();
        d.analysis = {
            let mut a = Analysis::new(json!({}));
            a.ensure_campaign_defaults();
            a
        };
        d.keywords.clear();
        let blocks = format_campaign(&d);
        assert!(blocks[0].text.contains("━━━ Вариант 1"));
    }

    #[test]
    fn keywords_are_capped_at_twenty() {
        let blocks = format_campaign(&draft());
        let keywords_block = &blocks[2].text;
        assert!(keywords_block.contains("kw19"));
        assert!(!keywords_block.contains("kw20"));
    }

    #[test]
    fn targeting_readout_uses_segment_and_region_table() {
        let blocks = format_campaign(&draft());
        let ad_block = &blocks[3].text;
        // Segment age range and gender; default region ids "1,77" mapped
        // through the code table.
        assert!(ad_block.contains("🎯 Таргетинг: 18–30, женщины, Москва, Московская область"));
    }

    #[test]
    fn targeting_readout_falls_back_to_campaign_defaults() {
        let mut d = draft();
        d.ads = vec![variant("Неизвестный сегмент")];
        let blocks = format_campaign(&d);
        assert!(blocks[3].text.contains("🎯 Таргетинг: 18–55, все"));
    }

    #[test]
    fn photo_bytes_ride_on_the_variant_block() {
        let mut d = draft();
        d.ads[0].image = Some(vec![9, 9, 9]);
        let blocks = format_campaign(&d);
        assert_eq!(blocks[3].photo.as_deref(), Some(&[9u8, 9, 9][..]));
        assert!(blocks[4].photo.is_none());
    }
}
