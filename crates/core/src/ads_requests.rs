//! VK Ads API request preview builder.
//!
//! Renders a [`CampaignDraft`] into the exact `ads.createCampaigns`,
//! `ads.createAdGroups` and `ads.createAds` request payloads that would be
//! sent to the VK Ads API. Entity ids that only exist after creation are
//! emitted as `{{campaign_id}}` / `{{ad_group_id}}` placeholders; the
//! `params.data` field is the JSON-encoded string the API expects.

use serde_json::{json, Value};

use crate::campaign::CampaignDraft;
use crate::targeting::resolve_targeting;

/// VK Ads campaign type for standard campaigns.
pub const CAMPAIGN_TYPE_DEFAULT: i64 = 1;
/// VK Ads format code for a community-post ad.
pub const AD_FORMAT_COMMUNITY_POST: i64 = 9;

/// Maximum name length accepted by the VK Ads API.
const NAME_MAX_CHARS: usize = 100;
/// Maximum ad title length.
const TITLE_MAX_CHARS: usize = 80;
/// Maximum ad description length.
const DESCRIPTION_MAX_CHARS: usize = 800;

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Build the ordered request payloads for a draft.
///
/// Each element has the shape `{"method": ..., "params": {...}}`.
pub fn build_ads_requests(draft: &CampaignDraft, account_id: &str) -> Vec<Value> {
    let vk = draft
        .analysis
        .campaign()
        .cloned()
        .unwrap_or_else(|| json!({}));

    let campaign_name = vk
        .get("campaign_name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| truncate_chars(draft.analysis.summary().unwrap_or("Кампания"), NAME_MAX_CHARS));
    let day_limit = vk.get("budget_daily_rub").and_then(Value::as_i64).unwrap_or(500) * 100;
    let all_limit = vk.get("budget_total_rub").and_then(Value::as_i64).unwrap_or(0) * 100;
    let link_url = vk
        .get("link_url")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("https://vk.com")
        .to_string();
    let bid_rub = vk
        .get("bid_rub")
        .and_then(Value::as_f64)
        .filter(|b| *b > 0.0)
        .unwrap_or(15.0);
    let bid = (bid_rub * 100.0) as i64;

    let mut requests = Vec::with_capacity(3);

    let campaign_data = json!([{
        "name": campaign_name,
        "type": CAMPAIGN_TYPE_DEFAULT,
        "day_limit": if day_limit > 0 { day_limit.to_string() } else { "0".to_string() },
        "all_limit": if all_limit > 0 { all_limit.to_string() } else { "0".to_string() },
    }]);
    requests.push(json!({
        "method": "ads.createCampaigns",
        "params": {
            "account_id": account_id,
            "data": campaign_data.to_string(),
        },
    }));

    // Ad groups: one per audience segment; when the analysis produced no
    // segments, fall back to one group per generated variant.
    let segments: Vec<Value> = if draft.analysis.segments().is_empty() {
        draft
            .ads
            .iter()
            .map(|ad| json!({"segment_name": ad.segment_name, "description": ""}))
            .collect()
    } else {
        draft.analysis.segments().to_vec()
    };

    let mut groups = Vec::with_capacity(segments.len());
    for (i, seg) in segments.iter().enumerate() {
        let name = seg
            .get("segment_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Группа {}", i + 1));
        let t = resolve_targeting(Some(seg), Some(&vk));
        let mut targeting = json!({
            "age_from": t.age_from,
            "age_to": t.age_to,
            "sex": t.sex,
            "country": t.country,
        });
        if let Some(regions) = &t.regions {
            targeting["regions"] = json!(regions);
        }
        if let Some(interests) = &t.interest_ids {
            targeting["interest_ids"] = json!(interests);
        }
        groups.push(json!({
            "name": truncate_chars(&name, NAME_MAX_CHARS),
            "campaign_id": "{{campaign_id}}",
            "day_limit": if day_limit > 0 { day_limit.to_string() } else { "0".to_string() },
            "bid": bid.to_string(),
            "targeting": targeting.to_string(),
        }));
    }
    requests.push(json!({
        "method": "ads.createAdGroups",
        "params": {
            "account_id": account_id,
            "campaign_id": "{{campaign_id}}",
            "data": Value::Array(groups).to_string(),
        },
    }));

    let mut ads = Vec::with_capacity(draft.ads.len());
    for (i, ad) in draft.ads.iter().enumerate() {
        let group_placeholder = if draft.ads.len() > 1 {
            format!("{{{{ad_group_id_{i}}}}}")
        } else {
            "{{ad_group_id}}".to_string()
        };
        let fallback_name = format!("Объявление {}", i + 1);
        let name = [
            ad.headline.as_str(),
            ad.segment_name.as_str(),
            fallback_name.as_str(),
        ]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(fallback_name.as_str())
        .to_string();
        ads.push(json!({
            "campaign_id": "{{campaign_id}}",
            "ad_group_id": group_placeholder,
            "name": truncate_chars(&name, NAME_MAX_CHARS),
            "link_url": link_url,
            "title": truncate_chars(&ad.headline, TITLE_MAX_CHARS),
            "description": truncate_chars(&ad.body_text, DESCRIPTION_MAX_CHARS),
            "ad_format": AD_FORMAT_COMMUNITY_POST.to_string(),
        }));
    }
    if ads.is_empty() {
        ads.push(json!({
            "campaign_id": "{{campaign_id}}",
            "ad_group_id": "{{ad_group_id}}",
            "name": truncate_chars(&campaign_name, NAME_MAX_CHARS),
            "link_url": link_url,
            "title": truncate_chars(&campaign_name, TITLE_MAX_CHARS),
            "description": "",
            "ad_format": AD_FORMAT_COMMUNITY_POST.to_string(),
        }));
    }
    requests.push(json!({
        "method": "ads.createAds",
        "params": {
            "account_id": account_id,
            "data": Value::Array(ads).to_string(),
        },
    }));

    requests
}

/// Same as [`build_ads_requests`] with `{{campaign_id}}` /
/// `{{ad_group_id}}` placeholders replaced by real ids.
///
/// Used for the post-creation preview once the campaign and groups exist.
pub fn build_ads_requests_resolved(
    draft: &CampaignDraft,
    account_id: &str,
    campaign_id: &str,
    ad_group_ids: &[String],
) -> Vec<Value> {
    let raw = build_ads_requests(draft, account_id);
    if campaign_id.is_empty() {
        return raw;
    }
    raw.into_iter()
        .map(|mut request| {
            if let Some(params) = request.get_mut("params").and_then(Value::as_object_mut) {
                if let Some(data) = params.get("data").and_then(Value::as_str) {
                    let mut data = data.replace("{{campaign_id}}", campaign_id);
                    for gid in ad_group_ids {
                        data = data.replacen("{{ad_group_id}}", gid, 1);
                    }
                    params.insert("data".to_string(), json!(data));
                }
                if params.get("campaign_id").and_then(Value::as_str) == Some("{{campaign_id}}") {
                    params.insert("campaign_id".to_string(), json!(campaign_id));
                }
            }
            request
        })
        .collect()
}
