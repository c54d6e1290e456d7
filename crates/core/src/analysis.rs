//! Typed facade over the schema-flexible stage-1 analysis document.
//!
//! The generation service returns an open JSON object. [`Analysis`] keeps
//! it as `serde_json::Value` and exposes accessors that substitute the
//! documented defaults for anything the model left out, so downstream code
//! never has to probe raw keys.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default daily budget in rubles when the model omits campaign settings.
pub const DEFAULT_BUDGET_DAILY_RUB: i64 = 500;
/// Default total budget in rubles.
pub const DEFAULT_BUDGET_TOTAL_RUB: i64 = 10_000;
/// Default per-click bid in rubles.
pub const DEFAULT_BID_RUB: i64 = 15;
/// Default bid type.
pub const DEFAULT_BID_TYPE: &str = "cpc";
/// Default audience age bounds.
pub const DEFAULT_AGE_FROM: i64 = 18;
pub const DEFAULT_AGE_TO: i64 = 55;
/// Default country code (Russia).
pub const DEFAULT_COUNTRY: &str = "1";
/// Default region id list.
pub const DEFAULT_REGION_IDS: &str = "1,77";
/// Fallback campaign name when the summary is empty too.
pub const DEFAULT_CAMPAIGN_NAME: &str = "Кампания";

/// Maximum campaign-name length taken from the project summary.
const CAMPAIGN_NAME_MAX_CHARS: usize = 80;

/// The stage-1 analysis document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Analysis(Value);

impl Analysis {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The raw document, for serializing back into a stage-2 prompt.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Narrative project summary, when present and non-empty.
    pub fn summary(&self) -> Option<&str> {
        self.0
            .get("project_summary")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Content recommendations paragraph, when present and non-empty.
    pub fn content_recommendations(&self) -> Option<&str> {
        self.0
            .get("content_recommendations")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Targeting keyword list; empty when absent or malformed.
    pub fn keywords(&self) -> Vec<String> {
        self.0
            .get("keywords")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Campaign objective tag, defaulting to `"traffic"`.
    pub fn objective(&self) -> String {
        self.0
            .get("campaign_objective")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("traffic")
            .to_string()
    }

    /// Audience segments as raw objects; empty when absent.
    pub fn segments(&self) -> &[Value] {
        self.0
            .get("audience_segments")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The segment object whose `segment_name` matches exactly.
    pub fn segment_by_name(&self, name: &str) -> Option<&Value> {
        self.segments()
            .iter()
            .find(|seg| seg.get("segment_name").and_then(Value::as_str) == Some(name))
    }

    /// Description of the named segment, falling back to the raw name when
    /// no segment matches or the match has no description.
    pub fn segment_description(&self, name: &str) -> String {
        self.segment_by_name(name)
            .and_then(|seg| seg.get("description").and_then(Value::as_str))
            .unwrap_or(name)
            .to_string()
    }

    /// The `vk_campaign` settings sub-object, when present.
    pub fn campaign(&self) -> Option<&Value> {
        self.0.get("vk_campaign").filter(|v| v.is_object())
    }

    /// Install the default `vk_campaign` sub-object if the model omitted
    /// it (or produced something that is not an object).
    pub fn ensure_campaign_defaults(&mut self) {
        if self.campaign().is_some() {
            return;
        }
        let name: String = self
            .summary()
            .unwrap_or(DEFAULT_CAMPAIGN_NAME)
            .chars()
            .take(CAMPAIGN_NAME_MAX_CHARS)
            .collect();
        let defaults = json!({
            "campaign_name": name,
            "budget_daily_rub": DEFAULT_BUDGET_DAILY_RUB,
            "budget_total_rub": DEFAULT_BUDGET_TOTAL_RUB,
            "link_url": "https://vk.com",
            "bid_type": DEFAULT_BID_TYPE,
            "bid_rub": DEFAULT_BID_RUB,
            "age_from": DEFAULT_AGE_FROM,
            "age_to": DEFAULT_AGE_TO,
            "country": DEFAULT_COUNTRY,
            "region_ids": DEFAULT_REGION_IDS,
            "interest_ids": "",
        });
        if let Some(obj) = self.0.as_object_mut() {
            obj.insert("vk_campaign".to_string(), defaults);
        }
    }
}
