//! Targeting value mapping: age ranges, gender codes and region names.
//!
//! Used both by the VK Ads request builder (numeric codes) and by the
//! delivery formatter (human-readable readout).

use serde_json::Value;

use crate::analysis::{DEFAULT_AGE_FROM, DEFAULT_AGE_TO, DEFAULT_COUNTRY};

/// VK Ads sex code for "any".
pub const SEX_ANY: i64 = 0;
/// VK Ads sex code for male-only targeting.
pub const SEX_MALE: i64 = 1;
/// VK Ads sex code for female-only targeting.
pub const SEX_FEMALE: i64 = 2;

/// Region id → display name for the targeting readout.
///
/// Unmapped ids fall back to the raw code.
const REGION_NAMES: &[(&str, &str)] = &[
    ("1", "Москва"),
    ("2", "Санкт-Петербург"),
    ("16", "Татарстан"),
    ("23", "Краснодарский край"),
    ("54", "Новосибирская область"),
    ("66", "Свердловская область"),
    ("77", "Московская область"),
    ("78", "Ленинградская область"),
];

/// Country code → display name.
const COUNTRY_NAMES: &[(&str, &str)] = &[("1", "Россия"), ("2", "Украина"), ("3", "Беларусь")];

/// Resolved targeting for one ad group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targeting {
    pub age_from: i64,
    pub age_to: i64,
    pub sex: i64,
    pub country: String,
    pub regions: Option<String>,
    pub interest_ids: Option<String>,
}

/// Parse an `"18-35"`-style age range; whitespace is ignored.
pub fn parse_age_range(raw: &str) -> Option<(i64, i64)> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let (from, to) = cleaned.split_once('-')?;
    Some((from.parse().ok()?, to.parse().ok()?))
}

/// Map a segment gender string to the VK Ads sex code.
pub fn sex_code(gender: &str) -> i64 {
    match gender.to_lowercase().as_str() {
        "male" => SEX_MALE,
        "female" => SEX_FEMALE,
        _ => SEX_ANY,
    }
}

/// Human-readable gender label for the delivery readout.
pub fn gender_label(gender: &str) -> &'static str {
    match gender.to_lowercase().as_str() {
        "male" => "мужчины",
        "female" => "женщины",
        _ => "все",
    }
}

/// Display name for a region id, falling back to the raw code.
pub fn region_label(code: &str) -> &str {
    REGION_NAMES
        .iter()
        .find(|(id, _)| *id == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Display name for a country code, falling back to the raw code.
pub fn country_label(code: &str) -> &str {
    COUNTRY_NAMES
        .iter()
        .find(|(id, _)| *id == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Render a comma-separated region id list as display names.
pub fn region_list_labels(region_ids: &str) -> Vec<String> {
    region_ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|code| region_label(code).to_string())
        .collect()
}

/// Resolve targeting for a segment against the campaign-level settings.
///
/// The segment's own `age_range` wins over the campaign `age_from`/`age_to`
/// when it parses; gender comes from the segment; country, regions and
/// interests come from the campaign settings.
pub fn resolve_targeting(segment: Option<&Value>, campaign: Option<&Value>) -> Targeting {
    let get_str = |v: Option<&Value>, key: &str| -> Option<String> {
        v.and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let get_i64 = |v: Option<&Value>, key: &str| -> Option<i64> {
        v.and_then(|v| v.get(key)).and_then(Value::as_i64)
    };

    let mut age_from = get_i64(campaign, "age_from").unwrap_or(DEFAULT_AGE_FROM);
    let mut age_to = get_i64(campaign, "age_to").unwrap_or(DEFAULT_AGE_TO);
    if let Some(range) = get_str(segment, "age_range").as_deref().and_then(parse_age_range) {
        (age_from, age_to) = range;
    }

    let gender = get_str(segment, "gender").unwrap_or_else(|| "all".to_string());

    Targeting {
        age_from,
        age_to,
        sex: sex_code(&gender),
        country: get_str(campaign, "country").unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        regions: get_str(campaign, "region_ids"),
        interest_ids: get_str(campaign, "interest_ids"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_age_range_accepts_spaces() {
        assert_eq!(parse_age_range("18 - 35"), Some((18, 35)));
        assert_eq!(parse_age_range("25-44"), Some((25, 44)));
    }

    #[test]
    fn parse_age_range_rejects_garbage() {
        assert_eq!(parse_age_range(""), None);
        assert_eq!(parse_age_range("18+"), None);
        assert_eq!(parse_age_range("abc-def"), None);
    }

    #[test]
    fn sex_codes_match_vk_ads() {
        assert_eq!(sex_code("male"), SEX_MALE);
        assert_eq!(sex_code("Female"), SEX_FEMALE);
        assert_eq!(sex_code("all"), SEX_ANY);
        assert_eq!(sex_code(""), SEX_ANY);
    }

    #[test]
    fn gender_labels_are_localized() {
        assert_eq!(gender_label("male"), "мужчины");
        assert_eq!(gender_label("female"), "женщины");
        assert_eq!(gender_label("other"), "все");
    }

    #[test]
    fn region_label_falls_back_to_raw_code() {
        assert_eq!(region_label("1"), "Москва");
        assert_eq!(region_label("9999"), "9999");
    }

    #[test]
    fn region_list_labels_splits_and_maps() {
        assert_eq!(
            region_list_labels("1, 2,9999"),
            vec!["Москва", "Санкт-Петербург", "9999"]
        );
    }

    #[test]
    fn resolve_targeting_prefers_segment_age_range() {
        let segment = json!({"age_range": "25-34", "gender": "female"});
        let campaign = json!({"age_from": 18, "age_to": 55, "country": "1"});
        let t = resolve_targeting(Some(&segment), Some(&campaign));
        assert_eq!((t.age_from, t.age_to), (25, 34));
        assert_eq!(t.sex, SEX_FEMALE);
        assert_eq!(t.country, "1");
    }

    #[test]
    fn resolve_targeting_uses_documented_defaults() {
        let t = resolve_targeting(None, None);
        assert_eq!((t.age_from, t.age_to), (18, 55));
        assert_eq!(t.sex, SEX_ANY);
        assert_eq!(t.country, "1");
        assert_eq!(t.regions, None);
        assert_eq!(t.interest_ids, None);
    }
}
