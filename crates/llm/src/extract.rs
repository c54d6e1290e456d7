//! Recover one JSON object from free-form generated text.
//!
//! Generation services wrap their JSON in commentary, restate it after a
//! correction, or prepend reasoning. The extractor scans for top-level
//! balanced-brace spans and parses candidates right to left: when a model
//! emits an object twice, the later copy is the corrected one.

use serde_json::Value;

/// Failure to recover a JSON object from a response.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The text contains no balanced top-level `{...}` span at all.
    #[error("JSON object not found in response")]
    NoObject,

    /// Spans were found but none of them parses as JSON.
    #[error("no valid JSON object found in response")]
    NoValidObject,
}

/// All top-level balanced-brace spans in `text`, left to right.
///
/// Nested objects are covered by their enclosing span and not reported
/// separately. An unbalanced opening brace yields no span; scanning
/// resumes one character past it.
fn find_json_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let Some(start) = bytes[i..].iter().position(|&b| b == b'{').map(|p| i + p) else {
            break;
        };
        let mut depth = 0usize;
        let mut end = None;
        for (j, &b) in bytes.iter().enumerate().skip(start) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(j + 1);
                        break;
                    }
                }
                _ => {}
            }
        }
        match end {
            Some(end) => {
                spans.push((start, end));
                i = end;
            }
            None => i = start + 1,
        }
    }
    spans
}

/// Extract the best-parsing JSON object from `text`.
///
/// Candidates are tried rightmost first; the first span that parses wins.
pub fn extract_json_from_text(text: &str) -> Result<Value, ExtractError> {
    let text = text.trim();
    let spans = find_json_spans(text);
    if spans.is_empty() {
        return Err(ExtractError::NoObject);
    }
    for &(start, end) in spans.iter().rev() {
        if let Ok(value) = serde_json::from_str::<Value>(&text[start..end]) {
            return Ok(value);
        }
    }
    Err(ExtractError::NoValidObject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_single_object() {
        let value = extract_json_from_text(r#"{"a": 1, "b": {"c": 2}}"#).unwrap();
        assert_eq!(value, json!({"a": 1, "b": {"c": 2}}));
    }

    #[test]
    fn surrounding_prose_is_ignored() {
        let text = "Вот результат анализа:\n{\"a\": 1}\nНадеюсь, это поможет!";
        assert_eq!(extract_json_from_text(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn later_object_wins_when_both_parse() {
        let text = r#"First draft: {"a": 1} — corrected: {"a": 2}"#;
        assert_eq!(extract_json_from_text(text).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn invalid_later_object_falls_back_to_earlier() {
        let text = r#"{"a": 1} trailing junk {"broken": }"#;
        assert_eq!(extract_json_from_text(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn invalid_first_valid_second_returns_second() {
        let text = r#"{"broken": } then {"a": 2}"#;
        assert_eq!(extract_json_from_text(text).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn no_braces_at_all() {
        assert!(matches!(
            extract_json_from_text("просто текст без JSON"),
            Err(ExtractError::NoObject)
        ));
    }

    #[test]
    fn truncated_object_fails_cleanly() {
        assert!(matches!(
            extract_json_from_text(r#"{"a": [1, 2"#),
            Err(ExtractError::NoObject)
        ));
    }

    #[test]
    fn truncated_outer_still_yields_balanced_inner() {
        // The outer object never closes; the balanced inner one is used.
        assert_eq!(
            extract_json_from_text(r#"{"a": {"b": 1}"#).unwrap(),
            json!({"b": 1})
        );
    }

    #[test]
    fn unbalanced_then_balanced_recovers() {
        let text = r#"{"cut off... {"a": 3}"#;
        // The first "{" never closes; scanning resumes inside it and finds
        // the balanced inner object.
        assert_eq!(extract_json_from_text(text).unwrap(), json!({"a": 3}));
    }

    #[test]
    fn round_trips_a_serialized_object() {
        let original = json!({
            "project_summary": "Сообщество о велосипедах",
            "keywords": ["велосипед", "спорт"],
            "vk_campaign": {"budget_daily_rub": 500},
        });
        let value = extract_json_from_text(&original.to_string()).unwrap();
        assert_eq!(value, original);
    }
}
