use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// One-line rendering of a payload for table cells
pub fn payload_preview(payload: &Value, max_len: usize) -> String {
    let text = match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate_string(&text.replace('\n', " "), max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate_string("short", 10), "short");
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate_string("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_string("ééééééé", 5), "éé...");
    }

    #[test]
    fn payload_preview_strings_and_objects() {
        assert_eq!(payload_preview(&json!("line one\nline two"), 50), "line one line two");
        assert_eq!(payload_preview(&json!({"a": 1}), 50), r#"{"a":1}"#);
    }
}
