//! Decoding of the provider's raw reply

use crate::error::{self, Result};

/// Remove every markdown fence marker and trim.
///
/// Models wrap JSON in "```json ... ```" despite being told not to. All
/// markers are removed wherever they appear, not just at the ends.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Strip fences and decode the remainder as JSON.
///
/// Any JSON value is accepted; the shape is trusted once it parses.
pub fn decode_reply(raw: &str) -> Result<serde_json::Value> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(&cleaned).map_err(|e| error::invalid_response(raw).set_source(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_strip_fenced_empty_array() {
        assert_eq!(strip_code_fences("```json\n[]\n```"), "[]");
        assert_eq!(decode_reply("```json\n[]\n```").unwrap(), json!([]));
    }

    #[test]
    fn test_strip_bare_fence() {
        let raw = "```\n[{\"x\":0,\"y\":0,\"z\":0,\"color\":\"#fff\"}]\n```\n";
        assert_eq!(
            decode_reply(raw).unwrap(),
            json!([{"x": 0, "y": 0, "z": 0, "color": "#fff"}])
        );
    }

    #[test]
    fn test_unfenced_passthrough() {
        assert_eq!(decode_reply("  [1, 2]  ").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let err = decode_reply("Here is your voxel model: [").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResponseMalformed);
        assert_eq!(err.message(), "Invalid response from AI");
        assert_eq!(err.context_value("raw"), Some("Here is your voxel model: ["));
        assert!(err.source_ref().is_some());
    }

    #[test]
    fn test_empty_after_strip_is_format_error() {
        let err = decode_reply("```json\n```").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResponseMalformed);
    }
}
