//! Stream events and their NDJSON encoding

use crate::types::Reference;
use serde::{Deserialize, Serialize};

/// One record of the `/api/chat` response stream.
///
/// Encoded as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Progress text
    Status(String),
    /// Merged citations from every provider
    Sources(Vec<Reference>),
    /// A chunk of the final answer
    Content(String),
    /// Terminal failure visible to the user
    Error(String),
}

impl StreamEvent {
    pub fn status(text: impl Into<String>) -> Self {
        StreamEvent::Status(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        StreamEvent::Error(text.into())
    }

    /// Wire name of the event type
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Status(_) => "status",
            StreamEvent::Sources(_) => "sources",
            StreamEvent::Content(_) => "content",
            StreamEvent::Error(_) => "error",
        }
    }

    /// Encode as a single newline-terminated JSON line.
    pub fn to_ndjson(&self) -> String {
        match serde_json::to_string(self) {
            Ok(mut line) => {
                line.push('\n');
                line
            }
            // Unreachable for these payloads, but the stream must stay well-formed
            Err(e) => format!(
                "{}\n",
                serde_json::json!({"type": "error", "data": format!("Failed to encode event: {}", e)})
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let line = StreamEvent::status("working").to_ndjson();
        assert_eq!(line, "{\"type\":\"status\",\"data\":\"working\"}\n");
    }

    #[test]
    fn test_sources_line() {
        let event = StreamEvent::Sources(vec![Reference {
            label: "[m] t".to_string(),
            url: "https://x.example".to_string(),
        }]);
        let value: serde_json::Value = serde_json::from_str(event.to_ndjson().trim_end()).unwrap();

        assert_eq!(value["type"], "sources");
        assert_eq!(value["data"][0]["title"], "[m] t");
        assert_eq!(value["data"][0]["url"], "https://x.example");
    }

    #[test]
    fn test_non_ascii_is_not_escaped() {
        let line = StreamEvent::Content("量子".to_string()).to_ndjson();
        assert!(line.contains("量子"));
    }

    #[test]
    fn test_every_kind_has_exactly_type_and_data() {
        let events = vec![
            StreamEvent::status("s"),
            StreamEvent::Sources(vec![]),
            StreamEvent::Content("c".to_string()),
            StreamEvent::error("e"),
        ];

        for event in events {
            let line = event.to_ndjson();
            assert!(line.ends_with('\n'));
            assert_eq!(line.matches('\n').count(), 1);

            let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
            let object = value.as_object().unwrap();
            assert_eq!(object.len(), 2);
            assert_eq!(object["type"], event.kind());
            assert!(object.contains_key("data"));
        }
    }

    #[test]
    fn test_content_with_newlines_stays_on_one_line() {
        let line = StreamEvent::Content("a\nb".to_string()).to_ndjson();
        assert_eq!(line.matches('\n').count(), 1);
    }
}
