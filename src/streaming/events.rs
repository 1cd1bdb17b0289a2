use axum::response::sse::Event;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Thinking,
    Text,
    Image,
    Done,
}

/// One frame of the `/ask` response stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

pub const THINKING_MESSAGE: &str = "Let me think about that...";

impl StreamEvent {
    pub fn new(event_type: EventType, content: impl Into<String>) -> Self {
        Self {
            event_type,
            content: content.into(),
            metadata: Map::new(),
        }
    }

    pub fn thinking() -> Self {
        Self::new(EventType::Thinking, THINKING_MESSAGE)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(EventType::Text, content)
    }

    pub fn done() -> Self {
        Self::new(EventType::Done, "")
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "type": self.event_type,
            "content": self.content,
        });
        if !self.metadata.is_empty() {
            value["metadata"] = Value::Object(self.metadata.clone());
        }
        value
    }

    /// `data: {json}\n\n`
    pub fn to_sse(&self) -> String {
        format!("data: {}\n\n", self.to_json())
    }

    /// Parses one `data:` frame back into an event.
    pub fn from_sse(frame: &str) -> Option<Self> {
        let data = frame
            .lines()
            .find_map(|line| line.strip_prefix("data:"))?
            .trim();
        serde_json::from_str(data).ok()
    }
}

impl From<&StreamEvent> for Event {
    fn from(event: &StreamEvent) -> Self {
        Event::default().data(event.to_json().to_string())
    }
}

impl From<StreamEvent> for Event {
    fn from(event: StreamEvent) -> Self {
        Event::from(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frame_without_metadata() {
        assert_eq!(
            StreamEvent::text("Hi").to_sse(),
            "data: {\"content\":\"Hi\",\"type\":\"text\"}\n\n"
        );
    }

    #[test]
    fn metadata_is_included_when_present() {
        let frame = StreamEvent::done().with_metadata("error", "upstream failed").to_sse();
        let parsed: Value = serde_json::from_str(frame.trim().trim_start_matches("data: ")).unwrap();
        assert_eq!(parsed["type"], "done");
        assert_eq!(parsed["metadata"]["error"], "upstream failed");
    }

    #[test]
    fn thinking_carries_fixed_message() {
        let event = StreamEvent::thinking();
        assert_eq!(event.event_type, EventType::Thinking);
        assert_eq!(event.content, THINKING_MESSAGE);
    }

    #[test]
    fn frames_parse_back() {
        let event = StreamEvent::text("The moon glows.").with_metadata("chunk", 3);
        assert_eq!(StreamEvent::from_sse(&event.to_sse()), Some(event));
        assert_eq!(StreamEvent::from_sse("event: ping\n\n"), None);
    }

    #[test]
    fn missing_content_defaults_to_empty() {
        let event = StreamEvent::from_sse("data: {\"type\":\"done\"}\n\n").unwrap();
        assert_eq!(event, StreamEvent::done());
    }
}
