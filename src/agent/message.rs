//! Agent messages
//!
//! The structured unit agents use to hand work to one another. A message is
//! built by the sending agent, handed to the orchestrator's relay, validated,
//! delivered once, and dropped.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Timestamp layout used by messages
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Well-known message types
pub mod message_type {
    /// Delegate part of a task to another agent
    pub const HANDOFF: &str = "handoff";
    /// Ask another agent for something
    pub const REQUEST: &str = "request";
    /// Answer to a previous request
    pub const RESPONSE: &str = "response";
}

/// A message passed between agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    sender: String,
    receiver: String,
    message_type: String,
    content: String,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(default = "now")]
    timestamp: String,
}

fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

impl AgentMessage {
    /// Create a message stamped with the current local time
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        message_type: impl Into<String>,
        content: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            message_type: message_type.into(),
            content: content.into(),
            metadata,
            timestamp: now(),
        }
    }

    /// Create a handoff with no metadata
    pub fn handoff(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(sender, receiver, message_type::HANDOFF, content, Map::new())
    }

    /// Create a request with no metadata
    pub fn request(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(sender, receiver, message_type::REQUEST, content, Map::new())
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    // Setters are only meaningful before the message reaches the relay; the
    // relay takes the message by value.

    pub fn set_sender(&mut self, sender: impl Into<String>) {
        self.sender = sender.into();
    }

    pub fn set_receiver(&mut self, receiver: impl Into<String>) {
        self.receiver = receiver.into();
    }

    pub fn set_message_type(&mut self, message_type: impl Into<String>) {
        self.message_type = message_type.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_metadata(&mut self, metadata: Map<String, Value>) {
        self.metadata = metadata;
    }

    pub fn set_timestamp(&mut self, timestamp: impl Into<String>) {
        self.timestamp = timestamp.into();
    }

    /// Insert a single metadata entry, builder style
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Flatten into a mapping
    pub fn to_dict(&self) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert("sender".into(), Value::String(self.sender.clone()));
        dict.insert("receiver".into(), Value::String(self.receiver.clone()));
        dict.insert(
            "message_type".into(),
            Value::String(self.message_type.clone()),
        );
        dict.insert("content".into(), Value::String(self.content.clone()));
        dict.insert("metadata".into(), Value::Object(self.metadata.clone()));
        dict.insert("timestamp".into(), Value::String(self.timestamp.clone()));
        dict
    }

    /// Rebuild from a mapping produced by [`AgentMessage::to_dict`]
    ///
    /// Missing string fields become empty, missing metadata becomes empty, and
    /// a missing timestamp is freshly stamped.
    pub fn from_dict(dict: &Map<String, Value>) -> Self {
        let field = |key: &str| {
            dict.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let metadata = dict
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let timestamp = dict
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(now);

        Self {
            sender: field("sender"),
            receiver: field("receiver"),
            message_type: field("message_type"),
            content: field("content"),
            metadata,
            timestamp,
        }
    }
}
