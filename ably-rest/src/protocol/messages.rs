// Message types exchanged with the REST channel endpoints

use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::collections::HashMap;

/// Message payload
///
/// On the JSON wire data is always a string or a JSON value; binary data
/// only exists before encoding or after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageData {
    Text(String),
    Binary(Vec<u8>),
    Json(Value),
}

impl MessageData {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MessageData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            MessageData::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            MessageData::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for MessageData {
    fn from(text: &str) -> Self {
        MessageData::Text(text.to_string())
    }
}

impl From<String> for MessageData {
    fn from(text: String) -> Self {
        MessageData::Text(text)
    }
}

impl From<Vec<u8>> for MessageData {
    fn from(bytes: Vec<u8>) -> Self {
        MessageData::Binary(bytes)
    }
}

impl From<&[u8]> for MessageData {
    fn from(bytes: &[u8]) -> Self {
        MessageData::Binary(bytes.to_vec())
    }
}

impl From<Value> for MessageData {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => MessageData::Text(text),
            other => MessageData::Json(other),
        }
    }
}

impl Serialize for MessageData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MessageData::Text(text) => serializer.serialize_str(text),
            MessageData::Json(value) => value.serialize(serializer),
            MessageData::Binary(_) => Err(S::Error::custom(
                "binary data must be encoded before serialization",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for MessageData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(MessageData::from)
    }
}

/// Message structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessageData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<HashMap<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Message {
    /// Create a message with a name and payload
    pub fn new(name: impl Into<String>, data: impl Into<MessageData>) -> Self {
        Self {
            name: Some(name.into()),
            data: Some(data.into()),
            ..Default::default()
        }
    }

    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Text payload, if the data is text
    pub fn text(&self) -> Option<&str> {
        self.data.as_ref().and_then(MessageData::as_str)
    }
}

/// Builder for outbound messages
#[derive(Debug, Default)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.message.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.message.name = Some(name.into());
        self
    }

    pub fn data(mut self, data: impl Into<MessageData>) -> Self {
        self.message.data = Some(data.into());
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.message.encoding = Some(encoding.into());
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.message.client_id = Some(client_id.into());
        self
    }

    pub fn extras(mut self, extras: HashMap<String, Value>) -> Self {
        self.message.extras = Some(extras);
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}

/// Presence message structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub action: PresenceAction,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessageData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Presence action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PresenceAction {
    Absent = 0,
    Present = 1,
    Enter = 2,
    Leave = 3,
    Update = 4,
}

/// Error information returned in failed response bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub code: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorInfo>>,
}
