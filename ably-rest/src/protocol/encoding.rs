// Data encoding chains for message payloads
//
// An encoding is a `/`-separated list of transforms, applied left to right
// when publishing and undone right to left when reading history.

use crate::error::{AblyError, AblyErrorCode, AblyResult};
use crate::protocol::messages::{Message, MessageData, PresenceMessage};
use base64::Engine;

/// Encoding types
pub const UTF8: &str = "utf-8";
pub const JSON: &str = "json";
pub const BASE64: &str = "base64";

/// Anything carrying a payload together with its encoding chain
pub trait EncodedData {
    fn payload_mut(&mut self) -> (&mut Option<MessageData>, &mut Option<String>);
}

impl EncodedData for Message {
    fn payload_mut(&mut self) -> (&mut Option<MessageData>, &mut Option<String>) {
        (&mut self.data, &mut self.encoding)
    }
}

impl EncodedData for PresenceMessage {
    fn payload_mut(&mut self) -> (&mut Option<MessageData>, &mut Option<String>) {
        (&mut self.data, &mut self.encoding)
    }
}

/// Prepare a payload for the JSON wire.
///
/// Text without an encoding is marked `utf-8`; binary becomes base64 text;
/// JSON objects and arrays are stringified.
pub fn encode<T: EncodedData>(item: &mut T) -> AblyResult<()> {
    let (data, encoding) = item.payload_mut();

    let Some(payload) = data.take() else {
        return Ok(());
    };

    let (encoded, step) = match payload {
        MessageData::Text(text) => {
            if encoding.as_deref().map_or(true, str::is_empty) {
                *encoding = Some(UTF8.to_string());
            }
            (MessageData::Text(text), None)
        }
        MessageData::Binary(bytes) => {
            let engine = base64::engine::general_purpose::STANDARD;
            (MessageData::Text(engine.encode(bytes)), Some(BASE64))
        }
        MessageData::Json(value) => {
            let text = serde_json::to_string(&value)
                .map_err(|e| encoding_error(format!("Failed to serialize data: {}", e)))?;
            (MessageData::Text(text), Some(JSON))
        }
    };

    if let Some(step) = step {
        *encoding = Some(match encoding.take().filter(|e| !e.is_empty()) {
            Some(chain) => format!("{}/{}", chain, step),
            None => step.to_string(),
        });
    }

    *data = Some(encoded);
    Ok(())
}

/// Undo the transforms this client understands.
///
/// Decoding stops at the first unknown step (for example a cipher), leaving
/// the rest of the chain in place. A lone trailing `utf-8` is kept since it
/// describes the decoded text.
pub fn decode<T: EncodedData>(item: &mut T) -> AblyResult<()> {
    let (data, encoding) = item.payload_mut();

    let Some(chain) = encoding.take().filter(|e| !e.is_empty()) else {
        return Ok(());
    };
    let Some(mut payload) = data.take() else {
        *encoding = Some(chain);
        return Ok(());
    };

    let mut steps: Vec<&str> = chain.split('/').collect();

    while let Some(step) = steps.last().copied() {
        payload = match step {
            BASE64 => decode_base64(payload)?,
            JSON => decode_json(payload)?,
            UTF8 => {
                let text = decode_utf8(payload)?;
                if steps.len() == 1 {
                    payload = text;
                    break;
                }
                text
            }
            _ => break,
        };
        steps.pop();
    }

    *data = Some(payload);
    *encoding = if steps.is_empty() {
        None
    } else {
        Some(steps.join("/"))
    };
    Ok(())
}

/// Check if encoding includes encryption
pub fn is_encrypted(encoding: &str) -> bool {
    encoding.split('/').any(|step| step.starts_with("cipher+"))
}

fn decode_base64(payload: MessageData) -> AblyResult<MessageData> {
    let engine = base64::engine::general_purpose::STANDARD;
    match payload {
        MessageData::Text(text) => engine
            .decode(text.as_bytes())
            .map(MessageData::Binary)
            .map_err(|e| encoding_error(format!("Base64 decoding failed: {}", e))),
        other => Err(encoding_error(format!(
            "base64 step expects text data, found {}",
            kind(&other)
        ))),
    }
}

fn decode_json(payload: MessageData) -> AblyResult<MessageData> {
    let parsed = match payload {
        MessageData::Text(text) => serde_json::from_str(&text),
        MessageData::Binary(bytes) => serde_json::from_slice(&bytes),
        json @ MessageData::Json(_) => return Ok(json),
    };

    parsed
        .map(MessageData::Json)
        .map_err(|e| encoding_error(format!("JSON parsing failed: {}", e)))
}

fn decode_utf8(payload: MessageData) -> AblyResult<MessageData> {
    match payload {
        MessageData::Binary(bytes) => String::from_utf8(bytes)
            .map(MessageData::Text)
            .map_err(|e| encoding_error(format!("UTF-8 decoding failed: {}", e))),
        other => Ok(other),
    }
}

fn encoding_error(message: String) -> AblyError {
    AblyError::Decode {
        message: format!("{} ({})", message, AblyErrorCode::EncodingError.default_message()),
        source: None,
    }
}

fn kind(data: &MessageData) -> &'static str {
    match data {
        MessageData::Text(_) => "text",
        MessageData::Binary(_) => "binary",
        MessageData::Json(_) => "json",
    }
}
