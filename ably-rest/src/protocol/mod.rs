// Protocol types for the REST API

pub mod encoding;
pub mod messages;

// Re-export key types
pub use messages::{ErrorInfo, Message, MessageBuilder, MessageData, PresenceAction, PresenceMessage};
