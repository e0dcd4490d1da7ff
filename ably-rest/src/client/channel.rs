// Channel operations: publish and history

use crate::client::paginated::{PaginateParams, PaginatedResult};
use crate::error::{AblyError, AblyResult};
use crate::http::AblyHttpClient;
use crate::protocol::encoding;
use crate::protocol::messages::{Message, MessageData, PresenceMessage};
use base64::Engine;
use rand::RngCore;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A named channel on the REST API
///
/// Holds no state besides its name; every call is an independent request.
#[derive(Debug, Clone)]
pub struct RestChannel {
    name: String,
    path: String,
    http: Arc<AblyHttpClient>,
    client_id: Option<String>,
    idempotent_publishing: bool,
}

impl RestChannel {
    pub(crate) fn new(
        name: String,
        http: Arc<AblyHttpClient>,
        client_id: Option<String>,
        idempotent_publishing: bool,
    ) -> Self {
        let path = format!("/channels/{}", urlencoding::encode(&name));
        Self {
            name,
            path,
            http,
            client_id,
            idempotent_publishing,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publish a single named message
    pub async fn publish(
        &self,
        name: impl Into<String>,
        data: impl Into<MessageData>,
    ) -> AblyResult<()> {
        self.publish_message(Message::new(name, data)).await
    }

    /// Publish a fully built message
    #[instrument(skip_all, fields(channel = %self.name))]
    pub async fn publish_message(&self, message: Message) -> AblyResult<()> {
        let mut prepared = self.prepare(vec![message])?;
        let message = prepared.remove(0);

        self.http
            .post(&self.messages_path())
            .json(&message)
            .send()
            .await?;
        debug!("message published");
        Ok(())
    }

    /// Publish several messages in one request
    #[instrument(skip_all, fields(channel = %self.name, count = messages.len()))]
    pub async fn publish_all(&self, messages: Vec<Message>) -> AblyResult<()> {
        if messages.is_empty() {
            return Err(AblyError::invalid_argument("no messages to publish"));
        }

        let prepared = self.prepare(messages)?;
        self.http
            .post(&self.messages_path())
            .json(&prepared)
            .send()
            .await?;
        debug!("messages published");
        Ok(())
    }

    /// Get a page of message history
    #[instrument(skip_all, fields(channel = %self.name))]
    pub async fn history(&self, params: PaginateParams) -> AblyResult<PaginatedResult<Message>> {
        let query = params.to_query()?;
        PaginatedResult::fetch(Arc::clone(&self.http), &self.messages_path(), &query).await
    }

    pub fn presence(&self) -> RestPresence {
        RestPresence {
            channel: self.clone(),
        }
    }

    fn messages_path(&self) -> String {
        format!("{}/messages", self.path)
    }

    fn prepare(&self, mut messages: Vec<Message>) -> AblyResult<Vec<Message>> {
        if let Some(configured) = self.client_id.as_deref().filter(|id| *id != "*") {
            if let Some(other) = messages
                .iter()
                .filter_map(|m| m.client_id.as_deref())
                .find(|id| *id != configured)
            {
                return Err(AblyError::invalid_argument(format!(
                    "message client id {:?} does not match the client's {:?}",
                    other, configured
                )));
            }
        }

        let base_id = self
            .idempotent_publishing
            .then(idempotent_base_id);

        for (index, message) in messages.iter_mut().enumerate() {
            encoding::encode(message)?;
            if message.id.is_none() {
                if let Some(base) = &base_id {
                    message.id = Some(format!("{}:{}", base, index));
                }
            }
        }

        Ok(messages)
    }
}

/// Presence queries for a channel
#[derive(Debug, Clone)]
pub struct RestPresence {
    channel: RestChannel,
}

impl RestPresence {
    /// Members currently present
    pub async fn get(&self, params: PaginateParams) -> AblyResult<PaginatedResult<PresenceMessage>> {
        let mut query = params.to_query()?;
        // only limit applies to the live member set
        query.retain(|(key, _)| key == "limit");
        let path = format!("{}/presence", self.channel.path);
        PaginatedResult::fetch(Arc::clone(&self.channel.http), &path, &query).await
    }

    /// Presence event history
    pub async fn history(
        &self,
        params: PaginateParams,
    ) -> AblyResult<PaginatedResult<PresenceMessage>> {
        let query = params.to_query()?;
        let path = format!("{}/presence/history", self.channel.path);
        PaginatedResult::fetch(Arc::clone(&self.channel.http), &path, &query).await
    }
}

fn idempotent_base_id() -> String {
    let mut bytes = [0u8; 9];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
