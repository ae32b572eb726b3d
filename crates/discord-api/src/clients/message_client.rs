//! # Message Client
//!
//! Commands on `/channels/{channel.id}/messages`.

use super::api_client::{refuse, require_id, ApiClient, Connection};
use crate::error::CommandError;
use crate::model::{CreateMessageParams, Message, NONCE_LEN};
use crate::transport::{ApiRequest, Transport};
use async_trait::async_trait;
use resource_marshal::{Inject, MarshalError, Owned, OwnedList};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Size of the fixed create-message payload buffer.
///
/// Validated content is under 2000 characters and a character escapes to at most six
/// bytes, so a validated payload always fits.
pub const MAX_PAYLOAD_LEN: usize = 16384;

#[derive(Clone)]
pub struct MessageClient {
    inner: Connection,
}

impl MessageClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::from_connection(Connection::new(transport))
    }

    pub fn from_connection(inner: Connection) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ApiClient for MessageClient {
    fn connection(&self) -> &Connection {
        &self.inner
    }
}

impl MessageClient {
    /// Posts a message to a channel and returns the created message.
    ///
    /// Refuses an empty `channel_id`, empty content and content at or above the
    /// configured length limit before any payload is built.
    #[instrument(skip(self, params))]
    pub async fn create_message(
        &self,
        channel_id: &str,
        params: &CreateMessageParams,
    ) -> Result<Owned<Message>, CommandError> {
        self.validate_create(channel_id, params)?;

        let payload = build_payload(params)?;
        debug!(%payload, "Payload built");
        info!("Creating message");
        self.dispatch::<Message>(ApiRequest::post(
            format!("/channels/{channel_id}/messages"),
            payload,
        ))
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Owned<Message>, CommandError> {
        require_id(channel_id, "channel_id")?;
        require_id(message_id, "message_id")?;
        self.dispatch::<Message>(ApiRequest::get(format!(
            "/channels/{channel_id}/messages/{message_id}"
        )))
        .await
    }

    /// Fetches a channel's recent messages, newest first as the API returns them.
    #[instrument(skip(self))]
    pub async fn get_channel_messages(
        &self,
        channel_id: &str,
    ) -> Result<OwnedList<Message>, CommandError> {
        require_id(channel_id, "channel_id")?;
        self.dispatch_list::<Message>(ApiRequest::get(format!("/channels/{channel_id}/messages")))
            .await
    }

    fn validate_create(
        &self,
        channel_id: &str,
        params: &CreateMessageParams,
    ) -> Result<(), CommandError> {
        require_id(channel_id, "channel_id")?;
        if params.content.is_empty() {
            return Err(refuse(CommandError::EmptyContent));
        }

        let max = self.inner.config().max_message_len;
        let len = params.content.chars().count();
        if len >= max {
            return Err(refuse(CommandError::ContentTooLong { len, max }));
        }

        let nonce_len = params.nonce.chars().count();
        if nonce_len > NONCE_LEN {
            return Err(refuse(CommandError::NonceTooLong {
                len: nonce_len,
                max: NONCE_LEN,
            }));
        }
        Ok(())
    }
}

/// Renders validated params into the fixed payload buffer.
///
/// # Panics
///
/// If the payload does not fit. Validation bounds every field, so that is a sizing bug.
fn build_payload(params: &CreateMessageParams) -> Result<String, CommandError> {
    let mut buf = [0u8; MAX_PAYLOAD_LEN];
    let written = match params.inject_into(&mut buf) {
        Ok(written) => written,
        Err(MarshalError::BufferTooSmall {
            required,
            available,
        }) => panic!("Out of bounds write attempt: {required} bytes into {available}"),
        Err(err) => return Err(err.into()),
    };
    Ok(String::from_utf8_lossy(&buf[..written]).into_owned())
}
