//! # Emoji Client
//!
//! Commands on `/guilds/{guild.id}/emojis`.

use super::api_client::{require_id, ApiClient, Connection};
use crate::error::CommandError;
use crate::model::{Emoji, ModifyGuildEmojiParams};
use crate::transport::{ApiRequest, Transport};
use async_trait::async_trait;
use resource_marshal::{Inject, Owned, OwnedList};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct EmojiClient {
    inner: Connection,
}

impl EmojiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::from_connection(Connection::new(transport))
    }

    pub fn from_connection(inner: Connection) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ApiClient for EmojiClient {
    fn connection(&self) -> &Connection {
        &self.inner
    }
}

impl EmojiClient {
    /// Updates a guild emoji. Only the fields defined in `params.switches` are sent.
    #[instrument(skip(self, params))]
    pub async fn modify_guild_emoji(
        &self,
        guild_id: &str,
        emoji_id: &str,
        params: &ModifyGuildEmojiParams,
    ) -> Result<Owned<Emoji>, CommandError> {
        require_id(guild_id, "guild_id")?;
        require_id(emoji_id, "emoji_id")?;

        let payload = params.to_json()?;
        debug!(%payload, "Payload built");
        info!("Modifying emoji");
        self.dispatch::<Emoji>(ApiRequest::patch(
            format!("/guilds/{guild_id}/emojis/{emoji_id}"),
            payload,
        ))
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_guild_emojis(&self, guild_id: &str) -> Result<OwnedList<Emoji>, CommandError> {
        require_id(guild_id, "guild_id")?;
        self.dispatch_list::<Emoji>(ApiRequest::get(format!("/guilds/{guild_id}/emojis")))
            .await
    }
}
