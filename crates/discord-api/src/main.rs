//! # Discord API Demo
//!
//! Runs the message and emoji commands against a [`DryRunTransport`], which logs each
//! request instead of sending it.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p discord-api
//! DISCORD_API_CONFIG=config.json RUST_LOG=info cargo run -p discord-api
//! ```

use discord_api::clients::{Connection, EmojiClient, MessageClient};
use discord_api::model::{CreateMessageParams, ModifyGuildEmojiParams};
use discord_api::transport::DryRunTransport;
use discord_api::ClientConfig;
use resource_marshal::tracing::setup_tracing;
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = ClientConfig::from_env().map_err(|e| e.to_string())?;
    info!(api_base = %config.api_base, "Starting dry run");

    let connection =
        Connection::new(Arc::new(DryRunTransport::new(config.clone()))).with_config(config);
    let messages = MessageClient::from_connection(connection.clone());
    let emojis = EmojiClient::from_connection(connection);

    let span = tracing::info_span!("create_message");
    let message = async {
        let params = CreateMessageParams::new("Hello from resource-marshal!").with_tts(false);
        messages
            .create_message("290926798999357250", &params)
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;
    info!(content = %message.content, tts = message.tts, "Message echoed");

    // Refused before anything is built.
    let too_long = CreateMessageParams::new("x".repeat(2000));
    match messages.create_message("290926798999357250", &too_long).await {
        Ok(_) => error!("Over-long message was accepted"),
        Err(e) => info!(error = %e, "Over-long message refused"),
    }

    let span = tracing::info_span!("modify_emoji");
    let emoji = async {
        let mut params = ModifyGuildEmojiParams::default();
        params.set_name("sparkle");
        emojis
            .modify_guild_emoji("197038439483310086", "41771983429993937", &params)
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;
    info!(name = %emoji.name, "Emoji echoed");

    info!("Dry run completed");
    Ok(())
}
