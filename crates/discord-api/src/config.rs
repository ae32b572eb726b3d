//! # Client Configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.
//!
//! ```json
//! {
//!   "api_base": "https://discord.com/api/v8",
//!   "user_agent": "DiscordBot (https://example.org, 1.0)",
//!   "max_message_len": 2000
//! }
//! ```

use crate::error::ConfigError;
use crate::model::MAX_MESSAGE_LEN;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable naming a JSON config file for the demo binary.
pub const CONFIG_ENV: &str = "DISCORD_API_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base: String,
    pub user_agent: String,
    /// Messages of this many characters or more are refused. Never above 2000.
    pub max_message_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "https://discord.com/api/v8".to_string(),
            user_agent: concat!("DiscordBot (discord-api, ", env!("CARGO_PKG_VERSION"), ")")
                .to_string(),
            max_message_len: MAX_MESSAGE_LEN,
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.clamped())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading config");
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Loads the file named by [`CONFIG_ENV`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Keeps `max_message_len` within `1..=2000`. The payload buffer of the message
    /// client is sized for that bound.
    fn clamped(mut self) -> Self {
        let bounded = self.max_message_len.clamp(1, MAX_MESSAGE_LEN);
        if bounded != self.max_message_len {
            warn!(
                requested = self.max_message_len,
                used = bounded,
                "max_message_len out of range"
            );
            self.max_message_len = bounded;
        }
        self
    }
}
