//! Typed command wrappers around a [`Transport`](crate::transport::Transport).

pub mod api_client;
pub mod emoji_client;
pub mod message_client;

pub use api_client::*;
pub use emoji_client::*;
pub use message_client::*;
