//! # Discord API Resources
//!
//! Discord REST resources and commands built on the `resource-marshal` engine.
//!
//! - [`model`] declares each resource's wire field table ([`model::Message`],
//!   [`model::User`], [`model::Emoji`] and the request bodies).
//! - [`clients`] validates input, builds payloads and scans responses.
//! - [`transport`] is the boundary to whatever actually speaks HTTP.
//! - [`mock`] scripts that boundary for tests.
//!
//! ## Testing
//!
//! Pair a client with a [`mock::MockTransport`] to test commands without a network,
//! and with a [`resource_marshal::Ledger`] allocator to check for leaks.

pub mod clients;
pub mod config;
pub mod error;
pub mod mock;
pub mod model;
pub mod transport;

pub use config::ClientConfig;
pub use error::{CommandError, ConfigError};
