//! Discord resources with their wire field tables.
//!
//! Each type implements [`Schema`](resource_marshal::Schema),
//! [`Resource`](resource_marshal::Resource) and
//! [`JsonResource`](resource_marshal::JsonResource), and can be an element of an
//! [`OwnedList`](resource_marshal::OwnedList).

pub mod create_message;
pub mod emoji;
pub mod message;
pub mod user;

pub use create_message::*;
pub use emoji::*;
pub use message::*;
pub use user::*;

/// Longest message content Discord accepts, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

pub const NONCE_LEN: usize = 25;

pub(crate) const SNOWFLAKE_LEN: usize = 64;
pub(crate) const TIMESTAMP_LEN: usize = 64;
