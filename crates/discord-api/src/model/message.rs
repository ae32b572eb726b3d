use resource_marshal::{
    impl_list_element, load_list, load_optional_sub, load_sub, Allocator, FieldDescriptor,
    FieldKind, JsonResource, MarshalError, Owned, OwnedList, Resource, ScanReport, Schema, Slot,
    SlotMut, WireEnum,
};

use super::{User, MAX_MESSAGE_LEN, NONCE_LEN, SNOWFLAKE_LEN, TIMESTAMP_LEN};

/// Message type, carried on the wire as an integer code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageType {
    #[default]
    Default,
    RecipientAdd,
    RecipientRemove,
    Call,
    ChannelNameChange,
    ChannelIconChange,
    ChannelPinnedMessage,
    GuildMemberJoin,
    UserPremiumGuildSubscription,
    UserPremiumGuildSubscriptionTier1,
    UserPremiumGuildSubscriptionTier2,
    UserPremiumGuildSubscriptionTier3,
    ChannelFollowAdd,
    GuildDiscoveryDisqualified,
    GuildDiscoveryRequalified,
    Reply,
    ApplicationCommand,
}

impl WireEnum for MessageType {
    fn code(&self) -> i64 {
        match self {
            MessageType::Default => 0,
            MessageType::RecipientAdd => 1,
            MessageType::RecipientRemove => 2,
            MessageType::Call => 3,
            MessageType::ChannelNameChange => 4,
            MessageType::ChannelIconChange => 5,
            MessageType::ChannelPinnedMessage => 6,
            MessageType::GuildMemberJoin => 7,
            MessageType::UserPremiumGuildSubscription => 8,
            MessageType::UserPremiumGuildSubscriptionTier1 => 9,
            MessageType::UserPremiumGuildSubscriptionTier2 => 10,
            MessageType::UserPremiumGuildSubscriptionTier3 => 11,
            MessageType::ChannelFollowAdd => 12,
            MessageType::GuildDiscoveryDisqualified => 14,
            MessageType::GuildDiscoveryRequalified => 15,
            MessageType::Reply => 19,
            MessageType::ApplicationCommand => 20,
        }
    }

    fn assign_code(&mut self, code: i64) -> Result<(), String> {
        *self = match code {
            0 => MessageType::Default,
            1 => MessageType::RecipientAdd,
            2 => MessageType::RecipientRemove,
            3 => MessageType::Call,
            4 => MessageType::ChannelNameChange,
            5 => MessageType::ChannelIconChange,
            6 => MessageType::ChannelPinnedMessage,
            7 => MessageType::GuildMemberJoin,
            8 => MessageType::UserPremiumGuildSubscription,
            9 => MessageType::UserPremiumGuildSubscriptionTier1,
            10 => MessageType::UserPremiumGuildSubscriptionTier2,
            11 => MessageType::UserPremiumGuildSubscriptionTier3,
            12 => MessageType::ChannelFollowAdd,
            14 => MessageType::GuildDiscoveryDisqualified,
            15 => MessageType::GuildDiscoveryRequalified,
            19 => MessageType::Reply,
            20 => MessageType::ApplicationCommand,
            other => return Err(format!("unknown message type {other}")),
        };
        Ok(())
    }
}

/// A message posted in a channel.
///
/// # Ownership
///
/// - `author` is mandatory and exists from construction on, zeroed until loaded.
/// - `referenced_message` is the message this one replies to. It is absent unless the
///   wire carries it and is freed again when the wire sends `null`.
/// - `mentions` keeps wire order.
/// - `guild_id`, `edited_timestamp` and `webhook_id` are `None` when the wire omits them
///   or sends `null`.
#[derive(Debug, PartialEq)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub author: Owned<User>,
    pub content: String,
    pub timestamp: String,
    pub edited_timestamp: Option<String>,
    pub tts: bool,
    pub mention_everyone: bool,
    pub mentions: OwnedList<User>,
    pub nonce: String,
    pub pinned: bool,
    pub webhook_id: Option<String>,
    pub kind: MessageType,
    pub flags: i64,
    pub referenced_message: Option<Owned<Message>>,
}

impl Message {
    pub const AUTHOR: usize = 3;
    pub const MENTIONS: usize = 9;
    pub const REFERENCED_MESSAGE: usize = 15;
}

impl Schema for Message {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new(&["id"], FieldKind::Str { max_len: SNOWFLAKE_LEN }),
        FieldDescriptor::new(&["channel_id"], FieldKind::Str { max_len: SNOWFLAKE_LEN }),
        FieldDescriptor::new(&["guild_id"], FieldKind::Str { max_len: SNOWFLAKE_LEN }),
        FieldDescriptor::new(&["author"], FieldKind::Object),
        FieldDescriptor::new(&["content"], FieldKind::Str { max_len: MAX_MESSAGE_LEN }),
        FieldDescriptor::new(&["timestamp"], FieldKind::Str { max_len: TIMESTAMP_LEN }),
        FieldDescriptor::new(&["edited_timestamp"], FieldKind::Str { max_len: TIMESTAMP_LEN }),
        FieldDescriptor::new(&["tts"], FieldKind::Bool),
        FieldDescriptor::new(&["mention_everyone"], FieldKind::Bool),
        FieldDescriptor::new(&["mentions"], FieldKind::List),
        FieldDescriptor::new(&["nonce"], FieldKind::Str { max_len: NONCE_LEN }),
        FieldDescriptor::new(&["pinned"], FieldKind::Bool),
        FieldDescriptor::new(&["webhook_id"], FieldKind::Str { max_len: SNOWFLAKE_LEN }),
        FieldDescriptor::new(&["type"], FieldKind::Enum),
        FieldDescriptor::new(&["flags"], FieldKind::Int),
        FieldDescriptor::new(&["referenced_message"], FieldKind::Object),
    ];

    fn slot_mut(&mut self, index: usize) -> SlotMut<'_> {
        match index {
            0 => SlotMut::Str(&mut self.id),
            1 => SlotMut::Str(&mut self.channel_id),
            2 => SlotMut::OptStr(&mut self.guild_id),
            4 => SlotMut::Str(&mut self.content),
            5 => SlotMut::Str(&mut self.timestamp),
            6 => SlotMut::OptStr(&mut self.edited_timestamp),
            7 => SlotMut::Bool(&mut self.tts),
            8 => SlotMut::Bool(&mut self.mention_everyone),
            10 => SlotMut::Str(&mut self.nonce),
            11 => SlotMut::Bool(&mut self.pinned),
            12 => SlotMut::OptStr(&mut self.webhook_id),
            13 => SlotMut::Enum(&mut self.kind),
            14 => SlotMut::Int(&mut self.flags),
            _ => SlotMut::Deferred,
        }
    }

    fn slot(&self, index: usize) -> Slot<'_> {
        match index {
            0 => Slot::Str(&self.id),
            1 => Slot::Str(&self.channel_id),
            2 => Slot::OptStr(self.guild_id.as_deref()),
            Self::AUTHOR => Slot::Nested(&*self.author),
            4 => Slot::Str(&self.content),
            5 => Slot::Str(&self.timestamp),
            6 => Slot::OptStr(self.edited_timestamp.as_deref()),
            7 => Slot::Bool(self.tts),
            8 => Slot::Bool(self.mention_everyone),
            Self::MENTIONS => Slot::Nested(&self.mentions),
            10 => Slot::Str(&self.nonce),
            11 => Slot::Bool(self.pinned),
            12 => Slot::OptStr(self.webhook_id.as_deref()),
            13 => Slot::Enum(self.kind.code()),
            14 => Slot::Int(self.flags),
            Self::REFERENCED_MESSAGE => match &self.referenced_message {
                Some(referenced) => Slot::Nested(&**referenced),
                None => Slot::Null,
            },
            _ => Slot::Null,
        }
    }
}

impl Resource for Message {
    const NAME: &'static str = "Message";

    fn init(alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        Ok(Self {
            id: String::new(),
            channel_id: String::new(),
            guild_id: None,
            author: User::alloc(alloc)?,
            content: String::new(),
            timestamp: String::new(),
            edited_timestamp: None,
            tts: false,
            mention_everyone: false,
            mentions: OwnedList::new(),
            nonce: String::new(),
            pinned: false,
            webhook_id: None,
            kind: MessageType::Default,
            flags: 0,
            referenced_message: None,
        })
    }

    fn cleanup(&mut self) {
        self.id.clear();
        self.channel_id.clear();
        self.guild_id = None;
        self.author.cleanup();
        self.content.clear();
        self.timestamp.clear();
        self.edited_timestamp = None;
        self.tts = false;
        self.mention_everyone = false;
        self.mentions.clear();
        self.nonce.clear();
        self.pinned = false;
        self.webhook_id = None;
        self.kind = MessageType::Default;
        self.flags = 0;
        Message::free(self.referenced_message.take());
    }
}

impl JsonResource for Message {
    fn load_tokens<'a>(
        &mut self,
        report: &mut ScanReport<'a>,
        alloc: &dyn Allocator,
    ) -> Result<(), MarshalError> {
        load_sub::<Self, _>(report, Self::AUTHOR, &mut *self.author, alloc)?;
        load_list::<Self, _>(report, Self::MENTIONS, &mut self.mentions, alloc)?;
        load_optional_sub::<Self, _>(
            report,
            Self::REFERENCED_MESSAGE,
            &mut self.referenced_message,
            alloc,
        )?;
        Ok(())
    }
}

impl_list_element!(Message);

#[cfg(test)]
mod tests {
    use super::*;
    use resource_marshal::{Heap, Inject, Ledger};

    const REPLY: &str = r#"{
        "id": "334385199974967042",
        "channel_id": "290926798999357250",
        "author": {"id": "53908099506183680", "username": "Mason", "discriminator": "9999"},
        "content": "Supa Hot",
        "timestamp": "2017-07-11T17:27:07.299000+00:00",
        "edited_timestamp": null,
        "tts": false,
        "mention_everyone": false,
        "mentions": [
            {"id": "2", "username": "b"},
            {"id": "1", "username": "a"}
        ],
        "pinned": false,
        "type": 19,
        "referenced_message": {
            "id": "334385199974967041",
            "author": {"id": "1", "username": "a"},
            "content": "original",
            "mentions": [],
            "type": 0,
            "referenced_message": null
        }
    }"#;

    #[test]
    fn loads_author_mentions_and_reply() {
        let mut message = Message::alloc(&Heap).unwrap();
        let report = message.from_json(REPLY, &Heap).unwrap();

        assert!(report.is_clean(), "{:?}", report.failures());
        assert_eq!(message.author.username, "Mason");
        assert_eq!(message.kind, MessageType::Reply);
        let ids: Vec<&str> = message.mentions.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);

        let referenced = message.referenced_message.as_ref().unwrap();
        assert_eq!(referenced.content, "original");
        assert_eq!(referenced.author.id, "1");
        assert!(referenced.referenced_message.is_none());
    }

    #[test]
    fn reply_is_freed_when_wire_sends_null() {
        let ledger = Ledger::new();
        let mut message = Message::alloc(&ledger).unwrap();
        message.from_json(REPLY, &ledger).unwrap();
        let loaded = ledger.live();

        message.from_json(r#"{"referenced_message":null}"#, &ledger).unwrap();
        assert!(message.referenced_message.is_none());
        // The reply held its own storage plus its author.
        assert_eq!(ledger.live(), loaded - 2);
        assert_eq!(message.content, "Supa Hot");
    }

    #[test]
    fn unknown_type_code_is_a_field_failure() {
        let mut message = Message::alloc(&Heap).unwrap();
        let report = message.from_json(r#"{"type":13,"content":"hi"}"#, &Heap).unwrap();

        assert_eq!(report.failures()[0].path.to_string(), "[type]");
        assert_eq!(message.kind, MessageType::Default);
        assert_eq!(message.content, "hi");
    }

    #[test]
    fn construction_rolls_back_at_every_step() {
        for step in 0..2 {
            let ledger = Ledger::failing_at(step);
            assert!(matches!(Message::alloc(&ledger), Err(MarshalError::Alloc { .. })));
            assert_eq!(ledger.live(), 0);
        }
        let ledger = Ledger::failing_at(2);
        let message = Message::alloc(&ledger).unwrap();
        Message::free(Some(message));
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn load_failures_never_leak() {
        for step in 1..16 {
            let ledger = Ledger::failing_at(step);
            if let Ok(mut message) = Message::alloc(&ledger) {
                let _ = message.from_json(REPLY, &ledger);
                drop(message);
            }
            assert_eq!(ledger.live(), 0, "leak after failing step {step}");
        }
    }

    #[test]
    fn round_trips_through_the_injector() {
        let mut first = Message::alloc(&Heap).unwrap();
        first.from_json(REPLY, &Heap).unwrap();
        let written = first.to_json().unwrap();

        let mut second = Message::alloc(&Heap).unwrap();
        let report = second.from_json(&written, &Heap).unwrap();
        assert!(report.is_clean());
        assert_eq!(first, second);
        assert_eq!(second.to_json().unwrap(), written);
    }

    #[test]
    fn injected_fields_match_the_wire_document() {
        let mut message = Message::alloc(&Heap).unwrap();
        message.from_json(REPLY, &Heap).unwrap();

        let wire: serde_json::Value = serde_json::from_str(REPLY).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_carries(&written, &wire, "");
        assert!(written["edited_timestamp"].is_null());
        assert_eq!(message.edited_timestamp, None);
    }

    /// Every key of `wire` appears in `written` with the same value. Objects may carry
    /// extra keys; the injector writes the whole table.
    fn assert_carries(written: &serde_json::Value, wire: &serde_json::Value, at: &str) {
        match (written, wire) {
            (serde_json::Value::Object(out), serde_json::Value::Object(expected)) => {
                for (key, value) in expected {
                    let path = format!("{at}[{key}]");
                    let found = out.get(key).unwrap_or_else(|| panic!("{path} missing"));
                    assert_carries(found, value, &path);
                }
            }
            (serde_json::Value::Array(out), serde_json::Value::Array(expected)) => {
                assert_eq!(out.len(), expected.len(), "{at} length");
                for (position, (found, value)) in out.iter().zip(expected).enumerate() {
                    assert_carries(found, value, &format!("{at}[{position}]"));
                }
            }
            _ => assert_eq!(written, wire, "{at}"),
        }
    }

    #[test]
    fn nullable_ids_load_when_present() {
        let mut message = Message::alloc(&Heap).unwrap();
        message
            .from_json(
                r#"{"guild_id":"41771983423143937","webhook_id":null,"edited_timestamp":"2017-07-11T17:30:00+00:00"}"#,
                &Heap,
            )
            .unwrap();

        assert_eq!(message.guild_id.as_deref(), Some("41771983423143937"));
        assert_eq!(message.webhook_id, None);
        assert!(message.edited_timestamp.is_some());

        message.from_json(r#"{"edited_timestamp":null}"#, &Heap).unwrap();
        assert_eq!(message.edited_timestamp, None);
        assert!(message.guild_id.is_some());
    }

    #[test]
    fn aborted_reply_reload_keeps_the_existing_reply() {
        let mut message = Message::alloc(&Heap).unwrap();
        message.from_json(REPLY, &Heap).unwrap();

        let ledger = Ledger::failing_at(0);
        let result = message.from_json(
            r#"{"referenced_message":{"id":"new","mentions":[{"id":"9"}]}}"#,
            &ledger,
        );

        assert!(matches!(result, Err(MarshalError::Alloc { .. })));
        let referenced = message.referenced_message.as_ref().unwrap();
        assert_eq!(referenced.content, "original");
        assert!(referenced.mentions.is_empty());
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn cleanup_resets_for_reuse() {
        let ledger = Ledger::new();
        let mut message = Message::alloc(&ledger).unwrap();
        message.from_json(REPLY, &ledger).unwrap();

        message.cleanup();
        assert_eq!(ledger.live(), 2);
        assert_eq!(message.content, "");
        assert_eq!(message.author.username, "");
        assert!(message.mentions.is_empty());
        assert!(message.referenced_message.is_none());
    }

    #[test]
    fn lists_of_messages_keep_order() {
        let list = Message::list_from_json(
            r#"[{"id":"b","author":{"id":"1"}},{"id":"a","author":{"id":"2"}}]"#,
            &Heap,
        )
        .unwrap();

        let ids: Vec<&str> = list.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(list.get(1).map(|m| m.author.id.as_str()), Some("2"));
        Message::list_free(Some(list));
    }
}
