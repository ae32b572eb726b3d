use resource_marshal::{
    assert_patch_fields, impl_list_element, load_list, load_optional_sub, Allocator,
    FieldDescriptor, FieldKind, JsonResource, MarshalError, Owned, OwnedList, PatchSwitches,
    Presence, Resource, ScanReport, Schema, Slot, SlotMut,
};

use super::{User, SNOWFLAKE_LEN};

const EMOJI_NAME_LEN: usize = 32;

/// A custom guild emoji.
#[derive(Debug, Default, PartialEq)]
pub struct Emoji {
    pub id: String,
    pub name: String,
    /// Role ids allowed to use the emoji.
    pub roles: OwnedList<u64>,
    /// The user that uploaded the emoji, when the caller may see it.
    pub user: Option<Owned<User>>,
    pub require_colons: bool,
    pub managed: bool,
    pub animated: bool,
    pub available: bool,
}

impl Emoji {
    pub const ROLES: usize = 2;
    pub const USER: usize = 3;
}

impl Schema for Emoji {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new(&["id"], FieldKind::Str { max_len: SNOWFLAKE_LEN }),
        FieldDescriptor::new(&["name"], FieldKind::Str { max_len: EMOJI_NAME_LEN }),
        FieldDescriptor::new(&["roles"], FieldKind::List),
        FieldDescriptor::new(&["user"], FieldKind::Object),
        FieldDescriptor::new(&["require_colons"], FieldKind::Bool),
        FieldDescriptor::new(&["managed"], FieldKind::Bool),
        FieldDescriptor::new(&["animated"], FieldKind::Bool),
        FieldDescriptor::new(&["available"], FieldKind::Bool),
    ];

    fn slot_mut(&mut self, index: usize) -> SlotMut<'_> {
        match index {
            0 => SlotMut::Str(&mut self.id),
            1 => SlotMut::Str(&mut self.name),
            4 => SlotMut::Bool(&mut self.require_colons),
            5 => SlotMut::Bool(&mut self.managed),
            6 => SlotMut::Bool(&mut self.animated),
            7 => SlotMut::Bool(&mut self.available),
            _ => SlotMut::Deferred,
        }
    }

    fn slot(&self, index: usize) -> Slot<'_> {
        match index {
            0 => Slot::Str(&self.id),
            1 => Slot::Str(&self.name),
            Self::ROLES => Slot::Nested(&self.roles),
            Self::USER => match &self.user {
                Some(user) => Slot::Nested(&**user),
                None => Slot::Null,
            },
            4 => Slot::Bool(self.require_colons),
            5 => Slot::Bool(self.managed),
            6 => Slot::Bool(self.animated),
            7 => Slot::Bool(self.available),
            _ => Slot::Null,
        }
    }
}

impl Resource for Emoji {
    const NAME: &'static str = "Emoji";

    fn init(_alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        Ok(Self::default())
    }

    fn cleanup(&mut self) {
        User::free(self.user.take());
        *self = Self::default();
    }
}

impl JsonResource for Emoji {
    fn load_tokens<'a>(
        &mut self,
        report: &mut ScanReport<'a>,
        alloc: &dyn Allocator,
    ) -> Result<(), MarshalError> {
        load_list::<Self, _>(report, Self::ROLES, &mut self.roles, alloc)?;
        load_optional_sub::<Self, _>(report, Self::USER, &mut self.user, alloc)?;
        Ok(())
    }
}

impl_list_element!(Emoji);

/// Body of `PATCH /guilds/{guild.id}/emojis/{emoji.id}`.
///
/// Both fields are optional on the wire. Only fields marked in `switches` are sent:
/// use the setters, or drive the switches directly for `null` requests.
///
/// ```rust
/// use discord_api::model::ModifyGuildEmojiParams;
/// use resource_marshal::Inject;
///
/// let mut params = ModifyGuildEmojiParams::default();
/// params.set_name("sparkle");
/// params.switches.request_null(ModifyGuildEmojiParams::ROLES);
/// assert_eq!(params.to_json().unwrap(), r#"{"name":"sparkle","roles":null}"#);
/// ```
#[derive(Debug, Default, PartialEq)]
pub struct ModifyGuildEmojiParams {
    pub name: String,
    pub roles: OwnedList<u64>,
    pub switches: PatchSwitches,
}

impl ModifyGuildEmojiParams {
    pub const NAME_FIELD: usize = 0;
    pub const ROLES: usize = 1;

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.switches.define(Self::NAME_FIELD);
    }

    pub fn set_roles(&mut self, roles: OwnedList<u64>) {
        self.roles = roles;
        self.switches.define(Self::ROLES);
    }
}

impl Schema for ModifyGuildEmojiParams {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new(&["name"], FieldKind::Str { max_len: EMOJI_NAME_LEN }),
        FieldDescriptor::new(&["roles"], FieldKind::List),
    ];

    fn slot_mut(&mut self, index: usize) -> SlotMut<'_> {
        match index {
            Self::NAME_FIELD => SlotMut::Str(&mut self.name),
            _ => SlotMut::Deferred,
        }
    }

    fn slot(&self, index: usize) -> Slot<'_> {
        match index {
            Self::NAME_FIELD => Slot::Str(&self.name),
            Self::ROLES => Slot::Nested(&self.roles),
            _ => Slot::Null,
        }
    }

    fn presence(&self, index: usize) -> Presence {
        self.switches.presence(index)
    }
}

impl Resource for ModifyGuildEmojiParams {
    const NAME: &'static str = "ModifyGuildEmojiParams";

    fn init(_alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        Ok(Self::default())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

impl JsonResource for ModifyGuildEmojiParams {
    fn load_tokens<'a>(
        &mut self,
        report: &mut ScanReport<'a>,
        alloc: &dyn Allocator,
    ) -> Result<(), MarshalError> {
        load_list::<Self, _>(report, Self::ROLES, &mut self.roles, alloc)
    }
}

impl_list_element!(ModifyGuildEmojiParams);
assert_patch_fields!(ModifyGuildEmojiParams);
