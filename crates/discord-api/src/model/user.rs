use resource_marshal::{
    impl_list_element, Allocator, FieldDescriptor, FieldKind, JsonResource, MarshalError,
    Resource, Schema, Slot, SlotMut,
};

use super::SNOWFLAKE_LEN;

/// A Discord user as embedded in messages, emojis and member objects.
///
/// All fields are scalars, so a user needs no nested loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub discriminator: String,
    /// Avatar hash; `None` for the default avatar.
    pub avatar: Option<String>,
    pub bot: bool,
    pub system: bool,
    pub mfa_enabled: bool,
    pub locale: String,
    pub verified: bool,
    pub email: String,
    pub flags: i64,
    pub premium_type: i64,
    pub public_flags: i64,
}

impl Schema for User {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new(&["id"], FieldKind::Str { max_len: SNOWFLAKE_LEN }),
        FieldDescriptor::new(&["username"], FieldKind::Str { max_len: 32 }),
        FieldDescriptor::new(&["discriminator"], FieldKind::Str { max_len: 4 }),
        FieldDescriptor::new(&["avatar"], FieldKind::Str { max_len: 128 }),
        FieldDescriptor::new(&["bot"], FieldKind::Bool),
        FieldDescriptor::new(&["system"], FieldKind::Bool),
        FieldDescriptor::new(&["mfa_enabled"], FieldKind::Bool),
        FieldDescriptor::new(&["locale"], FieldKind::Str { max_len: 16 }),
        FieldDescriptor::new(&["verified"], FieldKind::Bool),
        FieldDescriptor::new(&["email"], FieldKind::Str { max_len: 320 }),
        FieldDescriptor::new(&["flags"], FieldKind::Int),
        FieldDescriptor::new(&["premium_type"], FieldKind::Int),
        FieldDescriptor::new(&["public_flags"], FieldKind::Int),
    ];

    fn slot_mut(&mut self, index: usize) -> SlotMut<'_> {
        match index {
            0 => SlotMut::Str(&mut self.id),
            1 => SlotMut::Str(&mut self.username),
            2 => SlotMut::Str(&mut self.discriminator),
            3 => SlotMut::OptStr(&mut self.avatar),
            4 => SlotMut::Bool(&mut self.bot),
            5 => SlotMut::Bool(&mut self.system),
            6 => SlotMut::Bool(&mut self.mfa_enabled),
            7 => SlotMut::Str(&mut self.locale),
            8 => SlotMut::Bool(&mut self.verified),
            9 => SlotMut::Str(&mut self.email),
            10 => SlotMut::Int(&mut self.flags),
            11 => SlotMut::Int(&mut self.premium_type),
            12 => SlotMut::Int(&mut self.public_flags),
            _ => SlotMut::Deferred,
        }
    }

    fn slot(&self, index: usize) -> Slot<'_> {
        match index {
            0 => Slot::Str(&self.id),
            1 => Slot::Str(&self.username),
            2 => Slot::Str(&self.discriminator),
            3 => Slot::OptStr(self.avatar.as_deref()),
            4 => Slot::Bool(self.bot),
            5 => Slot::Bool(self.system),
            6 => Slot::Bool(self.mfa_enabled),
            7 => Slot::Str(&self.locale),
            8 => Slot::Bool(self.verified),
            9 => Slot::Str(&self.email),
            10 => Slot::Int(self.flags),
            11 => Slot::Int(self.premium_type),
            12 => Slot::Int(self.public_flags),
            _ => Slot::Null,
        }
    }
}

impl Resource for User {
    const NAME: &'static str = "User";

    fn init(_alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        Ok(Self::default())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

impl JsonResource for User {}
impl_list_element!(User);
