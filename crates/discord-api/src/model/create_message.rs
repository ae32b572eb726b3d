use resource_marshal::{
    assert_patch_fields, impl_list_element, Allocator, FieldDescriptor, FieldKind, JsonResource,
    MarshalError, PatchSwitches, Presence, Resource, Schema, Slot, SlotMut,
};

use super::{MAX_MESSAGE_LEN, NONCE_LEN};

/// Body of `POST /channels/{channel.id}/messages`.
///
/// `content` is always sent. `nonce` and `tts` are sent only once set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateMessageParams {
    pub content: String,
    pub nonce: String,
    pub tts: bool,
    pub switches: PatchSwitches,
}

impl CreateMessageParams {
    pub const CONTENT: usize = 0;
    pub const NONCE: usize = 1;
    pub const TTS: usize = 2;

    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self.switches.define(Self::NONCE);
        self
    }

    pub fn with_tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self.switches.define(Self::TTS);
        self
    }
}

impl Schema for CreateMessageParams {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new(&["content"], FieldKind::Str { max_len: MAX_MESSAGE_LEN }),
        FieldDescriptor::new(&["nonce"], FieldKind::Str { max_len: NONCE_LEN }),
        FieldDescriptor::new(&["tts"], FieldKind::Bool),
    ];

    fn slot_mut(&mut self, index: usize) -> SlotMut<'_> {
        match index {
            Self::CONTENT => SlotMut::Str(&mut self.content),
            Self::NONCE => SlotMut::Str(&mut self.nonce),
            Self::TTS => SlotMut::Bool(&mut self.tts),
            _ => SlotMut::Deferred,
        }
    }

    fn slot(&self, index: usize) -> Slot<'_> {
        match index {
            Self::CONTENT => Slot::Str(&self.content),
            Self::NONCE => Slot::Str(&self.nonce),
            Self::TTS => Slot::Bool(self.tts),
            _ => Slot::Null,
        }
    }

    fn presence(&self, index: usize) -> Presence {
        match index {
            Self::CONTENT => Presence::Emit,
            _ => self.switches.presence(index),
        }
    }
}

impl Resource for CreateMessageParams {
    const NAME: &'static str = "CreateMessageParams";

    fn init(_alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        Ok(Self::default())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

impl JsonResource for CreateMessageParams {}
assert_patch_fields!(CreateMessageParams);
impl_list_element!(CreateMessageParams);
