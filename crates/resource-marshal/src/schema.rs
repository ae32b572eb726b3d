//! # Field Schemas
//!
//! Every resource type declares a static table of [`FieldDescriptor`]s: where the field
//! lives on the wire and what kind of value it holds. The scanner and the injector
//! walk the same table, which is what keeps the two directions symmetric.
//!
//! Resources expose their fields to the engine through numbered slots. The engine asks
//! for slot `i` whenever it processes descriptor `i`, so the table order and the slot
//! numbering must agree.

use crate::error::MarshalError;
use crate::patch::Presence;
use serde_json::Value;
use std::fmt;

/// Semantic type of a field, selecting the decoder and encoder the engine uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// String copied in, rejected when longer than `max_len` characters.
    Str { max_len: usize },
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// Enumeration carried on the wire as an integer code.
    Enum,
    /// Nested resource, captured as a raw span and decoded by its owner.
    Object,
    /// Nested array, captured as a raw span and decoded by its owner.
    List,
}

impl FieldKind {
    /// Whether the scanner defers this field to the owning resource.
    pub fn is_deferred(&self) -> bool {
        matches!(self, FieldKind::Object | FieldKind::List)
    }
}

/// Static metadata for one field of a resource type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub path: &'static [&'static str],
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(path: &'static [&'static str], kind: FieldKind) -> Self {
        Self { path, kind }
    }

    /// The last key of the wire path.
    pub fn name(&self) -> &'static str {
        self.path.last().copied().unwrap_or("")
    }

    pub fn wire_path(&self) -> WirePath {
        WirePath(self.path.iter().map(|key| key.to_string()).collect())
    }
}

/// An ordered key sequence written in bracket syntax, e.g. `[author][id]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct WirePath(Vec<String>);

impl WirePath {
    /// Parses bracket syntax. Keys may contain any character except `]`.
    pub fn parse(text: &str) -> Result<Self, MarshalError> {
        let mut keys = Vec::new();
        let mut rest = text.trim();
        while !rest.is_empty() {
            let inner = rest
                .strip_prefix('[')
                .ok_or_else(|| MarshalError::Path(text.to_string()))?;
            let close = inner
                .find(']')
                .ok_or_else(|| MarshalError::Path(text.to_string()))?;
            if close == 0 {
                return Err(MarshalError::Path(text.to_string()));
            }
            keys.push(inner[..close].to_string());
            rest = &inner[close + 1..];
        }
        if keys.is_empty() {
            return Err(MarshalError::Path(text.to_string()));
        }
        Ok(Self(keys))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Prepends `prefix`, used when a nested resource reports a failure upward.
    pub fn nested_under(&self, prefix: &WirePath) -> WirePath {
        WirePath(prefix.0.iter().chain(self.0.iter()).cloned().collect())
    }
}

impl fmt::Display for WirePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.0 {
            write!(f, "[{key}]")?;
        }
        Ok(())
    }
}

/// Enumerations that travel as integer codes.
pub trait WireEnum {
    fn code(&self) -> i64;

    /// Replaces the value with the variant for `code`; unknown codes are rejected.
    fn assign_code(&mut self, code: i64) -> Result<(), String>;
}

/// Mutable access to a field, handed to the scanner.
pub enum SlotMut<'r> {
    Str(&'r mut String),
    /// A nullable string: `null` scans to `None`.
    OptStr(&'r mut Option<String>),
    Bool(&'r mut bool),
    Int(&'r mut i64),
    Enum(&'r mut dyn WireEnum),
    /// Nested fields are loaded by the resource itself from captured spans.
    Deferred,
}

/// Read access to a field, handed to the injector.
pub enum Slot<'r> {
    Str(&'r str),
    /// A nullable string; `None` is written as `null`.
    OptStr(Option<&'r str>),
    Bool(bool),
    Int(i64),
    Enum(i64),
    Nested(&'r dyn Inject),
    /// An absent optional value.
    Null,
}

/// Types that can render themselves as wire JSON.
///
/// Every [`Schema`] type gets this through the injector; owned lists implement it
/// directly.
pub trait Inject {
    fn to_value(&self) -> Value;

    fn to_json(&self) -> Result<String, MarshalError> {
        serde_json::to_string(&self.to_value()).map_err(MarshalError::Encode)
    }

    /// Writes the JSON into `buf` and returns the byte count.
    ///
    /// When `buf` is too small nothing is written and the error carries the size that
    /// would have been needed.
    fn inject_into(&self, buf: &mut [u8]) -> Result<usize, MarshalError> {
        let json = self.to_json()?;
        crate::inject::copy_into(json.as_bytes(), buf)
    }
}

/// The per-resource field table plus slot accessors.
pub trait Schema {
    /// Field table in wire declaration order.
    const FIELDS: &'static [FieldDescriptor];

    fn slot_mut(&mut self, index: usize) -> SlotMut<'_>;

    fn slot(&self, index: usize) -> Slot<'_>;

    /// Patch resources override this to consult their tri-state switches.
    fn presence(&self, _index: usize) -> Presence {
        Presence::Emit
    }
}
