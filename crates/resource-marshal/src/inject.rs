//! # Path-Schema Injector
//!
//! The inverse of the scanner: walks a resource's field table and renders each field
//! at its wire path. Output always follows table order, so payloads are byte-stable
//! for identical inputs. Fields whose paths share a prefix are grouped under one
//! nested object.
//!
//! Patch resources gate each field through [`Schema::presence`]: omitted fields are
//! skipped, null-requested fields are written as `null`.

use crate::error::MarshalError;
use crate::patch::Presence;
use crate::schema::{Inject, Schema, Slot};
use serde_json::{Map, Value};
use tracing::trace;

impl<R: Schema> Inject for R {
    fn to_value(&self) -> Value {
        Value::Object(to_object(self))
    }
}

/// Renders `resource` as a JSON object in field-table order.
pub fn to_object<R: Schema>(resource: &R) -> Map<String, Value> {
    let mut root = Map::new();
    for (index, field) in R::FIELDS.iter().enumerate() {
        let value = match resource.presence(index) {
            Presence::Omit => {
                trace!(path = %field.wire_path(), "Omitted");
                continue;
            }
            Presence::Null => Value::Null,
            Presence::Emit => slot_value(resource.slot(index)),
        };
        place(&mut root, field.path, value);
    }
    root
}

fn slot_value(slot: Slot<'_>) -> Value {
    match slot {
        Slot::Str(text) | Slot::OptStr(Some(text)) => Value::String(text.to_string()),
        Slot::OptStr(None) => Value::Null,
        Slot::Bool(flag) => Value::Bool(flag),
        Slot::Int(number) | Slot::Enum(number) => Value::from(number),
        Slot::Nested(nested) => nested.to_value(),
        Slot::Null => Value::Null,
    }
}

fn place(map: &mut Map<String, Value>, path: &[&str], value: Value) {
    match path {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                place(inner, rest, value);
            }
        }
    }
}

/// Copies `bytes` into `buf` if they fit. Never writes a partial payload.
pub(crate) fn copy_into(bytes: &[u8], buf: &mut [u8]) -> Result<usize, MarshalError> {
    if bytes.len() > buf.len() {
        return Err(MarshalError::BufferTooSmall {
            required: bytes.len(),
            available: buf.len(),
        });
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}
