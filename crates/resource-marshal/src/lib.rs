//! # Resource Marshal
//!
//! A schema-driven marshaling engine for REST-style API clients. It turns wire JSON
//! into typed resource objects and back, including sparse *patch* payloads where every
//! optional field can be omitted, explicitly `null`, or explicitly valued.
//!
//! ## Architecture Overview
//!
//! The engine is split into small layers, leaves first:
//!
//! 1. **Schema** ([`schema`]) - static field tables: wire path plus field kind.
//! 2. **Scanner** ([`scan`]) - reads JSON against a table, decoding scalars in place and
//!    capturing nested sub-documents as [`RawSpan`] tokens.
//! 3. **Injector** ([`inject`]) - writes a resource back out in table order, honouring
//!    tri-state [`PatchSwitches`].
//! 4. **Owned lists** ([`list`]) - ordered, all-or-nothing sequences of owned elements.
//! 5. **Lifecycle** ([`lifecycle`]) - alloc / init / cleanup / free with rollback on
//!    partial construction failure.
//!
//! You describe a resource **once** (its field table and slots) and the engine handles
//! path matching, decoding, encoding and ownership.
//!
//! ## Defining a Resource
//!
//! ```rust
//! use resource_marshal::{
//!     Allocator, FieldDescriptor, FieldKind, Heap, Inject, JsonResource, MarshalError,
//!     Resource, Schema, Slot, SlotMut,
//! };
//!
//! #[derive(Debug, Default)]
//! struct Role {
//!     id: String,
//!     position: i64,
//!     hoist: bool,
//! }
//!
//! impl Schema for Role {
//!     const FIELDS: &'static [FieldDescriptor] = &[
//!         FieldDescriptor::new(&["id"], FieldKind::Str { max_len: 64 }),
//!         FieldDescriptor::new(&["position"], FieldKind::Int),
//!         FieldDescriptor::new(&["hoist"], FieldKind::Bool),
//!     ];
//!
//!     fn slot_mut(&mut self, index: usize) -> SlotMut<'_> {
//!         match index {
//!             0 => SlotMut::Str(&mut self.id),
//!             1 => SlotMut::Int(&mut self.position),
//!             2 => SlotMut::Bool(&mut self.hoist),
//!             _ => SlotMut::Deferred,
//!         }
//!     }
//!
//!     fn slot(&self, index: usize) -> Slot<'_> {
//!         match index {
//!             0 => Slot::Str(&self.id),
//!             1 => Slot::Int(self.position),
//!             2 => Slot::Bool(self.hoist),
//!             _ => Slot::Null,
//!         }
//!     }
//! }
//!
//! impl Resource for Role {
//!     const NAME: &'static str = "Role";
//!
//!     fn init(_alloc: &dyn Allocator) -> Result<Self, MarshalError> {
//!         Ok(Self::default())
//!     }
//!
//!     fn cleanup(&mut self) {
//!         *self = Self::default();
//!     }
//! }
//!
//! impl JsonResource for Role {}
//!
//! let mut role = Role::alloc(&Heap).unwrap();
//! let report = role.from_json(r#"{"id":"41771983423143936","position":3}"#, &Heap).unwrap();
//! assert!(report.is_clean());
//! assert_eq!(
//!     role.to_json().unwrap(),
//!     r#"{"id":"41771983423143936","position":3,"hoist":false}"#
//! );
//! ```
//!
//! ## Ownership
//!
//! Ownership is strictly tree-shaped: a resource owns its mandatory sub-resources as
//! [`Owned<T>`], optional ones as `Option<Owned<T>>` and sequences as
//! [`OwnedList<T>`]. There is no shared or global mutable state; every size and status
//! is a return value.
//!
//! ## Testing
//!
//! The [`Ledger`] allocator counts live reservations and can fail a chosen reservation,
//! so tests can prove that every construction path rolls back without leaks.

pub mod error;
pub mod inject;
pub mod lifecycle;
pub mod list;
pub mod patch;
pub mod scan;
pub mod schema;
pub mod span;
pub mod tracing;

// Re-export core types for convenience
pub use error::MarshalError;
pub use lifecycle::{
    load_list, load_optional_sub, load_sub, Allocator, Heap, JsonResource, Lease, Ledger, Owned,
    Resource,
};
pub use list::{ListElement, OwnedList};
pub use patch::{PatchSwitches, Presence};
pub use scan::{scan, scan_str, FieldFailure, ScanReport, Token};
pub use schema::{
    FieldDescriptor, FieldKind, Inject, Schema, Slot, SlotMut, WireEnum, WirePath,
};
pub use span::RawSpan;

#[doc(hidden)]
pub use serde_json::Value as JsonValue;
