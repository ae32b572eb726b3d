//! # Tri-State Patch Switches
//!
//! Update endpoints distinguish three wire states per optional field: omitted, `null`
//! and a value. JSON alone cannot carry "omitted" once a struct exists in memory, so
//! patch resources keep a [`PatchSwitches`] alongside their values and report each
//! field's [`Presence`] to the injector.
//!
//! The switches uphold one invariant: a field is never null-requested without also
//! being defined.
//!
//! A patch resource states its field count against [`PatchSwitches::CAPACITY`] with
//! [`assert_patch_fields!`](crate::assert_patch_fields), which fails the build when the
//! table outgrows the switches.

use crate::scan::ScanReport;

/// How the injector treats one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    /// Emit the current value.
    Emit,
    /// Emit JSON `null`, asking the server to clear the field.
    Null,
    /// Leave the field out of the payload entirely.
    Omit,
}

/// Defined / null-requested bits for up to [`PatchSwitches::CAPACITY`] fields,
/// indexed like the resource's field table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchSwitches {
    defined: u64,
    null: u64,
}

impl PatchSwitches {
    pub const CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a field table of `field_count` entries can be tracked.
    pub const fn fits(field_count: usize) -> bool {
        field_count <= Self::CAPACITY
    }

    fn bit(index: usize) -> u64 {
        assert!(index < Self::CAPACITY, "field index {index} out of range");
        1u64 << index
    }

    /// Marks the field as supplied; its current value will be sent.
    pub fn define(&mut self, index: usize) {
        let bit = Self::bit(index);
        self.defined |= bit;
        self.null &= !bit;
    }

    /// Marks the field as supplied and to be cleared on the server.
    pub fn request_null(&mut self, index: usize) {
        let bit = Self::bit(index);
        self.defined |= bit;
        self.null |= bit;
    }

    /// Forgets any intent for the field; it will be omitted.
    pub fn undefine(&mut self, index: usize) {
        let bit = Self::bit(index);
        self.defined &= !bit;
        self.null &= !bit;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_defined(&self, index: usize) -> bool {
        self.defined & Self::bit(index) != 0
    }

    pub fn is_null_requested(&self, index: usize) -> bool {
        self.null & Self::bit(index) != 0
    }

    pub fn presence(&self, index: usize) -> Presence {
        match (self.is_defined(index), self.is_null_requested(index)) {
            (false, _) => Presence::Omit,
            (true, true) => Presence::Null,
            (true, false) => Presence::Emit,
        }
    }

    /// Adopts what the wire said as patch intent: fields present in the scanned
    /// document become defined, fields present as `null` become null-requested.
    ///
    /// Scanning never does this on its own.
    pub fn record_scan(&mut self, report: &ScanReport<'_>) {
        for &index in report.present() {
            self.define(index);
        }
        for &index in report.nulls() {
            self.request_null(index);
        }
    }
}

/// Fails compilation when a patch resource has more fields than [`PatchSwitches`]
/// can track.
#[macro_export]
macro_rules! assert_patch_fields {
    ($resource:ty) => {
        const _: () = assert!(
            $crate::patch::PatchSwitches::fits(
                <$resource as $crate::schema::Schema>::FIELDS.len()
            ),
            "patch resource has more fields than PatchSwitches::CAPACITY"
        );
    };
}
