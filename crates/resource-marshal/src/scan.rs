//! # Path-Schema Scanner
//!
//! Reads wire JSON against a resource's field table and fills the resource in place.
//!
//! ## Two phases
//!
//! Scalars (strings, booleans, integers, enum codes) are decoded directly into their
//! slots. Nested objects and arrays are *not* decoded here: the scanner captures the
//! matched sub-document as a [`RawSpan`] token and returns it in the [`ScanReport`].
//! The owning resource then runs the nested type's own scanner on that span (see
//! [`JsonResource::load_tokens`](crate::lifecycle::JsonResource::load_tokens)). One
//! generic path-matching pass therefore serves arbitrarily deep schemas.
//!
//! ## Merge semantics
//!
//! A key missing from the document leaves its field untouched, so repeated partial
//! scans accumulate into the same instance. Call `cleanup` first for a clean overwrite.
//! A key present as `null` resets a scalar to its zero value.
//!
//! ## Failures
//!
//! Only a buffer that is not JSON (or not an object) fails the whole scan. A value that
//! does not fit its field is recorded as a [`FieldFailure`] and the scan moves on.

use crate::error::MarshalError;
use crate::schema::{FieldDescriptor, FieldKind, Schema, SlotMut, WirePath};
use crate::span::RawSpan;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

type Object<'a> = HashMap<String, &'a RawValue>;

/// A nested sub-document captured during a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    /// Index of the field in the resource's table.
    pub index: usize,
    pub span: RawSpan<'a>,
}

/// One field that was present on the wire but could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldFailure {
    pub path: WirePath,
    pub reason: String,
}

/// Everything a scan learned besides the values it wrote.
#[derive(Debug, Default)]
pub struct ScanReport<'a> {
    tokens: Vec<Token<'a>>,
    failures: Vec<FieldFailure>,
    present: Vec<usize>,
    nulls: Vec<usize>,
}

impl<'a> ScanReport<'a> {
    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    /// Removes and returns the captured span for field `index`, if any.
    pub fn take_token(&mut self, index: usize) -> Option<RawSpan<'a>> {
        let position = self.tokens.iter().position(|token| token.index == index)?;
        Some(self.tokens.remove(position).span)
    }

    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    /// True when every present field decoded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Indices of fields whose path was found in the document.
    pub fn present(&self) -> &[usize] {
        &self.present
    }

    /// Indices of fields whose path was found holding `null`.
    pub fn nulls(&self) -> &[usize] {
        &self.nulls
    }

    pub fn record_failure(&mut self, path: WirePath, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(%path, %reason, "Field decode failed");
        self.failures.push(FieldFailure { path, reason });
    }

    /// Folds the outcome of a nested load into this report.
    ///
    /// Allocation failures are returned so the caller can abort and roll back; any other
    /// error becomes a failure of `field` and the scan carries on.
    pub fn settle<T>(
        &mut self,
        field: &FieldDescriptor,
        outcome: Result<T, MarshalError>,
    ) -> Result<Option<T>, MarshalError> {
        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_alloc() => Err(err),
            Err(err) => {
                self.record_failure(field.wire_path(), err.to_string());
                Ok(None)
            }
        }
    }

    /// Copies a nested report's failures into this one, prefixed with `field`'s path.
    pub fn absorb(&mut self, field: &FieldDescriptor, nested: ScanReport<'a>) {
        let prefix = field.wire_path();
        for failure in nested.failures {
            self.failures.push(FieldFailure {
                path: failure.path.nested_under(&prefix),
                reason: failure.reason,
            });
        }
    }
}

/// Scans the whole of `json` into `target`.
pub fn scan_str<'a, R: Schema>(json: &'a str, target: &mut R) -> Result<ScanReport<'a>, MarshalError> {
    scan(RawSpan::whole(json), target)
}

/// Scans the document in `span` into `target`.
pub fn scan<'a, R: Schema>(span: RawSpan<'a>, target: &mut R) -> Result<ScanReport<'a>, MarshalError> {
    let text = span.as_str();
    let _: &RawValue = serde_json::from_str(text).map_err(MarshalError::Syntax)?;
    let root: Object<'a> =
        serde_json::from_str(text).map_err(|e| MarshalError::decode("(root)", e))?;

    let mut report = ScanReport::default();
    for (index, field) in R::FIELDS.iter().enumerate() {
        let raw = match resolve(&root, field.path) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                trace!(path = %field.wire_path(), "Missing, left untouched");
                continue;
            }
            Err(reason) => {
                report.record_failure(field.wire_path(), reason);
                continue;
            }
        };

        report.present.push(index);
        if raw.get() == "null" {
            report.nulls.push(index);
        }

        if field.kind.is_deferred() {
            let token = Token {
                index,
                span: RawSpan::locate(span.source(), raw),
            };
            trace!(path = %field.wire_path(), offset = token.span.offset(), len = token.span.len(), "Captured");
            report.tokens.push(token);
            continue;
        }

        if let Err(reason) = decode_scalar(target.slot_mut(index), field.kind, raw) {
            report.record_failure(field.wire_path(), reason);
        }
    }

    debug!(
        fields = R::FIELDS.len(),
        present = report.present.len(),
        tokens = report.tokens.len(),
        failures = report.failures.len(),
        "Scanned"
    );
    Ok(report)
}

/// Follows `path` through nested objects.
///
/// `Ok(None)` means some key along the way is absent. An intermediate value that is
/// not an object is an error for this field.
fn resolve<'a>(root: &Object<'a>, path: &[&str]) -> Result<Option<&'a RawValue>, String> {
    let Some((first, rest)) = path.split_first() else {
        return Err("empty wire path".to_string());
    };
    let Some(mut current) = root.get(*first).copied() else {
        return Ok(None);
    };
    for key in rest {
        let object: Object<'a> = serde_json::from_str(current.get())
            .map_err(|_| format!("expected an object before [{key}]"))?;
        match object.get(*key) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn decode_scalar(slot: SlotMut<'_>, kind: FieldKind, raw: &RawValue) -> Result<(), String> {
    let text = raw.get();
    let is_null = text == "null";
    match (slot, kind) {
        (SlotMut::Str(dst), FieldKind::Str { max_len }) => {
            if is_null {
                dst.clear();
                return Ok(());
            }
            *dst = decode_bounded(text, max_len)?;
        }
        (SlotMut::OptStr(dst), FieldKind::Str { max_len }) => {
            *dst = if is_null {
                None
            } else {
                Some(decode_bounded(text, max_len)?)
            };
        }
        (SlotMut::Bool(dst), FieldKind::Bool) => {
            *dst = if is_null { false } else { decode(text)? };
        }
        (SlotMut::Int(dst), FieldKind::Int) => {
            *dst = if is_null { 0 } else { decode(text)? };
        }
        (SlotMut::Enum(dst), FieldKind::Enum) => {
            let code: i64 = if is_null { 0 } else { decode(text)? };
            dst.assign_code(code)?;
        }
        (_, kind) => return Err(format!("slot does not hold a {kind:?} value")),
    }
    Ok(())
}

fn decode_bounded(text: &str, max_len: usize) -> Result<String, String> {
    let value: String = decode(text)?;
    let count = value.chars().count();
    if count > max_len {
        return Err(format!(
            "string of {count} characters exceeds the {max_len} character bound"
        ));
    }
    Ok(value)
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    serde_json::from_str(text).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Inject, Slot, WireEnum};

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    enum Shade {
        #[default]
        Light,
        Dark,
    }

    impl WireEnum for Shade {
        fn code(&self) -> i64 {
            *self as i64
        }

        fn assign_code(&mut self, code: i64) -> Result<(), String> {
            *self = match code {
                0 => Shade::Light,
                1 => Shade::Dark,
                other => return Err(format!("unknown shade {other}")),
            };
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Reading {
        name: String,
        active: bool,
        count: i64,
        shade: Shade,
        city: String,
        nickname: Option<String>,
    }

    impl Schema for Reading {
        const FIELDS: &'static [FieldDescriptor] = &[
            FieldDescriptor::new(&["name"], FieldKind::Str { max_len: 8 }),
            FieldDescriptor::new(&["active"], FieldKind::Bool),
            FieldDescriptor::new(&["count"], FieldKind::Int),
            FieldDescriptor::new(&["shade"], FieldKind::Enum),
            FieldDescriptor::new(&["address", "city"], FieldKind::Str { max_len: 32 }),
            FieldDescriptor::new(&["tags"], FieldKind::List),
            FieldDescriptor::new(&["owner"], FieldKind::Object),
            FieldDescriptor::new(&["nickname"], FieldKind::Str { max_len: 8 }),
        ];

        fn slot_mut(&mut self, index: usize) -> SlotMut<'_> {
            match index {
                0 => SlotMut::Str(&mut self.name),
                1 => SlotMut::Bool(&mut self.active),
                2 => SlotMut::Int(&mut self.count),
                3 => SlotMut::Enum(&mut self.shade),
                4 => SlotMut::Str(&mut self.city),
                7 => SlotMut::OptStr(&mut self.nickname),
                _ => SlotMut::Deferred,
            }
        }

        fn slot(&self, index: usize) -> Slot<'_> {
            match index {
                0 => Slot::Str(&self.name),
                1 => Slot::Bool(self.active),
                2 => Slot::Int(self.count),
                3 => Slot::Enum(self.shade.code()),
                4 => Slot::Str(&self.city),
                7 => Slot::OptStr(self.nickname.as_deref()),
                _ => Slot::Null,
            }
        }
    }

    #[test]
    fn decodes_scalars_and_nested_paths() {
        let mut reading = Reading::default();
        let report = scan_str(
            r#"{"name":"ada","active":true,"count":-4,"shade":1,"address":{"city":"Oslo"}}"#,
            &mut reading,
        )
        .unwrap();

        assert!(report.is_clean());
        assert_eq!(reading.name, "ada");
        assert!(reading.active);
        assert_eq!(reading.count, -4);
        assert_eq!(reading.shade, Shade::Dark);
        assert_eq!(reading.city, "Oslo");
        assert_eq!(report.present(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn missing_keys_leave_fields_untouched() {
        let mut reading = Reading {
            name: "keep".into(),
            count: 9,
            ..Reading::default()
        };
        scan_str(r#"{"active":true}"#, &mut reading).unwrap();
        scan_str(r#"{"count":10}"#, &mut reading).unwrap();

        assert_eq!(reading.name, "keep");
        assert!(reading.active);
        assert_eq!(reading.count, 10);
    }

    #[test]
    fn null_resets_scalars_and_is_recorded() {
        let mut reading = Reading {
            name: "gone".into(),
            count: 3,
            ..Reading::default()
        };
        let report = scan_str(r#"{"name":null,"count":null}"#, &mut reading).unwrap();

        assert_eq!(reading.name, "");
        assert_eq!(reading.count, 0);
        assert_eq!(report.nulls(), &[0, 2]);
    }

    #[test]
    fn nullable_strings_keep_null_distinct_from_empty() {
        let mut reading = Reading::default();
        scan_str(r#"{"nickname":""}"#, &mut reading).unwrap();
        assert_eq!(reading.nickname.as_deref(), Some(""));

        let report = scan_str(r#"{"nickname":null}"#, &mut reading).unwrap();
        assert_eq!(reading.nickname, None);
        assert_eq!(report.nulls(), &[7]);

        scan_str(r#"{"nickname":"ada"}"#, &mut reading).unwrap();
        let report = scan_str(r#"{"nickname":"far too long"}"#, &mut reading).unwrap();
        assert_eq!(report.failures()[0].path.to_string(), "[nickname]");
        assert_eq!(reading.nickname.as_deref(), Some("ada"));
    }

    #[test]
    fn null_string_survives_scan_then_inject() {
        let mut reading = Reading::default();
        scan_str(r#"{"name":"ada","nickname":null}"#, &mut reading).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&reading.to_json().unwrap()).unwrap();
        assert_eq!(written["name"], "ada");
        assert!(written["nickname"].is_null());
    }

    #[test]
    fn bad_fields_fail_alone() {
        let mut reading = Reading::default();
        let report = scan_str(
            r#"{"name":"far too long","active":"yes","count":7,"shade":5,"address":"none"}"#,
            &mut reading,
        )
        .unwrap();

        let failed: Vec<String> = report.failures().iter().map(|f| f.path.to_string()).collect();
        assert_eq!(failed, vec!["[name]", "[active]", "[shade]", "[address][city]"]);
        assert_eq!(reading.name, "");
        assert_eq!(reading.count, 7);
        assert_eq!(reading.shade, Shade::Light);
    }

    #[test]
    fn nested_values_are_captured_not_decoded() {
        let json = r#"{"tags":[1, 2],"owner":{"name":"x"},"count":1}"#;
        let mut reading = Reading::default();
        let mut report = scan_str(json, &mut reading).unwrap();

        assert_eq!(report.tokens().len(), 2);
        let tags = report.take_token(5).unwrap();
        assert_eq!(tags.as_str(), "[1, 2]");
        assert_eq!(tags.offset(), 8);
        let owner = report.take_token(6).unwrap();
        assert_eq!(owner.as_str(), r#"{"name":"x"}"#);
        assert!(report.take_token(6).is_none());
    }

    #[test]
    fn nested_scan_keeps_offsets_in_original_buffer() {
        let json = r#"{"owner":{"tags":[3]}}"#;
        let mut reading = Reading::default();
        let mut report = scan_str(json, &mut reading).unwrap();
        let owner = report.take_token(6).unwrap();

        let mut inner = Reading::default();
        let mut nested = scan(owner, &mut inner).unwrap();
        let tags = nested.take_token(5).unwrap();
        assert_eq!(tags.source(), json);
        assert_eq!(&json[tags.offset()..tags.offset() + tags.len()], "[3]");
    }

    #[test]
    fn malformed_document_fails_whole_scan() {
        let mut reading = Reading::default();
        assert!(matches!(
            scan_str(r#"{"name":"#, &mut reading),
            Err(MarshalError::Syntax(_))
        ));
        assert!(matches!(
            scan_str("[1,2]", &mut reading),
            Err(MarshalError::Decode { .. })
        ));
    }

    #[test]
    fn absorb_prefixes_nested_failures() {
        const OWNER: FieldDescriptor = FieldDescriptor::new(&["owner"], FieldKind::Object);
        let mut outer = ScanReport::default();
        let mut inner = ScanReport::default();
        inner.record_failure(WirePath::parse("[name]").unwrap(), "too long");

        outer.absorb(&OWNER, inner);
        assert_eq!(outer.failures()[0].path.to_string(), "[owner][name]");
    }

    #[test]
    fn settle_propagates_only_allocation_failures() {
        const OWNER: FieldDescriptor = FieldDescriptor::new(&["owner"], FieldKind::Object);
        let mut report = ScanReport::default();

        let kept = report
            .settle::<()>(&OWNER, Err(MarshalError::decode("[x]", "bad")))
            .unwrap();
        assert!(kept.is_none());
        assert_eq!(report.failures().len(), 1);

        let aborted = report.settle::<()>(&OWNER, Err(MarshalError::Alloc { type_name: "Reading" }));
        assert!(matches!(aborted, Err(MarshalError::Alloc { .. })));
    }
}
