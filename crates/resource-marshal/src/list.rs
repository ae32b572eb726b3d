//! # Owned Lists
//!
//! [`OwnedList<T>`] is an ordered sequence of heap-owned elements. It replaces the
//! null-terminated pointer arrays of generated API bindings: element behaviour comes
//! from the [`ListElement`] trait instead of a table of untyped callbacks, and the
//! terminating sentinel is simply the end of the sequence.
//!
//! Invariants:
//! - order always equals wire array order; nothing is sorted or deduplicated,
//! - every element is live and fully initialised,
//! - building from JSON is all or nothing.

use crate::error::MarshalError;
use crate::lifecycle::{Allocator, Owned};
use crate::schema::Inject;
use crate::span::RawSpan;
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Per-element lifecycle used by [`OwnedList`]. Release is the element's `Drop`.
pub trait ListElement: Sized {
    const NAME: &'static str;

    /// Builds a zeroed element.
    fn init_one(alloc: &dyn Allocator) -> Result<Self, MarshalError>;

    /// Fills the element from one array entry.
    fn decode_one(&mut self, span: RawSpan<'_>, alloc: &dyn Allocator) -> Result<(), MarshalError>;

    fn encode_one(&self) -> Value;
}

/// An ordered, exclusively owned sequence of `T`.
pub struct OwnedList<T> {
    items: Vec<Owned<T>>,
}

impl<T> OwnedList<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).map(|item| &**item)
    }

    /// Iterates in insertion order. Each call starts over from the first element.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.items.iter(),
        }
    }

    /// Appends an element, reserving its storage through `alloc`.
    pub fn push(&mut self, alloc: &dyn Allocator, value: T) -> Result<(), MarshalError>
    where
        T: ListElement,
    {
        self.items.push(Owned::reserve(alloc, T::NAME, value)?);
        Ok(())
    }

    /// Releases every element, then the spine. Keeps the list usable.
    pub fn clear(&mut self) {
        self.items.clear();
        self.items.shrink_to_fit();
    }

    /// Releases every element, then the spine. `None` and empty lists are no-ops.
    pub fn free(list: Option<Self>) {
        if let Some(mut list) = list {
            list.clear();
        }
    }
}

impl<T: ListElement> OwnedList<T> {
    /// Builds a list from a JSON array span. `null` yields an empty list.
    ///
    /// If any element fails to allocate or decode, every element built so far is
    /// released and the error is returned.
    pub fn from_json(span: RawSpan<'_>, alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        if span.is_null() {
            return Ok(Self::new());
        }
        let entries: Vec<&RawValue> = serde_json::from_str(span.as_str())
            .map_err(|e| MarshalError::decode(format!("{}[]", T::NAME), e))?;

        let mut list = Self {
            items: Vec::with_capacity(entries.len()),
        };
        for (position, entry) in entries.into_iter().enumerate() {
            let lease = alloc.reserve(T::NAME)?;
            let mut element = T::init_one(alloc)?;
            element
                .decode_one(RawSpan::locate(span.source(), entry), alloc)
                .map_err(|err| match err {
                    MarshalError::Decode { path, reason } => MarshalError::Decode {
                        path: format!("[{position}]{path}"),
                        reason,
                    },
                    other => other,
                })?;
            list.items.push(Owned::new(element, lease));
        }
        debug!(element = T::NAME, len = list.len(), "List loaded");
        Ok(list)
    }
}

impl<T> Default for OwnedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for OwnedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for OwnedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: ListElement> Inject for OwnedList<T> {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ListElement::encode_one).collect())
    }
}

impl<'l, T> IntoIterator for &'l OwnedList<T> {
    type Item = &'l T;
    type IntoIter = Iter<'l, T>;

    fn into_iter(self) -> Iter<'l, T> {
        self.iter()
    }
}

/// Borrowing iterator over an [`OwnedList`].
#[derive(Clone)]
pub struct Iter<'l, T> {
    inner: std::slice::Iter<'l, Owned<T>>,
}

impl<'l, T> Iterator for Iter<'l, T> {
    type Item = &'l T;

    fn next(&mut self) -> Option<&'l T> {
        self.inner.next().map(|item| &**item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|item| &**item)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

fn decode_scalar<T: serde::de::DeserializeOwned>(span: RawSpan<'_>, name: &str) -> Result<T, MarshalError> {
    serde_json::from_str(span.as_str()).map_err(|e| MarshalError::decode("", format!("{name}: {e}")))
}

impl ListElement for u64 {
    const NAME: &'static str = "u64";

    fn init_one(_alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        Ok(0)
    }

    /// Accepts numbers and numeric strings; snowflake ids usually arrive as strings.
    fn decode_one(&mut self, span: RawSpan<'_>, _alloc: &dyn Allocator) -> Result<(), MarshalError> {
        *self = match decode_scalar::<Value>(span, Self::NAME)? {
            Value::String(text) => text
                .parse()
                .map_err(|e| MarshalError::decode("", format!("u64: {e}")))?,
            other => serde_json::from_value(other)
                .map_err(|e| MarshalError::decode("", format!("u64: {e}")))?,
        };
        Ok(())
    }

    fn encode_one(&self) -> Value {
        Value::from(*self)
    }
}

impl ListElement for i64 {
    const NAME: &'static str = "i64";

    fn init_one(_alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        Ok(0)
    }

    fn decode_one(&mut self, span: RawSpan<'_>, _alloc: &dyn Allocator) -> Result<(), MarshalError> {
        *self = decode_scalar(span, Self::NAME)?;
        Ok(())
    }

    fn encode_one(&self) -> Value {
        Value::from(*self)
    }
}

impl ListElement for bool {
    const NAME: &'static str = "bool";

    fn init_one(_alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        Ok(false)
    }

    fn decode_one(&mut self, span: RawSpan<'_>, _alloc: &dyn Allocator) -> Result<(), MarshalError> {
        *self = decode_scalar(span, Self::NAME)?;
        Ok(())
    }

    fn encode_one(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ListElement for String {
    const NAME: &'static str = "String";

    fn init_one(_alloc: &dyn Allocator) -> Result<Self, MarshalError> {
        Ok(String::new())
    }

    fn decode_one(&mut self, span: RawSpan<'_>, _alloc: &dyn Allocator) -> Result<(), MarshalError> {
        *self = decode_scalar(span, Self::NAME)?;
        Ok(())
    }

    fn encode_one(&self) -> Value {
        Value::String(self.clone())
    }
}
