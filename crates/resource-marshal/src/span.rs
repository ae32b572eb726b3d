//! # Raw Spans
//!
//! A [`RawSpan`] is a deferred sub-document: a window into the original wire buffer
//! that holds one JSON value the scanner matched but did not decode. The resource that
//! owns the field later hands the span to the nested type's own scanner.

use serde_json::value::RawValue;
use std::fmt;

/// A `(source, offset, length)` view of one unparsed JSON value.
///
/// Offsets always refer to the outermost buffer that was scanned, so spans captured
/// while scanning a nested resource still point into the original response body.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawSpan<'a> {
    source: &'a str,
    offset: usize,
    len: usize,
}

impl<'a> RawSpan<'a> {
    /// Builds a span, returning `None` if the window falls outside `source` or splits a
    /// UTF-8 sequence.
    pub fn new(source: &'a str, offset: usize, len: usize) -> Option<Self> {
        let end = offset.checked_add(len)?;
        source.get(offset..end)?;
        Some(Self {
            source,
            offset,
            len,
        })
    }

    /// A span covering the whole buffer.
    pub fn whole(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            len: source.len(),
        }
    }

    /// Locates a borrowed [`RawValue`] inside `source`.
    ///
    /// `serde_json` borrows raw values straight out of the input, so the value's text is
    /// a subslice of `source`. If it is not (the value was produced from another buffer),
    /// the span falls back to covering the value's own text.
    pub(crate) fn locate(source: &'a str, raw: &'a RawValue) -> Self {
        let text = raw.get();
        let offset = (text.as_ptr() as usize).wrapping_sub(source.as_ptr() as usize);
        match RawSpan::new(source, offset, text.len()) {
            Some(span) if span.as_str().as_ptr() == text.as_ptr() => span,
            _ => RawSpan::whole(text),
        }
    }

    pub fn as_str(&self) -> &'a str {
        &self.source[self.offset..self.offset + self.len]
    }

    /// The buffer this span was cut from.
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the captured value is the JSON literal `null`.
    pub fn is_null(&self) -> bool {
        self.as_str().trim() == "null"
    }
}

impl fmt::Debug for RawSpan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 48;
        let text = self.as_str();
        let preview = match text.char_indices().nth(PREVIEW) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        };
        f.debug_struct("RawSpan")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("text", &preview)
            .finish()
    }
}
