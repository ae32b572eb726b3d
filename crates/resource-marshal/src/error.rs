//! # Marshaling Errors
//!
//! This module defines the error taxonomy shared by the scanner, the injector, the
//! owned list container and the lifecycle manager. By centralizing error definitions,
//! every layer reports failures the same way and callers can tell an allocation
//! failure (roll back, propagate) apart from a field that simply did not decode.

/// Errors that can occur while moving resources between wire JSON and memory.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// Storage for a resource or list element could not be reserved.
    #[error("Allocation failed while constructing {type_name}")]
    Alloc { type_name: &'static str },

    /// The buffer handed to the scanner is not JSON at all.
    #[error("Malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// A value was found at a wire path but could not be decoded into its field.
    #[error("Cannot decode {path}: {reason}")]
    Decode { path: String, reason: String },

    /// The output buffer cannot hold the serialized value. Nothing was written.
    #[error("Buffer too small: {required} bytes required, {available} available")]
    BufferTooSmall { required: usize, available: usize },

    #[error("Cannot encode JSON: {0}")]
    Encode(#[source] serde_json::Error),

    /// A bracketed wire path such as `[author][id]` could not be parsed.
    #[error("Invalid wire path: {0:?}")]
    Path(String),
}

impl MarshalError {
    pub(crate) fn decode(path: impl Into<String>, reason: impl ToString) -> Self {
        MarshalError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Allocation failures abort whole constructions; everything else is local to a field.
    pub fn is_alloc(&self) -> bool {
        matches!(self, MarshalError::Alloc { .. })
    }
}
