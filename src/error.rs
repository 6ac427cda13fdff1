//! Error types for reading encoded buffers
//!
//! Mutation never fails, so the only error channel in the library is the
//! decode path: a view-mode accessor hitting a truncated, out-of-bounds or
//! incomplete buffer.

use thiserror::Error;

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A read would go past the end of the buffer
    #[error("offset {offset} out of bounds for buffer of {len} bytes")]
    OutOfBounds { offset: usize, len: usize },

    /// A table points at a vtable that cannot be valid
    #[error("invalid vtable for table at position {position}")]
    InvalidVTable { position: usize },

    /// A required/key field is absent
    #[error("{table} is missing required field {field}")]
    MissingField {
        table: &'static str,
        field: &'static str,
    },

    /// A string field does not hold UTF-8
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// A stored identifier is not a hex-encoded digest
    #[error("invalid {kind}: {value:?}")]
    InvalidId { kind: &'static str, value: String },
}

impl DecodeError {
    pub(crate) fn out_of_bounds(offset: usize, len: usize) -> Self {
        DecodeError::OutOfBounds { offset, len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = DecodeError::MissingField {
            table: "Info",
            field: "ID",
        };
        assert_eq!(err.to_string(), "Info is missing required field ID");
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = DecodeError::out_of_bounds(40, 12);
        assert_eq!(
            err.to_string(),
            "offset 40 out of bounds for buffer of 12 bytes"
        );
    }
}
