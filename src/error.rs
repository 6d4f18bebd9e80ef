//! Error types for editing and applying modifications
//!
//! `EditorError` aborts a single requested edit and leaves the session's
//! pending modifications alone. `ApplyError` aborts a whole apply call.

use thiserror::Error;

/// Failure to turn an edit intent into a modification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// No entity matches the selector
    #[error("no {kind} matches {selector}")]
    NotFound { kind: &'static str, selector: String },

    /// The block that should receive an insert does not exist
    #[error("no `{block} {{ ... }}` block found")]
    BlockNotFound { block: String },

    /// More than one entity matches and the tie-break policy requires a unique match
    #[error("{count} {kind} entries match {selector}; add a configuration to disambiguate")]
    Ambiguous {
        kind: &'static str,
        selector: String,
        count: usize,
    },
}

/// Failure while splicing modifications into text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// Byte range out of bounds, inverted, or not on a char boundary
    #[error("invalid range {byte_start}..{byte_end} (content length: {content_len})")]
    InvalidRange {
        byte_start: usize,
        byte_end: usize,
        content_len: usize,
    },

    /// Text at the recorded range differs and could not be relocated on its line
    #[error("text mismatch: expected {expected:?}, found {actual:?}")]
    TextMismatch { expected: String, actual: String },
}

/// A consistency problem in a modification set, found before applying
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("modification {index}: range {byte_start}..{byte_end} exceeds content length {content_len}")]
    OutOfBounds {
        index: usize,
        byte_start: usize,
        byte_end: usize,
        content_len: usize,
    },

    #[error("modification {index}: end ({byte_end}) < start ({byte_start})")]
    Inverted {
        index: usize,
        byte_start: usize,
        byte_end: usize,
    },

    #[error("modification {index}: offset {offset} is not on a char boundary")]
    NotCharBoundary { index: usize, offset: usize },

    #[error("modification {index}: expected {expected:?} at range, found {actual:?}")]
    OldTextMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("modification {index}: insert must have an empty range and no old text")]
    MalformedInsert { index: usize },

    #[error("modifications {first} and {second} overlap")]
    Overlap { first: usize, second: usize },
}

impl ValidationError {
    /// Index of the offending modification (the later one for overlaps)
    pub fn index(&self) -> usize {
        match self {
            ValidationError::OutOfBounds { index, .. }
            | ValidationError::Inverted { index, .. }
            | ValidationError::NotCharBoundary { index, .. }
            | ValidationError::OldTextMismatch { index, .. }
            | ValidationError::MalformedInsert { index } => *index,
            ValidationError::Overlap { second, .. } => *second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_error_messages() {
        let err = EditorError::NotFound {
            kind: "dependency",
            selector: "com.example:lib".to_string(),
        };
        assert_eq!(err.to_string(), "no dependency matches com.example:lib");

        let err = EditorError::BlockNotFound {
            block: "dependencies".to_string(),
        };
        assert_eq!(err.to_string(), "no `dependencies { ... }` block found");
    }

    #[test]
    fn test_validation_error_index() {
        assert_eq!(ValidationError::MalformedInsert { index: 3 }.index(), 3);
        assert_eq!(ValidationError::Overlap { first: 1, second: 4 }.index(), 4);
    }
}
