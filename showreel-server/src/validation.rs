//! Input validation for untrusted data.
//!
//! Document paths and payloads arrive from HTTP and WebSocket clients and
//! are checked here before they touch the store.

use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum length of a document path.
pub const MAX_PATH_LEN: usize = 128;
/// Maximum serialized size of a stored document.
pub const MAX_DOCUMENT_SIZE: usize = 65_536;
/// Maximum WebSocket message size.
pub const MAX_WS_MESSAGE_SIZE: usize = 16_384;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Path exceeds maximum length.
    #[error("path too long (max {MAX_PATH_LEN} chars)")]
    PathTooLong,
    /// Path is empty, has an empty segment, or contains invalid characters.
    #[error("path must be '/'-separated segments of letters, digits, '-' or '_'")]
    PathInvalid,
    /// Document exceeds maximum size.
    #[error("document too large (max {MAX_DOCUMENT_SIZE} bytes)")]
    DocumentTooLarge,
    /// WebSocket message exceeds maximum size.
    #[error("message too large (max {MAX_WS_MESSAGE_SIZE} bytes)")]
    MessageTooLarge,
}

impl ValidationError {
    /// Short label used for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PathTooLong | Self::PathInvalid => "path",
            Self::DocumentTooLarge => "document_size",
            Self::MessageTooLarge => "message_size",
        }
    }
}

/// Check if a character is valid inside a path segment.
fn is_valid_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Validate a document path such as `settings/config`.
///
/// Valid paths:
/// - 1-128 characters
/// - One or more `/`-separated segments
/// - Segments are non-empty and use ASCII letters, digits, `-`, `_`
///
/// # Errors
///
/// Returns [`ValidationError::PathTooLong`] if the path exceeds 128 characters.
/// Returns [`ValidationError::PathInvalid`] otherwise when malformed.
pub fn validate_document_path(path: &str) -> Result<(), ValidationError> {
    if path.len() > MAX_PATH_LEN {
        return Err(ValidationError::PathTooLong);
    }
    let valid = !path.is_empty()
        && path
            .split('/')
            .all(|seg| !seg.is_empty() && seg.chars().all(is_valid_segment_char));
    if !valid {
        return Err(ValidationError::PathInvalid);
    }
    Ok(())
}

/// Validate a document body's serialized size.
///
/// # Errors
///
/// Returns [`ValidationError::DocumentTooLarge`] if the body exceeds 64KB.
pub fn validate_document(data: &Map<String, Value>) -> Result<(), ValidationError> {
    let size = serde_json::to_vec(data).map_or(usize::MAX, |bytes| bytes.len());
    if size > MAX_DOCUMENT_SIZE {
        return Err(ValidationError::DocumentTooLarge);
    }
    Ok(())
}

/// Validate an incoming WebSocket message size.
///
/// # Errors
///
/// Returns [`ValidationError::MessageTooLarge`] if the message exceeds 16KB.
pub fn validate_message_size(len: usize) -> Result<(), ValidationError> {
    if len > MAX_WS_MESSAGE_SIZE {
        return Err(ValidationError::MessageTooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_paths() {
        assert!(validate_document_path("settings/config").is_ok());
        assert!(validate_document_path("config").is_ok());
        assert!(validate_document_path("a-b/c_d/E9").is_ok());
    }

    #[test]
    fn test_invalid_paths() {
        for path in ["", "/", "settings/", "/settings", "a//b", "a b", "a/../b", "ä"] {
            assert_eq!(
                validate_document_path(path),
                Err(ValidationError::PathInvalid),
                "{path:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_path_length_limit() {
        let at_limit = "a".repeat(MAX_PATH_LEN);
        assert!(validate_document_path(&at_limit).is_ok());
        let over = "a".repeat(MAX_PATH_LEN + 1);
        assert_eq!(
            validate_document_path(&over),
            Err(ValidationError::PathTooLong)
        );
    }

    #[test]
    fn test_document_size() {
        let mut small = Map::new();
        small.insert("text".into(), Value::String("hi".into()));
        assert!(validate_document(&small).is_ok());

        let mut big = Map::new();
        big.insert("text".into(), Value::String("x".repeat(MAX_DOCUMENT_SIZE)));
        assert_eq!(
            validate_document(&big),
            Err(ValidationError::DocumentTooLarge)
        );
    }

    #[test]
    fn test_message_size() {
        assert!(validate_message_size(MAX_WS_MESSAGE_SIZE).is_ok());
        assert_eq!(
            validate_message_size(MAX_WS_MESSAGE_SIZE + 1),
            Err(ValidationError::MessageTooLarge)
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ValidationError::PathInvalid.kind(), "path");
        assert_eq!(ValidationError::MessageTooLarge.kind(), "message_size");
    }

    proptest! {
        #[test]
        fn prop_generated_paths_are_valid(segments in prop::collection::vec("[a-zA-Z0-9_-]{1,10}", 1..5)) {
            let path = segments.join("/");
            prop_assert!(validate_document_path(&path).is_ok());
        }

        #[test]
        fn prop_paths_with_dots_are_rejected(prefix in "[a-z]{1,8}", suffix in "[a-z]{1,8}") {
            let path = format!("{prefix}.{suffix}");
            prop_assert!(validate_document_path(&path).is_err());
        }
    }
}
