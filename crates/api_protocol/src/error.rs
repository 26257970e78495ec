//! Stable error codes and validation error shapes.

use serde::{Deserialize, Serialize};

/// Stable machine-readable error codes.
///
/// Human-readable message text may change; these strings may not. They
/// ride next to the message in every error response body.
pub mod error_codes {
    /// Malformed or invalid request parameters.
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    /// Missing or invalid session.
    pub const AUTHENTICATION_REQUIRED: &str = "AUTHENTICATION_REQUIRED";
    /// Authenticated but not allowed to perform this action.
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    /// Referenced project/folder/file/user/room absent.
    pub const RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
    /// Duplicate email/username, already-friends, already-collaborator,
    /// self-block.
    pub const CONFLICT: &str = "CONFLICT";
    /// The recipient has blocked the sender.
    pub const BLOCKED: &str = "BLOCKED";
    /// Message text was empty.
    pub const EMPTY_MESSAGE: &str = "EMPTY_MESSAGE";
    /// Storage or transport failure; details are not leaked.
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// A single field validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The offending field.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_serialization() {
        let error = FieldError::new("email", "Email is already taken");
        let json = serde_json::to_string(&error).unwrap();

        assert!(json.contains("email"));
        assert!(json.contains("already taken"));
    }
}
