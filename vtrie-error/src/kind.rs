//! Error kinds for trie operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to tell an ordinary outcome (a proof that does
/// not validate) from a structural one (a corrupted store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid configuration of a commitment model
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // Node store errors
    // =========================================================================
    /// The supplied root commitment does not resolve in the node store
    RootNotFound,

    /// A child commitment recorded in a parent does not resolve
    NodeNotFound,

    /// The key/value backend failed
    StorageFailed,

    // =========================================================================
    // Codec errors
    // =========================================================================
    /// Bytes are structurally invalid or not fully consumed
    Malformed,

    // =========================================================================
    // Proof errors
    // =========================================================================
    /// A proof does not validate against the claimed root or value
    ValidationFailed,

    // =========================================================================
    // Structural errors
    // =========================================================================
    /// A trie invariant does not hold: corrupted trie or programming error
    InvariantViolation,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            ErrorKind::RootNotFound => "RootNotFound",
            ErrorKind::NodeNotFound => "NodeNotFound",
            ErrorKind::StorageFailed => "StorageFailed",

            ErrorKind::Malformed => "Malformed",

            ErrorKind::ValidationFailed => "ValidationFailed",

            ErrorKind::InvariantViolation => "InvariantViolation",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::StorageFailed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::RootNotFound.to_string(), "RootNotFound");
        assert_eq!(ErrorKind::ValidationFailed.to_string(), "ValidationFailed");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::StorageFailed.is_retryable());
        assert!(!ErrorKind::Malformed.is_retryable());
        assert!(!ErrorKind::ValidationFailed.is_retryable());
        assert!(!ErrorKind::InvariantViolation.is_retryable());
    }
}
