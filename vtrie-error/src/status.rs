//! Error status: how a caller may react to an error

use std::fmt;

/// Whether an operation that failed with this error may succeed if repeated.
///
/// The trie itself never retries. The status only tells the caller what a
/// retry would mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// Repeating the operation will fail the same way
    Permanent,
    /// Repeating the operation may succeed (e.g. a flaky storage backend)
    Temporary,
}

impl ErrorStatus {
    /// Check if this status allows a retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorStatus::Temporary)
    }

    /// Returns the status as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStatus::Permanent => "permanent",
            ErrorStatus::Temporary => "temporary",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
