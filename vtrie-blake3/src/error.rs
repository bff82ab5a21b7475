//! Error types for the BLAKE3 model
//!
//! Re-exports vtrie-error and provides model-specific conveniences.

pub use vtrie_error::{Error, ErrorKind, ErrorStatus, Result};

/// Create a ConfigInvalid error for an unsupported hash width
pub fn unsupported_hash_size(size: usize) -> Error {
    Error::config_invalid(format!("hash size {} is not supported, expected 20 or 32", size))
        .with_context("hash_size", size.to_string())
}

/// Create a ConfigInvalid error for an unsupported arity
pub fn unsupported_arity(arity: usize) -> Error {
    Error::config_invalid(format!("arity {} is not supported, expected 2, 4, 16 or 256", arity))
        .with_context("arity", arity.to_string())
}
