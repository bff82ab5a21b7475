//! # Error types for the trie
//!
//! Re-exports vtrie-error and provides trie-specific conveniences.

pub use vtrie_error::{Error, ErrorKind, ErrorStatus, Result};

/// Wrap an RLP decoding failure as a Malformed error
pub fn decode_failed(what: &'static str, err: alloy_rlp::Error) -> Error {
    Error::malformed(format!("cannot decode {}: {}", what, err))
        .with_context("item", what)
        .set_source(err)
}

/// Create an InvariantViolation error for a key walk that left the key bounds
pub fn key_out_of_bounds(consumed: usize, key_len: usize) -> Error {
    Error::invariant_violation(format!(
        "consumed prefix of {} symbols exceeds unpacked key of {} symbols",
        consumed, key_len
    ))
    .with_context("consumed", consumed.to_string())
    .with_context("key_len", key_len.to_string())
}

/// Create a Malformed error for a child symbol outside the alphabet
pub fn symbol_out_of_range(symbol: u8, arity: usize) -> Error {
    Error::malformed(format!("symbol {} out of range for arity {}", symbol, arity))
        .with_context("symbol", symbol.to_string())
        .with_context("arity", arity.to_string())
}
