//! # Trie paths
//!
//! Keys are unpacked into symbols over an alphabet of size `arity` before
//! any trie operation. A byte becomes 8 symbols (arity 2), 4 symbols
//! (arity 4), 2 symbols (arity 16) or 1 symbol (arity 256), most significant
//! bits first.

use std::fmt;

use crate::error::{Error, Result};

/// Size of the symbol alphabet, i.e. the maximum number of children per node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathArity {
    Arity2,
    Arity4,
    Arity16,
    Arity256,
}

impl PathArity {
    /// Number of distinct symbols
    pub fn size(&self) -> usize {
        match self {
            PathArity::Arity2 => 2,
            PathArity::Arity4 => 4,
            PathArity::Arity16 => 16,
            PathArity::Arity256 => 256,
        }
    }

    /// Bits carried by one symbol
    pub fn bits_per_symbol(&self) -> u32 {
        match self {
            PathArity::Arity2 => 1,
            PathArity::Arity4 => 2,
            PathArity::Arity16 => 4,
            PathArity::Arity256 => 8,
        }
    }

    /// Symbols produced from one key byte
    pub fn symbols_per_byte(&self) -> usize {
        (8 / self.bits_per_symbol()) as usize
    }

    /// Check that `symbol` belongs to the alphabet
    pub fn contains(&self, symbol: u8) -> bool {
        (symbol as usize) < self.size()
    }

    /// Parse from the numeric alphabet size
    pub fn from_size(size: usize) -> Result<Self> {
        match size {
            2 => Ok(PathArity::Arity2),
            4 => Ok(PathArity::Arity4),
            16 => Ok(PathArity::Arity16),
            256 => Ok(PathArity::Arity256),
            other => Err(Error::config_invalid(format!("unsupported path arity {}", other))
                .with_context("arity", other.to_string())),
        }
    }
}

impl fmt::Display for PathArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arity{}", self.size())
    }
}

/// Unpack key bytes into symbols
pub fn unpack(bytes: &[u8], arity: PathArity) -> Vec<u8> {
    if arity == PathArity::Arity256 {
        return bytes.to_vec();
    }
    let bits = arity.bits_per_symbol();
    let per_byte = arity.symbols_per_byte();
    let mask = (1u8 << bits) - 1;

    let mut symbols = Vec::with_capacity(bytes.len() * per_byte);
    for byte in bytes {
        for i in (0..per_byte).rev() {
            symbols.push((*byte >> (i as u32 * bits)) & mask);
        }
    }
    symbols
}

/// Pack symbols back into key bytes
pub fn pack(symbols: &[u8], arity: PathArity) -> Result<Vec<u8>> {
    if let Some(bad) = symbols.iter().find(|s| !arity.contains(**s)) {
        return Err(crate::error::symbol_out_of_range(*bad, arity.size()));
    }
    if arity == PathArity::Arity256 {
        return Ok(symbols.to_vec());
    }
    let per_byte = arity.symbols_per_byte();
    if symbols.len() % per_byte != 0 {
        return Err(Error::malformed(format!(
            "{} symbols do not pack into whole bytes at {}",
            symbols.len(),
            arity
        )));
    }
    let bits = arity.bits_per_symbol();

    Ok(symbols
        .chunks(per_byte)
        .map(|chunk| chunk.iter().fold(0u8, |acc, s| (acc << bits) | s))
        .collect())
}

/// Length of the common prefix of two symbol sequences
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Concatenate `prefix`, the child symbol and `suffix` into one fragment
pub fn concat(prefix: &[u8], symbol: u8, suffix: &[u8]) -> Vec<u8> {
    let mut ret = Vec::with_capacity(prefix.len() + 1 + suffix.len());
    ret.extend_from_slice(prefix);
    ret.push(symbol);
    ret.extend_from_slice(suffix);
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_arity16() {
        let symbols = unpack(&[0xab, 0xcd], PathArity::Arity16);
        assert_eq!(symbols, vec![0xa, 0xb, 0xc, 0xd]);
    }

    #[test]
    fn test_unpack_arity2() {
        let symbols = unpack(&[0b1010_0001], PathArity::Arity2);
        assert_eq!(symbols, vec![1, 0, 1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_unpack_arity4() {
        let symbols = unpack(&[0b11_01_00_10], PathArity::Arity4);
        assert_eq!(symbols, vec![3, 1, 0, 2]);
    }

    #[test]
    fn test_unpack_arity256_is_identity() {
        assert_eq!(unpack(b"abc", PathArity::Arity256), b"abc".to_vec());
        assert!(unpack(&[], PathArity::Arity16).is_empty());
    }

    #[test]
    fn test_pack_inverts_unpack() {
        let key = b"\x00\x7f\x80\xffkey";
        for arity in [
            PathArity::Arity2,
            PathArity::Arity4,
            PathArity::Arity16,
            PathArity::Arity256,
        ] {
            let symbols = unpack(key, arity);
            assert_eq!(symbols.len(), key.len() * arity.symbols_per_byte());
            assert_eq!(pack(&symbols, arity).unwrap(), key.to_vec());
        }
    }

    #[test]
    fn test_pack_rejects_partial_byte() {
        let err = pack(&[1, 2, 3], PathArity::Arity16).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Malformed);
    }

    #[test]
    fn test_pack_rejects_out_of_range_symbol() {
        let err = pack(&[1, 16], PathArity::Arity16).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Malformed);
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix_len(&[1, 2, 3, 4, 5], &[1, 2, 3, 6, 7]), 3);
        assert_eq!(common_prefix_len(&[1, 2], &[1, 2, 3]), 2);
        assert_eq!(common_prefix_len(&[], &[1]), 0);
    }

    #[test]
    fn test_concat() {
        assert_eq!(concat(&[1, 2], 3, &[4]), vec![1, 2, 3, 4]);
        assert_eq!(concat(&[], 0, &[]), vec![0]);
    }

    #[test]
    fn test_from_size() {
        assert_eq!(PathArity::from_size(16).unwrap(), PathArity::Arity16);
        assert_eq!(
            PathArity::from_size(8).unwrap_err().kind(),
            crate::ErrorKind::ConfigInvalid
        );
    }
}
