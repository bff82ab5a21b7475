//! # Hash commitments
//!
//! Vector commitments are truncated BLAKE3 digests. Terminal commitments
//! hold short values verbatim and longer ones as a digest, with a flag
//! telling the two apart.

use std::fmt;

use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use vtrie::codec::{decode_bytes, decode_list_payload, list_length};

use crate::config::HASH_SIZES;
use crate::error::{unsupported_hash_size, Result};

/// Truncated BLAKE3 digest of a node
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashCommitment(pub(crate) Vec<u8>);

impl HashCommitment {
    /// Wrap a raw digest of a supported width
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if !HASH_SIZES.contains(&bytes.len()) {
            return Err(unsupported_hash_size(bytes.len()).with_operation("hash_commitment::from_slice"));
        }
        Ok(HashCommitment(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for HashCommitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for HashCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for HashCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashCommitment({})", hex::encode(&self.0))
    }
}

impl Encodable for HashCommitment {
    fn encode(&self, out: &mut dyn BufMut) {
        self.0.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        self.0.as_slice().length()
    }
}

impl Decodable for HashCommitment {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let bytes = decode_bytes(buf)?;
        if !HASH_SIZES.contains(&bytes.len()) {
            return Err(alloy_rlp::Error::Custom("unexpected hash commitment length"));
        }
        Ok(HashCommitment(bytes.to_vec()))
    }
}

/// Commitment to a stored value
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Terminal {
    pub(crate) data: Vec<u8>,
    pub(crate) is_hash: bool,
}

impl Terminal {
    /// The value itself, or its digest when `is_hash`
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_hash(&self) -> bool {
        self.is_hash
    }

    fn payload_length(&self) -> usize {
        self.data.as_slice().length() + u8::from(self.is_hash).length()
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_hash { "hash" } else { "value" };
        write!(f, "Terminal({}: {})", kind, hex::encode(&self.data))
    }
}

// [data, is_hash]
impl Encodable for Terminal {
    fn encode(&self, out: &mut dyn BufMut) {
        Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        self.data.as_slice().encode(out);
        u8::from(self.is_hash).encode(out);
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

impl Decodable for Terminal {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut payload = decode_list_payload(buf)?;
        let data = decode_bytes(&mut payload)?.to_vec();
        let is_hash = match u8::decode(&mut payload)? {
            0 => false,
            1 => true,
            _ => return Err(alloy_rlp::Error::Custom("terminal flag must be 0 or 1")),
        };
        if !payload.is_empty() {
            return Err(alloy_rlp::Error::Custom("unexpected items in terminal"));
        }
        if data.is_empty() || (is_hash && !HASH_SIZES.contains(&data.len())) {
            return Err(alloy_rlp::Error::Custom("invalid terminal data length"));
        }
        Ok(Terminal { data, is_hash })
    }
}
