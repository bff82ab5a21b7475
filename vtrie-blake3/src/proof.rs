//! # Proofs
//!
//! Self-contained proof of inclusion or absence for one key, validated with
//! the model alone.
//!
//! Wire layout (RLP): `[key, ending, [[node, child_index], ...]]`

use std::fmt;

use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use vtrie::codec::{decode_bytes, decode_exact, decode_list_payload, list_length, to_bytes};
use vtrie::path::unpack;
use vtrie::{
    validate_path, validate_path_with_value, CommitmentModel, ProofElement, ProofEnding, ProofGeneric,
};

use crate::commitment::{HashCommitment, Terminal};
use crate::error::{Error, Result};
use crate::model::Blake3Model;

/// One node on the path of a BLAKE3 proof
pub type Element = ProofElement<HashCommitment, Terminal>;

/// Key remainder and terminal proven by an inclusion proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWithTerminal {
    /// Unpacked symbols of the last node's fragment
    pub key_remainder: Vec<u8>,
    /// The value itself, or its digest when `is_hash`
    pub terminal: Vec<u8>,
    pub is_hash: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub key: Vec<u8>,
    pub path: Vec<Element>,
    pub ending: ProofEnding,
}

impl From<ProofGeneric<HashCommitment, Terminal>> for Proof {
    fn from(generic: ProofGeneric<HashCommitment, Terminal>) -> Self {
        Proof {
            key: generic.key,
            path: generic.path,
            ending: generic.ending,
        }
    }
}

impl Proof {
    pub fn to_bytes(&self) -> Vec<u8> {
        to_bytes(self)
    }

    /// Decode a proof; any structural defect or trailing byte is Malformed
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_exact("proof", bytes).map_err(|e| e.with_operation("proof::from_bytes"))
    }

    /// Exact length of `to_bytes()`
    pub fn encoded_size(&self) -> usize {
        self.length()
    }

    /// Check this proof against `root`, `None` for the empty trie
    pub fn validate(&self, model: &Blake3Model, root: Option<&HashCommitment>) -> Result<()> {
        validate_path(model, &self.key, &self.path, self.ending, root)
    }

    /// Check this proof against `root` and require it to prove `value`
    pub fn validate_with_value(
        &self,
        model: &Blake3Model,
        root: Option<&HashCommitment>,
        value: &[u8],
    ) -> Result<()> {
        validate_path_with_value(model, &self.key, &self.path, self.ending, root, value)
    }

    /// Terminal proven for the key, if any
    pub fn terminal(&self) -> Option<&Terminal> {
        if self.ending != ProofEnding::Terminal {
            return None;
        }
        self.path.last().and_then(|e| e.node.terminal.as_ref())
    }

    pub fn is_proof_of_absence(&self) -> bool {
        self.terminal().is_none()
    }

    pub fn key_with_terminal(&self) -> Result<KeyWithTerminal> {
        let (Some(last), Some(terminal)) = (self.path.last(), self.terminal()) else {
            return Err(Error::invalid_argument("proof of absence has no terminal")
                .with_operation("proof::key_with_terminal")
                .with_context("key", hex::encode(&self.key)));
        };
        Ok(KeyWithTerminal {
            key_remainder: last.node.path_fragment.clone(),
            terminal: terminal.data().to_vec(),
            is_hash: terminal.is_hash(),
        })
    }

    /// The key unpacked into symbols of the model's alphabet
    pub fn unpacked_key(&self, model: &Blake3Model) -> Vec<u8> {
        unpack(&self.key, model.path_arity())
    }

    fn path_payload_length(&self) -> usize {
        self.path.iter().map(|e| e.length()).sum()
    }

    fn payload_length(&self) -> usize {
        self.key.as_slice().length()
            + self.ending.code().length()
            + list_length(self.path_payload_length())
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "proof(key: {}, path length: {}, ending: {}, {} bytes)",
            hex::encode(&self.key),
            self.path.len(),
            self.ending,
            self.encoded_size()
        )
    }
}

impl Encodable for Proof {
    fn encode(&self, out: &mut dyn BufMut) {
        Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        self.key.as_slice().encode(out);
        self.ending.code().encode(out);
        Header {
            list: true,
            payload_length: self.path_payload_length(),
        }
        .encode(out);
        for element in &self.path {
            element.encode(out);
        }
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

impl Decodable for Proof {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut payload = decode_list_payload(buf)?;
        let key = decode_bytes(&mut payload)?.to_vec();
        let ending = ProofEnding::from_code(u8::decode(&mut payload)?)
            .map_err(|_| alloy_rlp::Error::Custom("unknown proof ending"))?;

        let mut path_payload = decode_list_payload(&mut payload)?;
        let mut path = Vec::new();
        while !path_payload.is_empty() {
            path.push(Element::decode(&mut path_payload)?);
        }
        if !payload.is_empty() {
            return Err(alloy_rlp::Error::Custom("unexpected items in proof"));
        }
        Ok(Proof { key, path, ending })
    }
}
