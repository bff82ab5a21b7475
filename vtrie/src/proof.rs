//! # Generic proofs
//!
//! Root-to-node paths extracted from persisted state. A path ends in one of
//! four ways:
//!
//! - `Terminal`: the key ends exactly at the last node
//! - `Split`: the key diverges inside the last node's fragment
//! - `Extend`: the key continues past the last node into a missing child
//! - `RootNotFound`: the claimed root is not in the store
//!
//! Only the first one (with a terminal present) proves inclusion.

use std::fmt;

use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use tracing::trace;

use crate::codec::{decode_list_payload, list_length};
use crate::commitment::{CommitmentModel, ModelNode};
use crate::error::{key_out_of_bounds, Error, Result};
use crate::kv::KVReader;
use crate::node::NodeData;
use crate::node_store::NodeStore;
use crate::path::{common_prefix_len, unpack};

/// How a proof path terminates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofEnding {
    Terminal,
    Split,
    Extend,
    RootNotFound,
}

impl ProofEnding {
    /// Wire code
    pub fn code(&self) -> u8 {
        match self {
            ProofEnding::Terminal => 0,
            ProofEnding::Split => 1,
            ProofEnding::Extend => 2,
            ProofEnding::RootNotFound => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(ProofEnding::Terminal),
            1 => Ok(ProofEnding::Split),
            2 => Ok(ProofEnding::Extend),
            3 => Ok(ProofEnding::RootNotFound),
            _ => Err(Error::malformed(format!("unknown proof ending code {code}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProofEnding::Terminal => "terminal",
            ProofEnding::Split => "split",
            ProofEnding::Extend => "extend",
            ProofEnding::RootNotFound => "root_not_found",
        }
    }
}

impl fmt::Display for ProofEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One node on a proof path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofElement<V, T> {
    pub node: NodeData<V, T>,
    /// Symbol followed to the next element. On the last element: the missing
    /// child for `Extend`, otherwise 0.
    pub child_index: u8,
}

/// Model-independent proof for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofGeneric<V, T> {
    /// The original, packed key
    pub key: Vec<u8>,
    pub path: Vec<ProofElement<V, T>>,
    pub ending: ProofEnding,
}

impl<V, T> ProofGeneric<V, T> {
    /// The terminal proven for the key, if this is a proof of inclusion
    pub fn terminal(&self) -> Option<&T> {
        if self.ending != ProofEnding::Terminal {
            return None;
        }
        self.path.last().and_then(|e| e.node.terminal.as_ref())
    }

    pub fn is_proof_of_absence(&self) -> bool {
        self.terminal().is_none()
    }
}

impl<V, T> fmt::Display for ProofGeneric<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "proof(key: {}, path length: {}, ending: {})",
            hex::encode(&self.key),
            self.path.len(),
            self.ending
        )
    }
}

/// Walk persisted nodes from `root` along `key`
pub(crate) fn fetch_path<M, S>(
    store: &NodeStore<M, S>,
    root: Option<&M::VCommitment>,
    key: &[u8],
) -> Result<ProofGeneric<M::VCommitment, M::TCommitment>>
where
    M: CommitmentModel,
    S: KVReader,
{
    let unpacked = unpack(key, store.model().path_arity());
    let mut proof = ProofGeneric {
        key: key.to_vec(),
        path: Vec::new(),
        ending: ProofEnding::Extend,
    };

    // Empty trie - nothing on the path, the key extends off nil
    let Some(root) = root else {
        return Ok(proof);
    };
    let Some(mut node) = store.fetch(root)? else {
        proof.ending = ProofEnding::RootNotFound;
        return Ok(proof);
    };

    let mut consumed = 0;
    loop {
        if consumed > unpacked.len() {
            return Err(key_out_of_bounds(consumed, unpacked.len()));
        }
        let rest = &unpacked[consumed..];
        let fragment_len = node.path_fragment.len();
        let p = common_prefix_len(rest, &node.path_fragment);

        if p == fragment_len && p == rest.len() {
            proof.path.push(ProofElement { node, child_index: 0 });
            proof.ending = ProofEnding::Terminal;
            break;
        }
        if p < fragment_len {
            proof.path.push(ProofElement { node, child_index: 0 });
            proof.ending = ProofEnding::Split;
            break;
        }

        let idx = rest[p];
        let next = node.children.get(&idx).cloned();
        proof.path.push(ProofElement { node, child_index: idx });
        let Some(next) = next else {
            proof.ending = ProofEnding::Extend;
            break;
        };
        node = next_node(store, &next)?;
        consumed += p + 1;
    }

    trace!(
        key = %hex::encode(key),
        path = proof.path.len(),
        ending = %proof.ending,
        "fetched proof path"
    );
    Ok(proof)
}

fn next_node<M: CommitmentModel, S: KVReader>(
    store: &NodeStore<M, S>,
    commitment: &M::VCommitment,
) -> Result<ModelNode<M>> {
    store.fetch(commitment)?.ok_or_else(|| {
        Error::node_not_found(commitment.to_string()).with_operation("proof::fetch_path")
    })
}

// =========================================
// Encoding: [node, child_index]
// =========================================

impl<V: Encodable, T: Encodable> ProofElement<V, T> {
    fn payload_length(&self) -> usize {
        self.node.length() + self.child_index.length()
    }
}

impl<V: Encodable, T: Encodable> Encodable for ProofElement<V, T> {
    fn encode(&self, out: &mut dyn BufMut) {
        Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        self.node.encode(out);
        self.child_index.encode(out);
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

impl<V: Decodable, T: Decodable> Decodable for ProofElement<V, T> {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut payload = decode_list_payload(buf)?;
        let node = NodeData::decode(&mut payload)?;
        let child_index = u8::decode(&mut payload)?;
        if !payload.is_empty() {
            return Err(alloy_rlp::Error::Custom("unexpected items in proof element"));
        }
        Ok(ProofElement { node, child_index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_exact, to_bytes};
    use crate::kv::InMemoryKVStore;
    use crate::testing::TestModel;

    #[test]
    fn test_fetch_path_root_not_found() {
        let store = NodeStore::new(TestModel::default(), InMemoryKVStore::new());
        let proof = fetch_path(&store, Some(&42), b"key").unwrap();
        assert_eq!(proof.ending, ProofEnding::RootNotFound);
        assert!(proof.path.is_empty());
        assert_eq!(proof.key, b"key");
        assert!(proof.is_proof_of_absence());
    }

    #[test]
    fn test_fetch_path_nil_root() {
        let store = NodeStore::new(TestModel::default(), InMemoryKVStore::new());
        let proof = fetch_path(&store, None, b"key").unwrap();
        assert_eq!(proof.ending, ProofEnding::Extend);
        assert!(proof.path.is_empty());
    }

    #[test]
    fn test_ending_codes() {
        for ending in [
            ProofEnding::Terminal,
            ProofEnding::Split,
            ProofEnding::Extend,
            ProofEnding::RootNotFound,
        ] {
            assert_eq!(ProofEnding::from_code(ending.code()).unwrap(), ending);
        }
        assert!(ProofEnding::from_code(4).is_err());
    }

    #[test]
    fn test_absence_without_terminal() {
        let proof: ProofGeneric<u64, u64> = ProofGeneric {
            key: vec![],
            path: vec![ProofElement {
                node: NodeData::new(vec![], None),
                child_index: 0,
            }],
            ending: ProofEnding::Terminal,
        };
        assert!(proof.is_proof_of_absence());
    }

    #[test]
    fn test_element_encoding() {
        let mut node = NodeData::new(vec![1, 2], Some(9u64));
        node.children.insert(3, 0x33u64);
        let element = ProofElement { node, child_index: 3 };

        let bytes = to_bytes(&element);
        assert_eq!(bytes.len(), element.length());
        let back: ProofElement<u64, u64> = decode_exact("element", &bytes).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_display() {
        let proof: ProofGeneric<u64, u64> = ProofGeneric {
            key: b"ab".to_vec(),
            path: vec![],
            ending: ProofEnding::Extend,
        };
        assert_eq!(proof.to_string(), "proof(key: 6162, path length: 0, ending: extend)");
    }
}
