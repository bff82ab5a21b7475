//! # BLAKE3 commitment model
//!
//! Node commitment = BLAKE3 extendable output, truncated to the configured
//! width, over:
//!
//! ```text
//! 0x01 | len(fragment) u32 le | fragment
//!      | terminal: 0x00, or (0x01 value | 0x02 hash) len u32 le data
//!      | for each child ascending: index | len u8 | commitment
//! ```
//!
//! Values longer than the hash width are committed to through their digest
//! (domain byte 0x02), shorter ones are stored verbatim.

use tracing::debug;
use vtrie::{CommitmentModel, KVReader, NodeData, PathArity, ProofEnding, TrieReader};

use crate::commitment::{HashCommitment, Terminal};
use crate::config::Blake3Config;
use crate::error::{Error, Result};
use crate::proof::Proof;

const NODE_DOMAIN: u8 = 0x01;
const VALUE_DOMAIN: u8 = 0x02;

/// Hash commitment model with a fixed arity and digest width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blake3Model {
    arity: PathArity,
    hash_size: usize,
}

impl Blake3Model {
    pub fn new(config: Blake3Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| e.with_operation("blake3_model::new"))?;
        Ok(Blake3Model {
            arity: config.path_arity()?,
            hash_size: config.hash_size,
        })
    }

    pub fn hash_size(&self) -> usize {
        self.hash_size
    }

    pub fn config(&self) -> Blake3Config {
        Blake3Config {
            arity: self.arity.size(),
            hash_size: self.hash_size,
        }
    }

    fn finalize(&self, hasher: &blake3::Hasher) -> Vec<u8> {
        let mut out = vec![0u8; self.hash_size];
        hasher.finalize_xof().fill(&mut out);
        out
    }

    /// Build a proof for `key` against the reader's root
    pub fn proof<S: KVReader>(&self, key: &[u8], reader: &TrieReader<Self, S>) -> Result<Proof> {
        let generic = reader.proof_generic(key)?;
        if generic.ending == ProofEnding::RootNotFound {
            let root = reader
                .root_commitment()
                .map(|r| r.to_string())
                .unwrap_or_default();
            return Err(Error::root_not_found(root).with_operation("blake3_model::proof"));
        }

        debug!(
            key = %hex::encode(key),
            path = generic.path.len(),
            ending = %generic.ending,
            "built proof"
        );
        Ok(Proof::from(generic))
    }
}

impl CommitmentModel for Blake3Model {
    type VCommitment = HashCommitment;
    type TCommitment = Terminal;

    fn path_arity(&self) -> PathArity {
        self.arity
    }

    fn commit_to_data(&self, data: &[u8]) -> Option<Terminal> {
        if data.is_empty() {
            return None;
        }
        if data.len() <= self.hash_size {
            return Some(Terminal {
                data: data.to_vec(),
                is_hash: false,
            });
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(&[VALUE_DOMAIN]);
        hasher.update(data);
        Some(Terminal {
            data: self.finalize(&hasher),
            is_hash: true,
        })
    }

    fn commit_node(&self, node: &NodeData<HashCommitment, Terminal>) -> HashCommitment {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[NODE_DOMAIN]);
        hasher.update(&(node.path_fragment.len() as u32).to_le_bytes());
        hasher.update(&node.path_fragment);

        match &node.terminal {
            None => {
                hasher.update(&[0]);
            }
            Some(t) => {
                hasher.update(&[if t.is_hash { 2 } else { 1 }]);
                hasher.update(&(t.data.len() as u32).to_le_bytes());
                hasher.update(&t.data);
            }
        }

        for (idx, c) in &node.children {
            hasher.update(&[*idx, c.len() as u8]);
            hasher.update(c.as_bytes());
        }
        HashCommitment(self.finalize(&hasher))
    }

    fn description(&self) -> String {
        format!("blake3-{} {}", self.hash_size * 8, self.arity)
    }
}
