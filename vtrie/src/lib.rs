//! # vtrie
//!
//! Updatable authenticated key/value trie with pluggable commitment models.
//!
//! The trie is a compressed prefix tree over keys unpacked into symbols of
//! a configurable alphabet (2, 4, 16 or 256). Every node carries a vector
//! commitment over its fragment, terminal and children, so the root commits
//! to the whole key/value set.
//!
//! Key features:
//! - Buffered mutation with explicit commit
//! - Content-addressed, immutable node records: old roots stay readable
//! - Structure independent of edit history
//! - Proofs of inclusion and absence, validated without a store
//!
//! The cryptographic scheme is supplied through [`CommitmentModel`].

pub mod codec;
pub mod commitment;
pub mod error;
pub mod kv;
pub mod node;
pub mod node_store;
pub mod path;
pub mod proof;
pub mod trie;
pub mod verify;

mod buffered;

#[cfg(test)]
mod testing;

pub use commitment::{ChildUpdates, CommitmentModel, ModelNode};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use kv::{InMemoryKVStore, KVIterator, KVReader, KVStore, KVWriter};
pub use node::NodeData;
pub use node_store::NodeStore;
pub use path::PathArity;
pub use proof::{ProofElement, ProofEnding, ProofGeneric};
pub use trie::{CommitOutcome, Trie, TrieReader};
pub use verify::{validate_path, validate_path_with_value, ProofFailure};
