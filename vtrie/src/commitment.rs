//! # Commitment models
//!
//! A commitment model turns values into terminal commitments and node
//! content into vector commitments. The trie never looks inside a
//! commitment: it only compares, encodes and stores them.
//!
//! Models are chosen once, when a trie or reader is constructed. Several
//! models (different hash widths, different arities) can coexist over
//! separate stores.

use std::collections::BTreeMap;
use std::fmt;

use alloy_rlp::{Decodable, Encodable};

use crate::node::NodeData;
use crate::path::PathArity;

/// Child commitment changes handed to the model on commit.
/// `None` marks a removed child.
pub type ChildUpdates<V> = BTreeMap<u8, Option<V>>;

/// Node data as seen by a given model
pub type ModelNode<M> =
    NodeData<<M as CommitmentModel>::VCommitment, <M as CommitmentModel>::TCommitment>;

/// The cryptographic capability consumed by the trie
pub trait CommitmentModel {
    /// Commitment to a node and, through it, to its whole subtree
    type VCommitment: Clone + Eq + fmt::Debug + fmt::Display + Encodable + Decodable;

    /// Commitment to a stored value
    type TCommitment: Clone + Eq + fmt::Debug + Encodable + Decodable;

    /// Alphabet keys are unpacked into
    fn path_arity(&self) -> PathArity;

    /// Commit to a value. Empty data has no commitment.
    fn commit_to_data(&self, data: &[u8]) -> Option<Self::TCommitment>;

    /// Compute the commitment of a node from scratch.
    ///
    /// Children must be combined in ascending symbol order so the result
    /// does not depend on edit history.
    fn commit_node(&self, node: &NodeData<Self::VCommitment, Self::TCommitment>)
        -> Self::VCommitment;

    /// Compute the commitment of a node after a commit.
    ///
    /// `node` already carries its new fragment, terminal and children.
    /// `child_updates` lists which children changed and `had_prior` tells
    /// whether `node.commitment` holds a previous value, so schemes with
    /// homomorphic commitments can apply a delta instead of recomputing.
    fn update_node_commitment(
        &self,
        node: &NodeData<Self::VCommitment, Self::TCommitment>,
        child_updates: &ChildUpdates<Self::VCommitment>,
        had_prior: bool,
    ) -> Self::VCommitment {
        let _ = (child_updates, had_prior);
        self.commit_node(node)
    }

    /// Short human-readable name of the model
    fn description(&self) -> String;
}
