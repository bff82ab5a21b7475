//! # Node store
//!
//! Content-addressed persistence of node records on top of a key/value
//! backend. A record is keyed by the RLP encoding of its vector commitment,
//! so identical content always lands under the identical key and a
//! re-store is a no-op.

use tracing::trace;

use crate::codec::{decode_exact, to_bytes};
use crate::commitment::{CommitmentModel, ModelNode};
use crate::error::{Error, Result};
use crate::kv::{KVReader, KVWriter};

/// Node records of one commitment model over one backend
#[derive(Debug)]
pub struct NodeStore<M, S> {
    model: M,
    kv: S,
}

impl<M: CommitmentModel, S> NodeStore<M, S> {
    pub fn new(model: M, kv: S) -> Self {
        NodeStore { model, kv }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The underlying backend
    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn into_inner(self) -> (M, S) {
        (self.model, self.kv)
    }

    /// Storage key of the record committed to by `commitment`
    pub fn key_of(commitment: &M::VCommitment) -> Vec<u8> {
        to_bytes(commitment)
    }
}

impl<M: CommitmentModel, S: KVReader> NodeStore<M, S> {
    /// Fetch the node committed to by `commitment`; `None` if absent
    pub fn fetch(&self, commitment: &M::VCommitment) -> Result<Option<ModelNode<M>>> {
        let key = Self::key_of(commitment);
        let bytes = match self.kv.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(e) => return Err(e.with_operation("node_store::fetch")),
        };

        let mut node: ModelNode<M> = decode_exact("node record", &bytes).map_err(|e| {
            e.with_operation("node_store::fetch")
                .with_context("commitment", commitment.to_string())
        })?;
        node.check_arity(self.model.path_arity())
            .map_err(|e| e.with_operation("node_store::fetch"))?;
        node.commitment = Some(commitment.clone());

        trace!(commitment = %commitment, bytes = bytes.len(), "fetched node");
        Ok(Some(node))
    }

    /// Check whether a record exists for `commitment`
    pub fn contains(&self, commitment: &M::VCommitment) -> Result<bool> {
        self.kv
            .has(&Self::key_of(commitment))
            .map_err(|e| e.with_operation("node_store::contains"))
    }
}

impl<M: CommitmentModel, S: KVReader + KVWriter> NodeStore<M, S> {
    /// Persist a committed node. Returns `true` if a new record was written.
    pub fn store(&mut self, node: &ModelNode<M>) -> Result<bool> {
        let commitment = node.commitment.as_ref().ok_or_else(|| {
            Error::invariant_violation("cannot store a node without commitment")
                .with_operation("node_store::store")
        })?;
        let key = Self::key_of(commitment);

        if self.kv.has(&key).map_err(|e| e.with_operation("node_store::store"))? {
            return Ok(false);
        }

        let bytes = to_bytes(node);
        self.kv
            .set(&key, &bytes)
            .map_err(|e| e.with_operation("node_store::store"))?;

        trace!(commitment = %commitment, bytes = bytes.len(), "stored node");
        Ok(true)
    }
}
