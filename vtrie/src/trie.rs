//! # Trie
//!
//! `TrieReader` answers lookups and builds proofs against one persisted
//! root. `Trie` adds buffered mutation on top of it: updates and deletes
//! change an in-memory overlay, and `commit` persists the overlay and moves
//! the reader to the new root. Old roots stay readable through their own
//! readers as long as the store keeps their records.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::buffered::{BufferedNode, DeleteOutcome};
use crate::codec::decode_exact;
use crate::commitment::CommitmentModel;
use crate::error::{Error, Result};
use crate::kv::{collect_pairs, KVIterator, KVReader, KVWriter};
use crate::node_store::NodeStore;
use crate::path::{unpack, PathArity};
use crate::proof::{fetch_path, ProofEnding, ProofGeneric};

/// Result of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome<V> {
    /// New root, `None` when the trie is empty
    pub root: Option<V>,
    /// Node records written that were not in the store before
    pub nodes_written: usize,
    /// Original keys present under the previous root and removed by this commit
    pub deleted_keys: BTreeSet<Vec<u8>>,
}

/// Read-only view of one persisted root
#[derive(Debug)]
pub struct TrieReader<M: CommitmentModel, S> {
    node_store: NodeStore<M, S>,
    root: Option<M::VCommitment>,
}

impl<M: CommitmentModel, S: KVReader> TrieReader<M, S> {
    /// Bind to `root`, which must exist in the store unless it is nil
    pub fn new(model: M, kv: S, root: Option<M::VCommitment>) -> Result<Self> {
        let node_store = NodeStore::new(model, kv);
        if let Some(root) = &root {
            if !node_store.contains(root)? {
                return Err(Error::root_not_found(root.to_string())
                    .with_operation("trie_reader::new"));
            }
        }
        Ok(TrieReader { node_store, root })
    }

    /// Current persisted root, `None` for the empty trie
    pub fn root_commitment(&self) -> Option<&M::VCommitment> {
        self.root.as_ref()
    }

    pub fn model(&self) -> &M {
        self.node_store.model()
    }

    pub fn path_arity(&self) -> PathArity {
        self.model().path_arity()
    }

    pub fn node_store(&self) -> &NodeStore<M, S> {
        &self.node_store
    }

    pub fn into_inner(self) -> (M, S) {
        self.node_store.into_inner()
    }

    /// Root-to-node path for `key` over persisted nodes
    pub fn proof_generic(&self, key: &[u8]) -> Result<ProofGeneric<M::VCommitment, M::TCommitment>> {
        fetch_path(&self.node_store, self.root.as_ref(), key)
    }

    /// Terminal commitment stored for `key`
    pub fn get(&self, key: &[u8]) -> Result<Option<M::TCommitment>> {
        let proof = self.proof_generic(key)?;
        if proof.ending == ProofEnding::RootNotFound {
            return Err(self.missing_root("trie_reader::get"));
        }
        Ok(proof.terminal().cloned())
    }

    pub fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Decode a vector commitment, e.g. a root received from elsewhere
    pub fn vector_commitment_from_bytes(&self, bytes: &[u8]) -> Result<M::VCommitment> {
        decode_exact("vector commitment", bytes)
    }

    /// Check every pair of `kv` against the trie.
    ///
    /// Returns the keys that are not proven present with exactly their value.
    /// An empty value must be absent from the trie. Runs one proof per pair.
    /// The pairs are copied out of `kv` first, so `kv` may share a lock with
    /// the trie's own store.
    pub fn reconcile<I: KVIterator + ?Sized>(&self, kv: &I) -> Result<Vec<Vec<u8>>> {
        let pairs = collect_pairs(kv).map_err(|e| e.with_operation("trie_reader::reconcile"))?;

        let mut ret = Vec::new();
        for (key, value) in &pairs {
            if !self
                .matches(key, value)
                .map_err(|e| e.with_operation("trie_reader::reconcile"))?
            {
                warn!(key = %hex::encode(key), "reconcile mismatch");
                ret.push(key.clone());
            }
        }
        debug!(checked = pairs.len(), mismatched = ret.len(), "reconcile finished");
        Ok(ret)
    }

    fn matches(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        let terminal = self.get(key)?;
        Ok(terminal == self.model().commit_to_data(value))
    }

    fn missing_root(&self, operation: &'static str) -> Error {
        let root = self.root.as_ref().map(|r| r.to_string()).unwrap_or_default();
        Error::root_not_found(root).with_operation(operation)
    }
}

/// Updatable trie over a persisted root
pub struct Trie<M: CommitmentModel, S> {
    reader: TrieReader<M, S>,
    /// Working tree; `None` for the empty trie
    mutated_root: Option<Box<BufferedNode<M>>>,
    modified: bool,
    /// Set when a mutation or commit failed half way
    failed: bool,
    deleted_keys: BTreeSet<Vec<u8>>,
}

impl<M: CommitmentModel, S: KVReader> Trie<M, S> {
    /// Open a trie at `root`, `None` for the empty trie
    pub fn new(model: M, kv: S, root: Option<M::VCommitment>) -> Result<Self> {
        let reader = TrieReader::new(model, kv, root)?;
        let mutated_root = load_root(&reader)?;
        Ok(Trie {
            reader,
            mutated_root,
            modified: false,
            failed: false,
            deleted_keys: BTreeSet::new(),
        })
    }

    /// Open an empty trie
    pub fn empty(model: M, kv: S) -> Self {
        Trie {
            reader: TrieReader {
                node_store: NodeStore::new(model, kv),
                root: None,
            },
            mutated_root: None,
            modified: false,
            failed: false,
            deleted_keys: BTreeSet::new(),
        }
    }

    /// Reader over the last committed root
    pub fn reader(&self) -> &TrieReader<M, S> {
        &self.reader
    }

    pub fn into_reader(self) -> TrieReader<M, S> {
        self.reader
    }

    pub fn root_commitment(&self) -> Option<&M::VCommitment> {
        self.reader.root_commitment()
    }

    pub fn model(&self) -> &M {
        self.reader.model()
    }

    pub fn path_arity(&self) -> PathArity {
        self.reader.path_arity()
    }

    /// Whether there are uncommitted mutations
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Set `key` to `value`; an empty value deletes the key
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if value.is_empty() {
            return self.delete(key);
        }
        self.check_usable("trie::update")?;

        let terminal = self
            .reader
            .node_store
            .model()
            .commit_to_data(value)
            .ok_or_else(|| {
                Error::invariant_violation("model produced no commitment for a non-empty value")
                    .with_operation("trie::update")
            })?;
        let unpacked = unpack(key, self.reader.path_arity());

        let inserted = match self.mutated_root.take() {
            Some(root) => root.insert(&unpacked, terminal, &self.reader.node_store),
            None => Ok(Box::new(BufferedNode::new_terminal(unpacked, terminal))),
        };
        match inserted {
            Ok(root) => {
                self.mutated_root = Some(root);
                self.modified = true;
                self.deleted_keys.remove(key);
                Ok(())
            }
            Err(e) => Err(self.fail(e, "trie::update")),
        }
    }

    /// Remove `key`; a missing key is a no-op
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.check_usable("trie::delete")?;
        let Some(root) = self.mutated_root.take() else {
            return Ok(());
        };

        let unpacked = unpack(key, self.reader.path_arity());
        match root.delete(&unpacked, &self.reader.node_store) {
            Ok(DeleteOutcome::Unchanged(root)) => {
                self.mutated_root = Some(root);
            }
            Ok(DeleteOutcome::Replaced(root)) => {
                self.mutated_root = Some(root);
                self.mark_deleted(key);
            }
            Ok(DeleteOutcome::Removed) => {
                self.mark_deleted(key);
            }
            Err(e) => return Err(self.fail(e, "trie::delete")),
        }
        Ok(())
    }

    /// Apply every pair of `kv` as an update
    pub fn update_all<I: KVIterator + ?Sized>(&mut self, kv: &I) -> Result<()> {
        let pairs = collect_pairs(kv).map_err(|e| e.with_operation("trie::update_all"))?;
        for (key, value) in &pairs {
            self.update(key, value)
                .map_err(|e| e.with_operation("trie::update_all"))?;
        }
        debug!(count = pairs.len(), "applied updates");
        Ok(())
    }

    /// Drop uncommitted mutations and return to the persisted root
    pub fn discard_mutations(&mut self) -> Result<()> {
        self.mutated_root = load_root(&self.reader)?;
        self.modified = false;
        self.failed = false;
        self.deleted_keys.clear();
        Ok(())
    }

    /// Keys `reconcile` reports against the last committed root
    pub fn reconcile<I: KVIterator + ?Sized>(&self, kv: &I) -> Result<Vec<Vec<u8>>> {
        self.reader.reconcile(kv)
    }

    fn mark_deleted(&mut self, key: &[u8]) {
        self.modified = true;
        self.deleted_keys.insert(key.to_vec());
    }

    fn check_usable(&self, operation: &'static str) -> Result<()> {
        if self.failed {
            return Err(Error::invariant_violation(
                "a previous mutation failed, discard mutations before continuing",
            )
            .with_operation(operation));
        }
        Ok(())
    }

    fn fail(&mut self, e: Error, operation: &'static str) -> Error {
        warn!(error = %e, "mutation failed, pending changes are unusable");
        self.failed = true;
        e.with_operation(operation)
    }
}

impl<M: CommitmentModel, S: KVReader + KVWriter> Trie<M, S> {
    /// Persist all mutations and move to the new root
    pub fn commit(&mut self) -> Result<CommitOutcome<M::VCommitment>> {
        self.check_usable("trie::commit")?;
        if !self.modified {
            return Ok(CommitOutcome {
                root: self.reader.root.clone(),
                nodes_written: 0,
                deleted_keys: BTreeSet::new(),
            });
        }

        // Report only keys the previous root actually held
        let mut deleted_keys = BTreeSet::new();
        for key in &self.deleted_keys {
            if self.reader.has(key)? {
                deleted_keys.insert(key.clone());
            }
        }

        let mut nodes_written = 0;
        let root = match self.mutated_root.as_mut() {
            Some(node) => match node.commit(&mut self.reader.node_store, &mut nodes_written) {
                Ok(commitment) => Some(commitment),
                Err(e) => return Err(self.fail(e, "trie::commit")),
            },
            None => None,
        };

        self.reader.root = root.clone();
        self.modified = false;
        self.deleted_keys.clear();

        debug!(
            root = %root.as_ref().map(|r| r.to_string()).unwrap_or_default(),
            nodes_written,
            deleted = deleted_keys.len(),
            "committed trie"
        );
        Ok(CommitOutcome {
            root,
            nodes_written,
            deleted_keys,
        })
    }
}

fn load_root<M: CommitmentModel, S: KVReader>(
    reader: &TrieReader<M, S>,
) -> Result<Option<Box<BufferedNode<M>>>> {
    let Some(root) = reader.root.as_ref() else {
        return Ok(None);
    };
    match reader.node_store.fetch(root)? {
        Some(data) => Ok(Some(Box::new(BufferedNode::from_persisted(data)))),
        None => Err(reader.missing_root("trie::load_root")),
    }
}
