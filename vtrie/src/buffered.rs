//! # Buffered nodes
//!
//! In-memory working copies of trie nodes. Persisted nodes are faulted in
//! from the node store only when a mutation walks through them; everything
//! else stays referenced by commitment. Mutations mark the nodes they touch
//! dirty and commit rehashes exactly the dirty nodes, bottom-up.

use std::collections::BTreeMap;

use tracing::debug;

use crate::commitment::{ChildUpdates, CommitmentModel, ModelNode};
use crate::error::{Error, Result};
use crate::kv::{KVReader, KVWriter};
use crate::node::NodeData;
use crate::node_store::NodeStore;
use crate::path::{common_prefix_len, concat};

/// Result of deleting a key below a node
pub(crate) enum DeleteOutcome<M: CommitmentModel> {
    /// Key was not present
    Unchanged(Box<BufferedNode<M>>),
    /// Node changed, possibly merged into its only child
    Replaced(Box<BufferedNode<M>>),
    /// Node became empty and must be unlinked from its parent
    Removed,
}

pub(crate) struct BufferedNode<M: CommitmentModel> {
    /// Working copy; `data.commitment` is the last committed commitment
    data: ModelNode<M>,
    /// Children loaded or changed since the last commit, `None` marks removal
    modified_children: BTreeMap<u8, Option<Box<BufferedNode<M>>>>,
    dirty: bool,
}

impl<M: CommitmentModel> BufferedNode<M> {
    /// Wrap a node fetched from the store
    pub(crate) fn from_persisted(data: ModelNode<M>) -> Self {
        BufferedNode {
            data,
            modified_children: BTreeMap::new(),
            dirty: false,
        }
    }

    fn new(path_fragment: Vec<u8>, terminal: Option<M::TCommitment>) -> Self {
        BufferedNode {
            data: NodeData::new(path_fragment, terminal),
            modified_children: BTreeMap::new(),
            dirty: true,
        }
    }

    /// Fresh leaf holding one value
    pub(crate) fn new_terminal(path_fragment: Vec<u8>, terminal: M::TCommitment) -> Self {
        Self::new(path_fragment, Some(terminal))
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current child symbols, committed ones overlaid by pending changes
    fn child_indices(&self) -> Vec<u8> {
        let mut ret: Vec<u8> = self
            .data
            .children
            .keys()
            .copied()
            .filter(|idx| !matches!(self.modified_children.get(idx), Some(None)))
            .collect();
        for (idx, slot) in &self.modified_children {
            if slot.is_some() && !self.data.children.contains_key(idx) {
                ret.push(*idx);
            }
        }
        ret.sort_unstable();
        ret
    }

    /// Detach child `idx` for mutation, loading it from the store if needed
    fn take_child<S: KVReader>(
        &mut self,
        idx: u8,
        store: &NodeStore<M, S>,
    ) -> Result<Option<Box<BufferedNode<M>>>> {
        match self.modified_children.remove(&idx) {
            Some(Some(child)) => return Ok(Some(child)),
            Some(None) => {
                self.modified_children.insert(idx, None);
                return Ok(None);
            }
            None => {}
        }

        let Some(commitment) = self.data.children.get(&idx) else {
            return Ok(None);
        };
        match store.fetch(commitment)? {
            Some(data) => Ok(Some(Box::new(BufferedNode::from_persisted(data)))),
            None => Err(Error::node_not_found(commitment.to_string())
                .with_operation("buffered::take_child")
                .with_context("child_index", idx.to_string())),
        }
    }

    /// Insert a terminal under the remaining key, returning the node that
    /// replaces `self` in its parent
    pub(crate) fn insert<S: KVReader>(
        mut self: Box<Self>,
        key: &[u8],
        terminal: M::TCommitment,
        store: &NodeStore<M, S>,
    ) -> Result<Box<Self>> {
        let fragment_len = self.data.path_fragment.len();
        let p = common_prefix_len(key, &self.data.path_fragment);

        // Exact match - overwrite the value
        if p == fragment_len && p == key.len() {
            self.data.terminal = Some(terminal);
            self.dirty = true;
            return Ok(self);
        }

        // Key diverges inside the fragment - split
        if p < fragment_len {
            let prefix = self.data.path_fragment[..p].to_vec();
            let old_idx = self.data.path_fragment[p];
            self.data.path_fragment = self.data.path_fragment[p + 1..].to_vec();
            self.dirty = true;

            let mut split = Box::new(BufferedNode::new(prefix, None));
            split.modified_children.insert(old_idx, Some(self));
            if p == key.len() {
                split.data.terminal = Some(terminal);
            } else {
                let leaf = BufferedNode::new_terminal(key[p + 1..].to_vec(), terminal);
                split.modified_children.insert(key[p], Some(Box::new(leaf)));
            }
            return Ok(split);
        }

        // Fragment consumed, key continues - extend through child key[p]
        let idx = key[p];
        let rest = &key[p + 1..];
        let child = match self.take_child(idx, store)? {
            Some(child) => child.insert(rest, terminal, store)?,
            None => Box::new(BufferedNode::new_terminal(rest.to_vec(), terminal)),
        };
        self.modified_children.insert(idx, Some(child));
        self.dirty = true;
        Ok(self)
    }

    /// Remove the terminal under the remaining key
    pub(crate) fn delete<S: KVReader>(
        mut self: Box<Self>,
        key: &[u8],
        store: &NodeStore<M, S>,
    ) -> Result<DeleteOutcome<M>> {
        let fragment_len = self.data.path_fragment.len();
        if !key.starts_with(&self.data.path_fragment) {
            return Ok(DeleteOutcome::Unchanged(self));
        }

        if key.len() == fragment_len {
            if self.data.terminal.is_none() {
                return Ok(DeleteOutcome::Unchanged(self));
            }
            self.data.terminal = None;
            self.dirty = true;
            return self.repair(store);
        }

        let idx = key[fragment_len];
        let Some(child) = self.take_child(idx, store)? else {
            return Ok(DeleteOutcome::Unchanged(self));
        };
        match child.delete(&key[fragment_len + 1..], store)? {
            DeleteOutcome::Unchanged(child) => {
                self.modified_children.insert(idx, Some(child));
                Ok(DeleteOutcome::Unchanged(self))
            }
            DeleteOutcome::Replaced(child) => {
                self.modified_children.insert(idx, Some(child));
                self.dirty = true;
                Ok(DeleteOutcome::Replaced(self))
            }
            DeleteOutcome::Removed => {
                self.modified_children.insert(idx, None);
                self.dirty = true;
                self.repair(store)
            }
        }
    }

    /// Restore canonical form after a terminal or child went away
    fn repair<S: KVReader>(mut self: Box<Self>, store: &NodeStore<M, S>) -> Result<DeleteOutcome<M>> {
        if self.data.terminal.is_some() {
            return Ok(DeleteOutcome::Replaced(self));
        }

        let indices = self.child_indices();
        match indices.as_slice() {
            [] => Ok(DeleteOutcome::Removed),
            [idx] => {
                let idx = *idx;
                let mut child = self.take_child(idx, store)?.ok_or_else(|| {
                    Error::invariant_violation("only child vanished during merge")
                        .with_operation("buffered::repair")
                })?;
                child.data.path_fragment =
                    concat(&self.data.path_fragment, idx, &child.data.path_fragment);
                child.dirty = true;
                Ok(DeleteOutcome::Replaced(child))
            }
            _ => Ok(DeleteOutcome::Replaced(self)),
        }
    }

    /// Commit dirty nodes below and including `self`, persisting new records.
    /// `nodes_written` counts records that were not in the store before.
    pub(crate) fn commit<S: KVReader + KVWriter>(
        &mut self,
        store: &mut NodeStore<M, S>,
        nodes_written: &mut usize,
    ) -> Result<M::VCommitment> {
        let mut updates: ChildUpdates<M::VCommitment> = BTreeMap::new();
        for (idx, slot) in std::mem::take(&mut self.modified_children) {
            match slot {
                Some(mut child) if child.is_dirty() => {
                    let commitment = child.commit(store, nodes_written)?;
                    updates.insert(idx, Some(commitment));
                }
                Some(_) => {}
                None => {
                    if self.data.children.contains_key(&idx) {
                        updates.insert(idx, None);
                    }
                }
            }
        }

        if !self.dirty && updates.is_empty() {
            if let Some(commitment) = &self.data.commitment {
                return Ok(commitment.clone());
            }
        }

        for (idx, update) in &updates {
            match update {
                Some(commitment) => {
                    self.data.children.insert(*idx, commitment.clone());
                }
                None => {
                    self.data.children.remove(idx);
                }
            }
        }

        if self.data.is_empty() || !self.data.is_canonical() {
            return Err(Error::invariant_violation("refusing to commit a non-canonical node")
                .with_operation("buffered::commit")
                .with_context("children", self.data.children.len().to_string()));
        }

        let had_prior = self.data.commitment.is_some();
        let commitment = store
            .model()
            .update_node_commitment(&self.data, &updates, had_prior);
        self.data.commitment = Some(commitment.clone());
        if store.store(&self.data)? {
            *nodes_written += 1;
        }
        self.dirty = false;

        debug!(
            commitment = %commitment,
            children = self.data.children.len(),
            changed = updates.len(),
            "committed node"
        );
        Ok(commitment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKVStore;
    use crate::testing::TestModel;

    type Node = BufferedNode<TestModel>;

    fn store() -> NodeStore<TestModel, InMemoryKVStore> {
        NodeStore::new(TestModel::default(), InMemoryKVStore::new())
    }

    #[test]
    fn test_insert_split() {
        let store = store();
        let root = Box::new(Node::new_terminal(vec![1, 2, 3], 10));
        let root = root.insert(&[1, 5], 20, &store).unwrap();

        assert_eq!(root.data.path_fragment, vec![1]);
        assert!(root.data.terminal.is_none());
        assert_eq!(root.child_indices(), vec![2, 5]);
    }

    #[test]
    fn test_insert_split_terminal_on_split_node() {
        let store = store();
        let root = Box::new(Node::new_terminal(vec![1, 2, 3], 10));
        let root = root.insert(&[1], 20, &store).unwrap();

        assert_eq!(root.data.path_fragment, vec![1]);
        assert_eq!(root.data.terminal, Some(20));
        assert_eq!(root.child_indices(), vec![2]);
    }

    #[test]
    fn test_insert_extend() {
        let store = store();
        let root = Box::new(Node::new_terminal(vec![], 1));
        let root = root.insert(&[4, 4], 2, &store).unwrap();

        assert_eq!(root.data.terminal, Some(1));
        assert_eq!(root.child_indices(), vec![4]);
    }

    #[test]
    fn test_delete_merges_single_child() {
        let store = store();
        let root = Box::new(Node::new_terminal(vec![1], 1));
        let root = root.insert(&[1, 2, 3], 2, &store).unwrap();

        let root = match root.delete(&[1], &store).unwrap() {
            DeleteOutcome::Replaced(root) => root,
            _ => panic!("expected replacement"),
        };
        assert_eq!(root.data.path_fragment, vec![1, 2, 3]);
        assert_eq!(root.data.terminal, Some(2));
    }

    #[test]
    fn test_delete_last_key_removes() {
        let store = store();
        let root = Box::new(Node::new_terminal(vec![3], 1));
        assert!(matches!(root.delete(&[3], &store).unwrap(), DeleteOutcome::Removed));
    }

    #[test]
    fn test_delete_absent_unchanged() {
        let store = store();
        let root = Box::new(Node::new_terminal(vec![3], 1));
        let root = match root.delete(&[3, 1], &store).unwrap() {
            DeleteOutcome::Unchanged(root) => root,
            _ => panic!("expected no change"),
        };
        let root = match root.delete(&[4], &store).unwrap() {
            DeleteOutcome::Unchanged(root) => root,
            _ => panic!("expected no change"),
        };
        assert_eq!(root.data.terminal, Some(1));
    }

    #[test]
    fn test_commit_writes_dirty_nodes_only() {
        let mut store = store();
        let mut written = 0;

        let root = Box::new(Node::new_terminal(vec![], 1));
        let root = root.insert(&[1], 2, &store).unwrap();
        let mut root = root.insert(&[2], 3, &store).unwrap();
        root.commit(&mut store, &mut written).unwrap();
        assert_eq!(written, 3);

        // touching one child rewrites the child and the root
        let mut root = root.insert(&[1], 4, &store).unwrap();
        written = 0;
        root.commit(&mut store, &mut written).unwrap();
        assert_eq!(written, 2);
        assert!(!root.is_dirty());
    }

    #[test]
    fn test_commit_clean_node_returns_prior() {
        let mut store = store();
        let mut written = 0;
        let mut root = Box::new(Node::new_terminal(vec![7], 1));
        let first = root.commit(&mut store, &mut written).unwrap();
        let second = root.commit(&mut store, &mut written).unwrap();
        assert_eq!(first, second);
        assert_eq!(written, 1);
    }

    #[test]
    fn test_fault_in_missing_child() {
        let store = store();
        let mut data = NodeData::new(vec![], Some(1));
        data.children.insert(3, 999);
        data.children.insert(4, 998);
        data.commitment = Some(5);

        let root = Box::new(Node::from_persisted(data));
        let err = root.insert(&[3, 0], 2, &store).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::NodeNotFound);
    }
}
