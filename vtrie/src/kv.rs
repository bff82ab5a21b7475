//! # Key/value backends
//!
//! The trie persists node records through these minimal capabilities. Any
//! storage engine can sit behind them; `InMemoryKVStore` is provided for
//! tests and for callers that keep everything in memory.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Read access to a key/value backend
pub trait KVReader {
    /// Get value by key, `None` if absent
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Check whether the key is present
    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Write access to a key/value backend
pub trait KVWriter {
    /// Store value under key, overwriting any previous value
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;
}

/// Iteration over all pairs of a key/value backend
pub trait KVIterator {
    /// Call `f` for every pair until it returns `false`
    fn iterate(&self, f: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> Result<()>;
}

/// A backend providing every capability
pub trait KVStore: KVReader + KVWriter + KVIterator {}

impl<T: KVReader + KVWriter + KVIterator> KVStore for T {}

/// In-memory key/value store, iterated in ascending key order
#[derive(Debug, Clone, Default)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        InMemoryKVStore {
            data: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Wrap into a handle that several tries and readers can share
    pub fn into_shared(self) -> Arc<RwLock<InMemoryKVStore>> {
        Arc::new(RwLock::new(self))
    }
}

impl KVReader for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.data.contains_key(key))
    }
}

impl KVWriter for InMemoryKVStore {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

impl KVIterator for InMemoryKVStore {
    fn iterate(&self, f: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> Result<()> {
        for (k, v) in &self.data {
            if !f(k, v) {
                break;
            }
        }
        Ok(())
    }
}

/// Copy every pair of `kv` out of the backend.
///
/// Lets a caller walk the pairs without holding the backend's read guard,
/// which matters when the same shared handle also backs a trie.
pub fn collect_pairs<I: KVIterator + ?Sized>(kv: &I) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut pairs = Vec::new();
    kv.iterate(&mut |key, value| {
        pairs.push((key.to_vec(), value.to_vec()));
        true
    })?;
    Ok(pairs)
}

// =========================================
// Shared handles
// =========================================

fn poisoned(operation: &'static str) -> Error {
    Error::storage_failed("key/value store lock poisoned")
        .with_operation(operation)
        .permanent()
}

impl<T: KVReader> KVReader for Arc<RwLock<T>> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let guard = self.read().map_err(|_| poisoned("kv::get"))?;
        guard.get(key)
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        let guard = self.read().map_err(|_| poisoned("kv::has"))?;
        guard.has(key)
    }
}

impl<T: KVWriter> KVWriter for Arc<RwLock<T>> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut guard = self.write().map_err(|_| poisoned("kv::set"))?;
        guard.set(key, value)
    }
}

impl<T: KVIterator> KVIterator for Arc<RwLock<T>> {
    fn iterate(&self, f: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> Result<()> {
        let guard = self.read().map_err(|_| poisoned("kv::iterate"))?;
        guard.iterate(f)
    }
}
