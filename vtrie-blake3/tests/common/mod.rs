#![allow(dead_code)]

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vtrie::{InMemoryKVStore, Trie};
use vtrie_blake3::{Blake3Config, Blake3Model};

pub type MemTrie = Trie<Blake3Model, InMemoryKVStore>;

/// Every supported arity with both digest widths
pub fn all_models() -> Vec<Blake3Model> {
    let mut ret = Vec::new();
    for arity in [2, 4, 16, 256] {
        for hash_size in [20, 32] {
            ret.push(Blake3Model::new(Blake3Config { arity, hash_size }).unwrap());
        }
    }
    ret
}

pub fn mock_data(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen()).collect()
}

/// Random pairs with short keys (to force shared prefixes) and values on
/// both sides of the verbatim/hash threshold
pub fn random_pairs(seed: u64, count: usize) -> BTreeMap<Vec<u8>, Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ret = BTreeMap::new();
    while ret.len() < count {
        let key_len = rng.gen_range(0..6);
        let value_len = rng.gen_range(1..70);
        let key = mock_data(&mut rng, key_len);
        let value = mock_data(&mut rng, value_len);
        ret.insert(key, value);
    }
    ret
}

pub fn build(model: Blake3Model, pairs: &BTreeMap<Vec<u8>, Vec<u8>>) -> MemTrie {
    let mut trie = Trie::empty(model, InMemoryKVStore::new());
    for (k, v) in pairs {
        trie.update(k, v).unwrap();
    }
    trie.commit().unwrap();
    trie
}
