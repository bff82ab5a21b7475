mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::{all_models, build, random_pairs};
use proptest::prelude::*;
use vtrie::{CommitmentModel, ErrorKind, InMemoryKVStore, KVWriter, ProofEnding, Trie, TrieReader};
use vtrie_blake3::{Blake3Config, Blake3Model};

#[test]
fn test_empty_trie_proof_length() {
    for model in all_models() {
        let trie = Trie::empty(model, InMemoryKVStore::new());
        let proof = model.proof(b"", trie.reader()).unwrap();
        assert_eq!(proof.path.len(), 0);
        assert!(proof.is_proof_of_absence());
    }
}

#[test]
fn test_update_empty_key() {
    let model = Blake3Model::new(Blake3Config::default()).unwrap();
    let mut trie = Trie::empty(model, InMemoryKVStore::new());
    trie.update(b"", b"1").unwrap();
    trie.commit().unwrap();

    let proof = model.proof(b"", trie.reader()).unwrap();
    assert_eq!(proof.path.len(), 1);
    assert_eq!(proof.ending, ProofEnding::Terminal);
    assert!(!proof.is_proof_of_absence());

    let proof = model.proof(b"a", trie.reader()).unwrap();
    assert_eq!(proof.path.len(), 1);
    assert_eq!(proof.ending, ProofEnding::Extend);
    assert!(proof.is_proof_of_absence());
}

#[test]
fn test_update_single_key() {
    let model = Blake3Model::new(Blake3Config::default()).unwrap();
    let mut trie = Trie::empty(model, InMemoryKVStore::new());
    trie.update(b"1", b"2").unwrap();
    trie.commit().unwrap();

    let proof = model.proof(b"", trie.reader()).unwrap();
    assert_eq!(proof.path.len(), 1);
    assert_eq!(proof.ending, ProofEnding::Split);
    assert!(proof.is_proof_of_absence());

    let proof = model.proof(b"1", trie.reader()).unwrap();
    assert!(!proof.is_proof_of_absence());
    assert_eq!(proof.terminal().unwrap().data(), b"2");
}

#[test]
fn test_get_and_has() {
    for model in all_models() {
        let pairs = random_pairs(1, 100);
        let trie = build(model, &pairs);
        for (k, v) in &pairs {
            assert_eq!(trie.reader().get(k).unwrap(), model.commit_to_data(v));
        }
        assert!(!trie.reader().has(b"definitely not a key").unwrap());
    }
}

#[test]
fn test_root_independent_of_insert_order() {
    for model in all_models() {
        let pairs = random_pairs(2, 150);
        let forward = build(model, &pairs);

        let mut backward = Trie::empty(model, InMemoryKVStore::new());
        for (k, v) in pairs.iter().rev() {
            backward.update(k, v).unwrap();
        }
        backward.commit().unwrap();

        assert_eq!(forward.root_commitment(), backward.root_commitment());
    }
}

#[test]
fn test_root_independent_of_commit_batching() {
    let model = Blake3Model::new(Blake3Config { arity: 16, hash_size: 20 }).unwrap();
    let pairs = random_pairs(3, 120);
    let single = build(model, &pairs);

    let mut batched = Trie::empty(model, InMemoryKVStore::new());
    for (i, (k, v)) in pairs.iter().enumerate() {
        batched.update(k, v).unwrap();
        if i % 17 == 0 {
            batched.commit().unwrap();
        }
    }
    batched.commit().unwrap();
    assert_eq!(single.root_commitment(), batched.root_commitment());
}

#[test]
fn test_delete_keys() {
    for model in all_models() {
        let pairs = random_pairs(4, 120);
        let mut trie = build(model, &pairs);

        let mut deleted = BTreeSet::new();
        let mut kept = BTreeMap::new();
        for (i, (k, v)) in pairs.iter().enumerate() {
            if i % 2 == 1 {
                deleted.insert(k.clone());
            } else {
                kept.insert(k.clone(), v.clone());
            }
        }
        for k in &deleted {
            trie.delete(k).unwrap();
        }
        let outcome = trie.commit().unwrap();
        assert_eq!(outcome.deleted_keys, deleted);

        let fresh = build(model, &kept);
        assert_eq!(outcome.root.as_ref(), fresh.root_commitment());

        for k in &deleted {
            let proof = model.proof(k, trie.reader()).unwrap();
            assert!(proof.is_proof_of_absence());
            proof.validate(&model, outcome.root.as_ref()).unwrap();
        }
    }
}

#[test]
fn test_delete_everything() {
    for model in all_models() {
        let pairs = random_pairs(5, 40);
        let mut trie = build(model, &pairs);
        for k in pairs.keys() {
            trie.update(k, b"").unwrap();
        }
        let outcome = trie.commit().unwrap();
        assert_eq!(outcome.root, None);
        assert_eq!(outcome.deleted_keys.len(), pairs.len());

        let proof = model.proof(pairs.keys().next().unwrap(), trie.reader()).unwrap();
        assert!(proof.path.is_empty());
        proof.validate(&model, None).unwrap();
    }
}

#[test]
fn test_old_roots_stay_readable() {
    let model = Blake3Model::new(Blake3Config::default()).unwrap();
    let store = InMemoryKVStore::new().into_shared();

    let mut trie = Trie::empty(model, std::sync::Arc::clone(&store));
    trie.update(b"account", b"100").unwrap();
    let first = trie.commit().unwrap().root;

    trie.update(b"account", b"250").unwrap();
    trie.update(b"other", b"1").unwrap();
    let second = trie.commit().unwrap().root;
    assert_ne!(first, second);

    let old = TrieReader::new(model, std::sync::Arc::clone(&store), first.clone()).unwrap();
    let proof = model.proof(b"account", &old).unwrap();
    proof.validate_with_value(&model, first.as_ref(), b"100").unwrap();
    assert!(!old.has(b"other").unwrap());

    let proof = model.proof(b"account", trie.reader()).unwrap();
    proof.validate_with_value(&model, second.as_ref(), b"250").unwrap();
}

#[test]
fn test_commit_reuses_unchanged_records() {
    let model = Blake3Model::new(Blake3Config { arity: 16, hash_size: 32 }).unwrap();
    let pairs = random_pairs(6, 200);
    let mut trie = Trie::empty(model, InMemoryKVStore::new());
    for (k, v) in &pairs {
        trie.update(k, v).unwrap();
    }
    let first = trie.commit().unwrap();
    assert!(first.nodes_written > 0);

    // rewriting the same values produces no new records
    for (k, v) in pairs.iter().take(10) {
        trie.update(k, v).unwrap();
    }
    let second = trie.commit().unwrap();
    assert_eq!(second.root, first.root);
    assert_eq!(second.nodes_written, 0);
}

#[test]
fn test_open_unknown_root() {
    let model = Blake3Model::new(Blake3Config::default()).unwrap();
    let trie = build(model, &random_pairs(7, 5));
    let root = trie.root_commitment().cloned();
    let (_, kv) = trie.into_reader().into_inner();

    assert!(TrieReader::new(model, kv.clone(), root).is_ok());

    let unknown = trie_root_of_other_data(model);
    let err = TrieReader::new(model, kv, unknown).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RootNotFound);
}

#[test]
fn test_proof_when_root_vanishes() {
    let model = Blake3Model::new(Blake3Config::default()).unwrap();
    let store = InMemoryKVStore::new().into_shared();
    let mut trie = Trie::empty(model, std::sync::Arc::clone(&store));
    trie.update(b"k", b"v").unwrap();
    let root = trie.commit().unwrap().root;
    let reader = TrieReader::new(model, std::sync::Arc::clone(&store), root).unwrap();

    // the backend loses every record after the reader was opened
    *store.write().unwrap() = InMemoryKVStore::new();

    let generic = reader.proof_generic(b"k").unwrap();
    assert_eq!(generic.ending, ProofEnding::RootNotFound);
    let err = model.proof(b"k", &reader).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RootNotFound);
    assert_eq!(err.operation(), "blake3_model::proof");
    let err = reader.get(b"k").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RootNotFound);
}

fn trie_root_of_other_data(model: Blake3Model) -> Option<vtrie_blake3::HashCommitment> {
    let mut pairs = BTreeMap::new();
    pairs.insert(b"unrelated".to_vec(), b"data".to_vec());
    build(model, &pairs).root_commitment().cloned()
}

#[test]
fn test_reconcile() {
    for model in all_models() {
        let pairs = random_pairs(8, 60);
        let mut source = InMemoryKVStore::new();
        for (k, v) in &pairs {
            source.set(k, v).unwrap();
        }

        let mut trie = Trie::empty(model, InMemoryKVStore::new());
        trie.update_all(&source).unwrap();
        trie.commit().unwrap();
        assert!(trie.reconcile(&source).unwrap().is_empty());

        let changed = pairs.keys().next().unwrap().clone();
        source.set(&changed, b"something else entirely").unwrap();
        source.set(b"not in trie", b"x").unwrap();

        let mut mismatched = trie.reconcile(&source).unwrap();
        mismatched.sort();
        let mut expected = vec![changed, b"not in trie".to_vec()];
        expected.sort();
        assert_eq!(mismatched, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn history_independence(
        pairs in prop::collection::btree_map(
            prop::collection::vec(0u8..=255, 0..4),
            prop::collection::vec(1u8..=255, 1..40),
            0..40,
        ),
        extra in prop::collection::vec(prop::collection::vec(0u8..=255, 0..4), 0..10),
        arity in prop::sample::select(vec![2usize, 4, 16, 256]),
    ) {
        let model = Blake3Model::new(Blake3Config { arity, hash_size: 20 }).unwrap();
        let direct = build(model, &pairs);

        // insert noise first, then the real pairs in reverse, then drop the noise
        let mut noisy = Trie::empty(model, InMemoryKVStore::new());
        for k in &extra {
            noisy.update(k, b"noise").unwrap();
        }
        noisy.commit().unwrap();
        for (k, v) in pairs.iter().rev() {
            noisy.update(k, v).unwrap();
        }
        for k in &extra {
            if !pairs.contains_key(k) {
                noisy.delete(k).unwrap();
            }
        }
        noisy.commit().unwrap();

        prop_assert_eq!(direct.root_commitment(), noisy.root_commitment());
    }
}
