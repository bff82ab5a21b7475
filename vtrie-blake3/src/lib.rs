//! # vtrie-blake3
//!
//! BLAKE3 hash commitment model for [`vtrie`], with 20 or 32 byte digests
//! over any supported arity, and the matching proof type.
//!
//! ```rust
//! use vtrie::{InMemoryKVStore, Trie};
//! use vtrie_blake3::{Blake3Config, Blake3Model};
//!
//! let model = Blake3Model::new(Blake3Config::default()).unwrap();
//! let mut trie = Trie::empty(model, InMemoryKVStore::new());
//! trie.update(b"key", b"value").unwrap();
//! let root = trie.commit().unwrap().root;
//!
//! let proof = model.proof(b"key", trie.reader()).unwrap();
//! proof.validate_with_value(&model, root.as_ref(), b"value").unwrap();
//! ```

pub mod commitment;
pub mod config;
pub mod error;
pub mod model;
pub mod proof;

pub use commitment::{HashCommitment, Terminal};
pub use config::Blake3Config;
pub use model::Blake3Model;
pub use proof::{Element, KeyWithTerminal, Proof};
