//! # vtrie-error
//!
//! Unified error handling for the vtrie workspace.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what went wrong (e.g. RootNotFound, ValidationFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary)
//! - **Error Context**: Carry the commitment, key or operation that failed
//! - **Error Source**: Wrap backend or codec errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use vtrie_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::RootNotFound, "root commitment does not resolve")
//!         .with_operation("trie::new")
//!         .with_context("root", "9f3c01"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All fallible trie operations return `Result<T, vtrie_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, callers further up only append context
//! - Proof validation failures are ordinary errors, never panics

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the vtrie Error
pub type Result<T> = std::result::Result<T, Error>;
