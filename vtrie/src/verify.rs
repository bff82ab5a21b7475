//! # Proof validation
//!
//! Pure recomputation of a proof path against a claimed root. Nothing here
//! touches a store: the only inputs are the path, the key and the
//! commitment model.

use thiserror::Error as ThisError;

use crate::commitment::CommitmentModel;
use crate::error::{Error, Result};
use crate::node::NodeData;
use crate::path::{common_prefix_len, unpack};
use crate::proof::{ProofElement, ProofEnding};

/// Reason a proof was rejected
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ProofFailure {
    #[error("proof refers to a root that was not found")]
    RootNotFound,
    #[error("empty proof path requires a nil root")]
    EmptyPathForRoot,
    #[error("empty proof path must end with extend, got {0}")]
    EmptyPathEnding(ProofEnding),
    #[error("non-empty proof path against a nil root")]
    RootIsNil,
    #[error("symbol out of range in node at depth {depth}")]
    SymbolOutOfRange { depth: usize },
    #[error("path fragment at depth {depth} does not match the key")]
    FragmentMismatch { depth: usize },
    #[error("child index at depth {depth} does not match the key")]
    ChildIndexMismatch { depth: usize },
    #[error("ending {ending} is inconsistent with the key")]
    EndingMismatch { ending: ProofEnding },
    #[error("commitment of node at depth {depth} is not recorded in its parent")]
    ChildCommitmentMismatch { depth: usize },
    #[error("recomputed root does not match the claimed root")]
    RootMismatch,
    #[error("proof does not prove inclusion")]
    NotInclusion,
    #[error("terminal does not commit to the claimed value")]
    TerminalMismatch,
}

impl ProofFailure {
    pub fn into_error(self) -> Error {
        Error::validation_failed(self.to_string())
            .with_operation("proof::validate")
            .set_source(self)
    }
}

/// Validate a path for `key` against `root`.
///
/// Checks the key walk (fragments, followed symbols, ending condition),
/// then recomputes commitments bottom-up and compares each one with the
/// commitment recorded in its parent and, at the top, with `root`.
pub fn validate_path<M: CommitmentModel>(
    model: &M,
    key: &[u8],
    path: &[ProofElement<M::VCommitment, M::TCommitment>],
    ending: ProofEnding,
    root: Option<&M::VCommitment>,
) -> Result<()> {
    check_path(model, key, path, ending, root).map_err(ProofFailure::into_error)
}

/// Validate a path and require it to prove `value` for `key`
pub fn validate_path_with_value<M: CommitmentModel>(
    model: &M,
    key: &[u8],
    path: &[ProofElement<M::VCommitment, M::TCommitment>],
    ending: ProofEnding,
    root: Option<&M::VCommitment>,
    value: &[u8],
) -> Result<()> {
    validate_path(model, key, path, ending, root)?;

    let terminal = match (ending, path.last()) {
        (ProofEnding::Terminal, Some(last)) => last.node.terminal.as_ref(),
        _ => None,
    };
    let Some(terminal) = terminal else {
        return Err(ProofFailure::NotInclusion.into_error());
    };
    if model.commit_to_data(value).as_ref() != Some(terminal) {
        return Err(ProofFailure::TerminalMismatch.into_error());
    }
    Ok(())
}

fn check_path<M: CommitmentModel>(
    model: &M,
    key: &[u8],
    path: &[ProofElement<M::VCommitment, M::TCommitment>],
    ending: ProofEnding,
    root: Option<&M::VCommitment>,
) -> std::result::Result<(), ProofFailure> {
    if ending == ProofEnding::RootNotFound {
        return Err(ProofFailure::RootNotFound);
    }

    let Some((last, parents)) = path.split_last() else {
        if root.is_some() {
            return Err(ProofFailure::EmptyPathForRoot);
        }
        if ending != ProofEnding::Extend {
            return Err(ProofFailure::EmptyPathEnding(ending));
        }
        return Ok(());
    };
    let Some(root) = root else {
        return Err(ProofFailure::RootIsNil);
    };

    let arity = model.path_arity();
    for (depth, element) in path.iter().enumerate() {
        element
            .node
            .check_arity(arity)
            .map_err(|_| ProofFailure::SymbolOutOfRange { depth })?;
    }

    // Forward: the key must walk exactly this path
    let unpacked = unpack(key, arity);
    let mut consumed = 0;
    for (depth, element) in parents.iter().enumerate() {
        let rest = &unpacked[consumed..];
        let fragment = &element.node.path_fragment;
        if rest.len() <= fragment.len() || !rest.starts_with(fragment) {
            return Err(ProofFailure::FragmentMismatch { depth });
        }
        if rest[fragment.len()] != element.child_index {
            return Err(ProofFailure::ChildIndexMismatch { depth });
        }
        consumed += fragment.len() + 1;
    }
    check_ending(&unpacked[consumed..], &last.node, last.child_index, ending)?;

    // Backward: recompute commitments up to the root
    let mut commitment = model.commit_node(&last.node);
    for (depth, element) in parents.iter().enumerate().rev() {
        match element.node.children.get(&element.child_index) {
            Some(recorded) if *recorded == commitment => {}
            _ => return Err(ProofFailure::ChildCommitmentMismatch { depth: depth + 1 }),
        }
        commitment = model.commit_node(&element.node);
    }
    if commitment != *root {
        return Err(ProofFailure::RootMismatch);
    }
    Ok(())
}

fn check_ending<V, T>(
    rest: &[u8],
    node: &NodeData<V, T>,
    child_index: u8,
    ending: ProofEnding,
) -> std::result::Result<(), ProofFailure> {
    let fragment = &node.path_fragment;
    let consistent = match ending {
        ProofEnding::Terminal => rest == fragment.as_slice(),
        ProofEnding::Split => common_prefix_len(rest, fragment) < fragment.len(),
        ProofEnding::Extend => {
            rest.len() > fragment.len()
                && rest.starts_with(fragment)
                && rest[fragment.len()] == child_index
                && !node.children.contains_key(&child_index)
        }
        ProofEnding::RootNotFound => false,
    };
    if consistent {
        Ok(())
    } else {
        Err(ProofFailure::EndingMismatch { ending })
    }
}
