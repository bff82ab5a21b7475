//! Small non-cryptographic commitment model for unit tests

use crate::commitment::CommitmentModel;
use crate::node::NodeData;
use crate::path::PathArity;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv(state: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(state, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

/// FNV-1a over the node layout, arity 16
#[derive(Debug, Clone, Copy)]
pub(crate) struct TestModel {
    pub arity: PathArity,
}

impl Default for TestModel {
    fn default() -> Self {
        TestModel {
            arity: PathArity::Arity16,
        }
    }
}

impl CommitmentModel for TestModel {
    type VCommitment = u64;
    type TCommitment = u64;

    fn path_arity(&self) -> PathArity {
        self.arity
    }

    fn commit_to_data(&self, data: &[u8]) -> Option<u64> {
        if data.is_empty() {
            return None;
        }
        Some(fnv(fnv(FNV_OFFSET, b"t"), data))
    }

    fn commit_node(&self, node: &NodeData<u64, u64>) -> u64 {
        let mut h = fnv(FNV_OFFSET, b"n");
        h = fnv(h, &(node.path_fragment.len() as u64).to_le_bytes());
        h = fnv(h, &node.path_fragment);
        match node.terminal {
            Some(t) => h = fnv(fnv(h, &[1]), &t.to_le_bytes()),
            None => h = fnv(h, &[0]),
        }
        for (idx, c) in &node.children {
            h = fnv(fnv(h, &[*idx]), &c.to_le_bytes());
        }
        h
    }

    fn description(&self) -> String {
        format!("fnv64 {}", self.arity)
    }
}
