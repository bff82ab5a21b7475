//! # Node records
//!
//! A node is a path fragment, an optional terminal commitment and a sparse
//! table of child commitments. Its own vector commitment is the key it is
//! stored under, so it is not part of the encoded record.
//!
//! Record layout (RLP):
//! `[fragment, [idx0, vc0, idx1, vc1, ...], terminal?]`
//! with strictly ascending child indices and the terminal omitted when nil.

use std::collections::BTreeMap;

use alloy_rlp::{BufMut, Decodable, Encodable, Header};

use crate::codec::{decode_bytes, decode_list_payload, list_length};
use crate::error::{symbol_out_of_range, Result};
use crate::path::PathArity;

/// Persisted content of one trie node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData<V, T> {
    /// Symbols consumed between the parent's child index and this node
    pub path_fragment: Vec<u8>,
    /// Commitment to the value stored at this node, if any
    pub terminal: Option<T>,
    /// Child commitments keyed by symbol
    pub children: BTreeMap<u8, V>,
    /// Commitment of this node; `None` until committed
    pub commitment: Option<V>,
}

impl<V, T> Default for NodeData<V, T> {
    fn default() -> Self {
        NodeData {
            path_fragment: Vec::new(),
            terminal: None,
            children: BTreeMap::new(),
            commitment: None,
        }
    }
}

impl<V, T> NodeData<V, T> {
    /// Create an uncommitted node
    pub fn new(path_fragment: Vec<u8>, terminal: Option<T>) -> Self {
        NodeData {
            path_fragment,
            terminal,
            children: BTreeMap::new(),
            commitment: None,
        }
    }

    /// Node holds neither a value nor children
    pub fn is_empty(&self) -> bool {
        self.terminal.is_none() && self.children.is_empty()
    }

    /// Canonical compression: a node without a value never has exactly one child
    pub fn is_canonical(&self) -> bool {
        self.terminal.is_some() || self.children.len() != 1
    }

    /// Check every child symbol and fragment symbol against the alphabet
    pub fn check_arity(&self, arity: PathArity) -> Result<()> {
        let symbols = self.path_fragment.iter().chain(self.children.keys());
        for symbol in symbols {
            if !arity.contains(*symbol) {
                return Err(symbol_out_of_range(*symbol, arity.size()));
            }
        }
        Ok(())
    }
}

impl<V: Encodable, T: Encodable> NodeData<V, T> {
    fn children_payload_length(&self) -> usize {
        self.children
            .iter()
            .map(|(idx, c)| idx.length() + c.length())
            .sum()
    }

    fn payload_length(&self) -> usize {
        self.path_fragment.as_slice().length()
            + list_length(self.children_payload_length())
            + self.terminal.as_ref().map_or(0, |t| t.length())
    }
}

impl<V: Encodable, T: Encodable> Encodable for NodeData<V, T> {
    fn encode(&self, out: &mut dyn BufMut) {
        Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);

        self.path_fragment.as_slice().encode(out);

        Header {
            list: true,
            payload_length: self.children_payload_length(),
        }
        .encode(out);
        for (idx, c) in &self.children {
            idx.encode(out);
            c.encode(out);
        }

        if let Some(t) = &self.terminal {
            t.encode(out);
        }
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

impl<V: Decodable, T: Decodable> Decodable for NodeData<V, T> {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut payload = decode_list_payload(buf)?;

        let path_fragment = decode_bytes(&mut payload)?.to_vec();

        let mut children_payload = decode_list_payload(&mut payload)?;
        let mut children = BTreeMap::new();
        let mut last: Option<u8> = None;
        while !children_payload.is_empty() {
            let idx = u8::decode(&mut children_payload)?;
            if last.is_some_and(|l| l >= idx) {
                return Err(alloy_rlp::Error::Custom("child indices not strictly ascending"));
            }
            let c = V::decode(&mut children_payload)?;
            children.insert(idx, c);
            last = Some(idx);
        }

        let terminal = if payload.is_empty() {
            None
        } else {
            Some(T::decode(&mut payload)?)
        };
        if !payload.is_empty() {
            return Err(alloy_rlp::Error::Custom("unexpected items in node record"));
        }

        Ok(NodeData {
            path_fragment,
            terminal,
            children,
            commitment: None,
        })
    }
}
