//! Namespaced Merkle tree over SHA-256.
//!
//! Every node carries the minimum and maximum namespace of the leaves below it
//! alongside its digest, serialized as `min || max || digest` (90 bytes).
//!
//! - Leaf: `ns || ns || SHA256(0x00 || ns || data)`
//! - Inner: `SHA256(0x01 || left || right)` with `min = left.min` and
//!   `max = right.max`, except that a right child starting at the parity
//!   namespace leaves `max = left.max`.
//! - Empty tree: zero namespaces with `SHA256("")`.
//!
//! The tree is split like RFC 6962 (largest power of two strictly less than
//! the leaf count), so any aligned power-of-two run of leaves is exactly one
//! internal node of a larger tree that contains it.

use crate::da_definition::{
    sha256_concat, split_point, Hash32, HASH_SIZE, INNER_PREFIX, LEAF_PREFIX, NAMESPACE_ID_SIZE, NAMESPACE_SIZE,
};
use crate::namespace::{Namespace, PARITY_SHARES_NAMESPACE};
use crate::share::Share;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Serialized size of a node.
pub const NMT_NODE_SIZE: usize = 2 * NAMESPACE_SIZE + HASH_SIZE;

/// A namespaced Merkle tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NmtNode {
    pub min: Namespace,
    pub max: Namespace,
    #[serde(with = "crate::serde_hex::hex_array")]
    pub digest: Hash32,
}

impl NmtNode {
    pub fn empty() -> Self {
        let zero = Namespace::new(0, [0u8; NAMESPACE_ID_SIZE]);
        NmtNode {
            min: zero,
            max: zero,
            digest: sha256_concat(&[]),
        }
    }

    pub fn leaf(namespace: Namespace, data: &[u8]) -> Self {
        NmtNode {
            min: namespace,
            max: namespace,
            digest: sha256_concat(&[&[LEAF_PREFIX], namespace.as_bytes(), data]),
        }
    }

    pub fn inner(left: &NmtNode, right: &NmtNode) -> Result<Self, NmtError> {
        if left.max > right.min {
            return Err(NmtError::UnorderedChildren {
                left_max: left.max,
                right_min: right.min,
            });
        }
        let max = if right.min == PARITY_SHARES_NAMESPACE {
            left.max
        } else {
            right.max.max(left.max)
        };
        Ok(NmtNode {
            min: left.min,
            max,
            digest: sha256_concat(&[&[INNER_PREFIX], &left.to_bytes(), &right.to_bytes()]),
        })
    }

    pub fn to_bytes(&self) -> [u8; NMT_NODE_SIZE] {
        let mut out = [0u8; NMT_NODE_SIZE];
        out[..NAMESPACE_SIZE].copy_from_slice(self.min.as_bytes());
        out[NAMESPACE_SIZE..2 * NAMESPACE_SIZE].copy_from_slice(self.max.as_bytes());
        out[2 * NAMESPACE_SIZE..].copy_from_slice(&self.digest);
        out
    }
}

fn root_of(nodes: &[NmtNode]) -> Result<NmtNode, NmtError> {
    match nodes.len() {
        0 => Ok(NmtNode::empty()),
        1 => Ok(nodes[0]),
        n => {
            let k = split_point(n);
            let left = root_of(&nodes[..k])?;
            let right = root_of(&nodes[k..])?;
            NmtNode::inner(&left, &right)
        }
    }
}

/// Append-only namespaced Merkle tree.
#[derive(Clone, Debug, Default)]
pub struct Nmt {
    leaves: Vec<NmtNode>,
}

impl Nmt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a leaf; namespaces must be pushed in non-decreasing order.
    pub fn push(&mut self, namespace: Namespace, data: &[u8]) -> Result<(), NmtError> {
        if let Some(last) = self.leaves.last() {
            if namespace < last.max {
                return Err(NmtError::OutOfOrder {
                    last: last.max,
                    pushed: namespace,
                });
            }
        }
        self.leaves.push(NmtNode::leaf(namespace, data));
        Ok(())
    }

    /// Appends a share keyed by its own namespace.
    pub fn push_share(&mut self, share: &Share) -> Result<(), NmtError> {
        self.push(share.namespace(), share.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn root(&self) -> Result<NmtNode, NmtError> {
        root_of(&self.leaves)
    }

    /// Root of the subtree over leaves `[start, end)`.
    pub fn subtree_root(&self, start: usize, end: usize) -> Result<NmtNode, NmtError> {
        if start >= end || end > self.leaves.len() {
            return Err(NmtError::InvalidRange {
                start,
                end,
                len: self.leaves.len(),
            });
        }
        root_of(&self.leaves[start..end])
    }
}

/// Root of a tree whose leaves are `shares`.
pub fn shares_root(shares: &[Share]) -> Result<NmtNode, NmtError> {
    let mut tree = Nmt::new();
    for share in shares {
        tree.push_share(share)?;
    }
    tree.root()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NmtError {
    #[error("leaf namespace {pushed} pushed after {last}")]
    OutOfOrder { last: Namespace, pushed: Namespace },

    #[error("children out of namespace order: left max {left_max}, right min {right_min}")]
    UnorderedChildren { left_max: Namespace, right_min: Namespace },

    #[error("invalid leaf range {start}..{end} for {len} leaves")]
    InvalidRange { start: usize, end: usize, len: usize },
}
