//! Blob commitments that do not depend on where the blob lands in the square.
//!
//! A blob's shares are cut into aligned power-of-two runs following the binary
//! decomposition of the share count, most significant first (5 shares →
//! `[4, 1]`). Each run gets its own namespaced Merkle root, and the roots are
//! folded into one value with `MERKLE_ROOT`. Because the builder starts every
//! blob on a boundary matching that decomposition, the same subtree roots show
//! up as internal nodes of the square's row trees.

use crate::blob::{Blob, BlobError};
use crate::da_definition::{self as definitions, Hash32};
use crate::nmt::{Nmt, NmtError, NmtNode};
use crate::share::{Share, ShareError};
use crate::sparse_shares::split_blob;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 32-byte blob commitment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(#[serde(with = "crate::serde_hex::hex_array")] pub Hash32);

impl Commitment {
    pub fn as_bytes(&self) -> &Hash32 {
        &self.0
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", hex::encode(self.0))
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::serde_hex::encode_lower_hex_prefixed(&self.0))
    }
}

/// Subtree sizes for `share_count` shares: its binary decomposition, largest first.
pub fn merkle_mountain_range_sizes(share_count: usize) -> Vec<usize> {
    (0..usize::BITS)
        .rev()
        .map(|bit| 1usize << bit)
        .filter(|size| share_count & size != 0)
        .collect()
}

/// Namespaced Merkle roots of each aligned run of `shares`.
pub fn subtree_roots(shares: &[Share]) -> Result<Vec<NmtNode>, CommitmentError> {
    if shares.is_empty() {
        return Err(CommitmentError::NoShares);
    }
    let mut tree = Nmt::new();
    for share in shares {
        tree.push_share(share)?;
    }
    let mut roots = Vec::new();
    let mut start = 0;
    for size in merkle_mountain_range_sizes(shares.len()) {
        roots.push(tree.subtree_root(start, start + size)?);
        start += size;
    }
    Ok(roots)
}

/// Commitment over an already-encoded run of blob shares.
pub fn commitment_from_shares(shares: &[Share]) -> Result<Commitment, CommitmentError> {
    let roots: Vec<_> = subtree_roots(shares)?.iter().map(NmtNode::to_bytes).collect();
    Ok(Commitment(definitions::MERKLE_ROOT(&roots)))
}

/// Commitment of a blob computed from the blob alone.
pub fn create_commitment(blob: &Blob) -> Result<Commitment, CommitmentError> {
    blob.validate()?;
    let shares = split_blob(blob)?;
    commitment_from_shares(&shares)
}

/// Commitments of many blobs, computed in parallel; output order matches input order.
pub fn create_commitments(blobs: &[Blob]) -> Result<Vec<Commitment>, CommitmentError> {
    blobs.par_iter().map(create_commitment).collect()
}

/// Recomputes the commitment of `shares` and compares it with `declared`.
pub fn verify_commitment(shares: &[Share], declared: &Commitment) -> Result<(), CommitmentError> {
    let computed = commitment_from_shares(shares)?;
    if computed != *declared {
        tracing::warn!(%declared, %computed, "blob commitment mismatch");
        return Err(CommitmentError::Mismatch {
            declared: *declared,
            computed,
        });
    }
    Ok(())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitmentError {
    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Nmt(#[from] NmtError),

    #[error("cannot commit to zero shares")]
    NoShares,

    #[error("commitment mismatch: declared {declared}, computed {computed}")]
    Mismatch { declared: Commitment, computed: Commitment },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::da_definition::{CONTINUATION_SPARSE_SHARE_CONTENT_SIZE, FIRST_SPARSE_SHARE_CONTENT_SIZE};
    use crate::namespace::Namespace;
    use crate::share_sequence::namespace_padding_shares;

    fn ns(b: u8) -> Namespace {
        Namespace::new_v0(&[b; 10]).unwrap()
    }

    /// Payload length that encodes to exactly `shares` shares.
    fn len_for_shares(shares: usize) -> usize {
        FIRST_SPARSE_SHARE_CONTENT_SIZE + (shares - 1) * CONTINUATION_SPARSE_SHARE_CONTENT_SIZE
    }

    fn blob_with_shares(b: u8, shares: usize) -> Blob {
        Blob::new(ns(b), vec![b; len_for_shares(shares)]).unwrap()
    }

    #[test]
    fn decomposition_is_binary_representation() {
        assert_eq!(merkle_mountain_range_sizes(0), Vec::<usize>::new());
        assert_eq!(merkle_mountain_range_sizes(1), vec![1]);
        assert_eq!(merkle_mountain_range_sizes(5), vec![4, 1]);
        assert_eq!(merkle_mountain_range_sizes(11), vec![8, 2, 1]);
        assert_eq!(merkle_mountain_range_sizes(64), vec![64]);
        for k in 1..200usize {
            let sizes = merkle_mountain_range_sizes(k);
            assert_eq!(sizes.iter().sum::<usize>(), k);
            assert_eq!(sizes.len(), k.count_ones() as usize);
            assert!(sizes.windows(2).all(|w| w[0] > w[1]));
        }
    }

    #[test]
    fn commitment_folds_subtree_roots() {
        let blob = blob_with_shares(3, 5);
        let shares = split_blob(&blob).unwrap();
        let roots = subtree_roots(&shares).unwrap();
        assert_eq!(roots.len(), 2);
        let mut first = Nmt::new();
        for share in &shares[..4] {
            first.push_share(share).unwrap();
        }
        assert_eq!(roots[0], first.root().unwrap());
        assert_eq!(roots[1], NmtNode::leaf(ns(3), shares[4].as_bytes()));
        let expect = definitions::MERKLE_ROOT(&[roots[0].to_bytes(), roots[1].to_bytes()]);
        assert_eq!(create_commitment(&blob).unwrap(), Commitment(expect));
    }

    #[test]
    fn commitment_is_reproducible() {
        let blob = blob_with_shares(9, 7);
        assert_eq!(create_commitment(&blob).unwrap(), create_commitment(&blob).unwrap());
    }

    #[test]
    fn commitment_ignores_preceding_padding() {
        // subtree roots over the blob's shares are unaffected by whatever
        // aligned padding sits in front of it in a larger tree
        let blob = blob_with_shares(4, 3);
        let shares = split_blob(&blob).unwrap();
        let mut tree = Nmt::new();
        for share in namespace_padding_shares(&ns(1), 2).unwrap().iter().chain(&shares) {
            tree.push_share(share).unwrap();
        }
        let placed = vec![tree.subtree_root(2, 4).unwrap(), tree.subtree_root(4, 5).unwrap()];
        assert_eq!(placed, subtree_roots(&shares).unwrap());
        assert_eq!(commitment_from_shares(&shares).unwrap(), create_commitment(&blob).unwrap());
    }

    #[test]
    fn different_namespace_changes_commitment() {
        let a = Blob::new(ns(1), vec![7; 100]).unwrap();
        let b = Blob::new(ns(2), vec![7; 100]).unwrap();
        assert_ne!(create_commitment(&a).unwrap(), create_commitment(&b).unwrap());
    }

    #[test]
    fn parallel_matches_sequential() {
        let blobs: Vec<_> = (1..9u8).map(|i| blob_with_shares(i, i as usize)).collect();
        let parallel = create_commitments(&blobs).unwrap();
        let sequential: Vec<_> = blobs.iter().map(|b| create_commitment(b).unwrap()).collect();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn verify_reports_mismatch() {
        let blob = blob_with_shares(5, 2);
        let shares = split_blob(&blob).unwrap();
        let good = create_commitment(&blob).unwrap();
        assert!(verify_commitment(&shares, &good).is_ok());
        let bad = Commitment([0u8; 32]);
        assert_eq!(
            verify_commitment(&shares, &bad).unwrap_err(),
            CommitmentError::Mismatch {
                declared: bad,
                computed: good
            }
        );
    }

    #[test]
    fn json_is_prefixed_hex() {
        let c = create_commitment(&blob_with_shares(1, 1)).unwrap();
        let s = serde_json::to_string(&c).unwrap();
        assert_eq!(s.len(), 2 + 2 + 64);
        assert_eq!(serde_json::from_str::<Commitment>(&s).unwrap(), c);
    }
}
