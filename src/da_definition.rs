//! CAPITALIZED protocol functions and constants for the data square.
//!
//! This module centralizes the protocol-defined constants and hashing
//! primitives so they can be imported by the concrete types (`share`, `nmt`,
//! `commitment`, `square`, etc.).
//!
//! Contents:
//! - Share layout constants (share size, namespace width, header fields)
//! - Square size bounds
//! - `SHA256` helpers
//! - RFC 6962 binary Merkle: `LEAF_HASH`, `INNER_HASH`, `EMPTY_HASH`, `MERKLE_ROOT`
//!
//! The binary Merkle tree is the one used to fold blob subtree roots into a
//! commitment and to fold row/column roots into the data root. It splits a
//! list of `n` leaves at the largest power of two strictly less than `n`.

#![allow(non_snake_case)]

use sha2::{Digest, Sha256};

/// 32-byte hash type used across the crate.
pub type Hash32 = [u8; 32];

/// Size of a SHA-256 digest in bytes.
pub const HASH_SIZE: usize = 32;

/// Size of every share in bytes.
pub const SHARE_SIZE: usize = 512;
/// Size of the namespace version prefix.
pub const NAMESPACE_VERSION_SIZE: usize = 1;
/// Size of the namespace ID (without version).
pub const NAMESPACE_ID_SIZE: usize = 28;
/// Size of a full namespace on the wire: version followed by ID.
pub const NAMESPACE_SIZE: usize = NAMESPACE_VERSION_SIZE + NAMESPACE_ID_SIZE;
/// Number of leading zero bytes in a version 0 namespace ID.
pub const NAMESPACE_VERSION_ZERO_PREFIX_SIZE: usize = 18;
/// Number of user-chosen bytes in a version 0 namespace ID.
pub const NAMESPACE_VERSION_ZERO_ID_SIZE: usize = NAMESPACE_ID_SIZE - NAMESPACE_VERSION_ZERO_PREFIX_SIZE;

/// Size of the info byte (share version and sequence-start flag).
pub const SHARE_INFO_BYTES: usize = 1;
/// Size of the big-endian sequence length carried by sequence-start shares.
pub const SEQUENCE_LEN_BYTES: usize = 4;
/// Size of the big-endian "next unit offset" carried by every compact share.
pub const COMPACT_SHARE_RESERVED_BYTES: usize = 4;

/// The only share version currently defined.
pub const SHARE_VERSION_ZERO: u8 = 0;
/// Largest share version representable in the seven high bits of the info byte.
pub const MAX_SHARE_VERSION: u8 = 127;

/// Payload bytes in the first share of a compact sequence.
pub const FIRST_COMPACT_SHARE_CONTENT_SIZE: usize =
    SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES - SEQUENCE_LEN_BYTES - COMPACT_SHARE_RESERVED_BYTES;
/// Payload bytes in every other share of a compact sequence.
pub const CONTINUATION_COMPACT_SHARE_CONTENT_SIZE: usize =
    SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES - COMPACT_SHARE_RESERVED_BYTES;
/// Payload bytes in the first share of a sparse (blob) sequence.
pub const FIRST_SPARSE_SHARE_CONTENT_SIZE: usize =
    SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES - SEQUENCE_LEN_BYTES;
/// Payload bytes in every other share of a sparse (blob) sequence.
pub const CONTINUATION_SPARSE_SHARE_CONTENT_SIZE: usize = SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES;

/// Smallest square width the builder produces by default.
pub const DEFAULT_MIN_SQUARE_SIZE: usize = 1;
/// Default governance-controlled maximum square width.
pub const DEFAULT_GOV_MAX_SQUARE_SIZE: usize = 64;
/// Hard upper bound on the square width regardless of governance.
pub const SQUARE_SIZE_UPPER_BOUND: usize = 128;

/// Domain prefix for Merkle leaves (RFC 6962).
pub const LEAF_PREFIX: u8 = 0x00;
/// Domain prefix for Merkle inner nodes (RFC 6962).
pub const INNER_PREFIX: u8 = 0x01;

pub(crate) fn sha256_concat(parts: &[&[u8]]) -> Hash32 {
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p);
    }
    hasher.finalize().into()
}

/// Hash of the empty tree: `SHA256("")`.
pub fn EMPTY_HASH() -> Hash32 {
    sha256_concat(&[])
}

/// Leaf hash: `SHA256(0x00 || leaf)`.
pub fn LEAF_HASH(leaf: &[u8]) -> Hash32 {
    sha256_concat(&[&[LEAF_PREFIX], leaf])
}

/// Inner node hash: `SHA256(0x01 || left || right)`.
pub fn INNER_HASH(left: &Hash32, right: &Hash32) -> Hash32 {
    sha256_concat(&[&[INNER_PREFIX], left, right])
}

/// Largest power of two strictly less than `n` (`n >= 2`).
pub(crate) fn split_point(n: usize) -> usize {
    debug_assert!(n >= 2);
    let p = n.next_power_of_two();
    if p == n { n / 2 } else { p / 2 }
}

/// Compute an RFC 6962 Merkle root over arbitrary byte-string leaves.
///
/// - Empty input returns `EMPTY_HASH()`.
/// - A single leaf returns `LEAF_HASH(leaf)`.
/// - Otherwise the list is split at the largest power of two strictly less
///   than its length and the halves are combined with `INNER_HASH`.
pub fn MERKLE_ROOT<T: AsRef<[u8]>>(leaves: &[T]) -> Hash32 {
    match leaves.len() {
        0 => EMPTY_HASH(),
        1 => LEAF_HASH(leaves[0].as_ref()),
        n => {
            let k = split_point(n);
            let left = MERKLE_ROOT(&leaves[..k]);
            let right = MERKLE_ROOT(&leaves[k..]);
            INNER_HASH(&left, &right)
        }
    }
}

/// Round `n` down to a power of two (`n >= 1`).
pub(crate) fn round_down_power_of_two(n: usize) -> usize {
    debug_assert!(n >= 1);
    1 << (usize::BITS - 1 - n.leading_zeros())
}

/// Round `cursor` up to the next multiple of `multiple`.
pub(crate) fn round_up_by(cursor: usize, multiple: usize) -> usize {
    cursor.div_ceil(multiple) * multiple
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h32(x: u8) -> Hash32 {
        let mut a = [0u8; 32];
        a[0] = x;
        a
    }

    #[test]
    fn content_sizes_match_protocol() {
        assert_eq!(NAMESPACE_SIZE, 29);
        assert_eq!(FIRST_COMPACT_SHARE_CONTENT_SIZE, 474);
        assert_eq!(CONTINUATION_COMPACT_SHARE_CONTENT_SIZE, 478);
        assert_eq!(FIRST_SPARSE_SHARE_CONTENT_SIZE, 478);
        assert_eq!(CONTINUATION_SPARSE_SHARE_CONTENT_SIZE, 482);
    }

    #[test]
    fn merkle_root_empty() {
        let leaves: [&[u8]; 0] = [];
        assert_eq!(
            hex::encode(MERKLE_ROOT(&leaves)),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn merkle_root_single() {
        let leaf = h32(7);
        // a single leaf is still domain separated
        assert_eq!(MERKLE_ROOT(&[leaf]), sha256_concat(&[&[0x00], &leaf]));
    }

    #[test]
    fn merkle_root_three_leaves_splits_at_two() {
        let leaves = [h32(1), h32(2), h32(3)];
        let left = INNER_HASH(&LEAF_HASH(&leaves[0]), &LEAF_HASH(&leaves[1]));
        let expect = INNER_HASH(&left, &LEAF_HASH(&leaves[2]));
        assert_eq!(MERKLE_ROOT(&leaves), expect);
    }

    #[test]
    fn merkle_root_order_matters() {
        assert_ne!(MERKLE_ROOT(&[h32(1), h32(2)]), MERKLE_ROOT(&[h32(2), h32(1)]));
    }

    #[test]
    fn power_of_two_helpers() {
        assert_eq!(split_point(2), 1);
        assert_eq!(split_point(5), 4);
        assert_eq!(split_point(8), 4);
        assert_eq!(round_down_power_of_two(1), 1);
        assert_eq!(round_down_power_of_two(3), 2);
        assert_eq!(round_down_power_of_two(64), 64);
        assert_eq!(round_down_power_of_two(100), 64);
        assert_eq!(round_up_by(5, 4), 8);
        assert_eq!(round_up_by(8, 4), 8);
        assert_eq!(round_up_by(0, 4), 0);
    }
}
