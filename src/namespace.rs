//! Namespaces: the 29-byte channel identifier carried by every share.
//!
//! A namespace is a one-byte version followed by a 28-byte ID. Ordering is
//! lexicographic over the full 29 bytes, which is the sort key for blob
//! placement and the ordering the namespaced Merkle tree enforces.
//!
//! Version 0 is the user version: its ID starts with 18 zero bytes followed by
//! 10 user-chosen bytes. Version 255 is reserved for protocol namespaces that
//! must sort after every user namespace (tail padding, parity shares).

use crate::da_definition::{
    NAMESPACE_ID_SIZE, NAMESPACE_SIZE, NAMESPACE_VERSION_ZERO_ID_SIZE, NAMESPACE_VERSION_ZERO_PREFIX_SIZE,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// User namespace version.
pub const NAMESPACE_VERSION_ZERO: u8 = 0;
/// Version reserved for namespaces that sort after all user data.
pub const NAMESPACE_VERSION_MAX: u8 = u8::MAX;

/// A share namespace.
///
/// Deserialization goes through [`Namespace::from_bytes`], so unknown versions
/// and malformed version 0 IDs are rejected.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Namespace(#[serde(with = "crate::serde_hex::hex_array")] [u8; NAMESPACE_SIZE]);

/// Transactions that do not pay for blobs.
pub const TX_NAMESPACE: Namespace = Namespace::primary_reserved(0x01);
/// Intermediate state roots (reserved, unused by the builder).
pub const INTERMEDIATE_STATE_ROOTS_NAMESPACE: Namespace = Namespace::primary_reserved(0x02);
/// Transactions that pay for blobs.
pub const PAY_FOR_BLOB_NAMESPACE: Namespace = Namespace::primary_reserved(0x04);
/// Padding between the compact region and the first blob.
pub const PRIMARY_RESERVED_PADDING_NAMESPACE: Namespace = Namespace::primary_reserved(0xff);
/// Largest primary reserved namespace.
pub const MAX_PRIMARY_RESERVED_NAMESPACE: Namespace = Namespace::primary_reserved(0xff);
/// Smallest secondary reserved namespace.
pub const MIN_SECONDARY_RESERVED_NAMESPACE: Namespace = Namespace::secondary_reserved(0x00, 0x00);
/// Padding after the last blob.
pub const TAIL_PADDING_NAMESPACE: Namespace = Namespace::secondary_reserved(0xff, 0xfe);
/// Namespace of erasure-coded parity shares.
pub const PARITY_SHARES_NAMESPACE: Namespace = Namespace::secondary_reserved(0xff, 0xff);

impl Namespace {
    /// Builds a namespace from a version and full 28-byte ID.
    pub const fn new(version: u8, id: [u8; NAMESPACE_ID_SIZE]) -> Self {
        let mut bytes = [0u8; NAMESPACE_SIZE];
        bytes[0] = version;
        let mut i = 0;
        while i < NAMESPACE_ID_SIZE {
            bytes[1 + i] = id[i];
            i += 1;
        }
        Namespace(bytes)
    }

    const fn primary_reserved(last: u8) -> Self {
        let mut id = [0u8; NAMESPACE_ID_SIZE];
        id[NAMESPACE_ID_SIZE - 1] = last;
        Namespace::new(NAMESPACE_VERSION_ZERO, id)
    }

    const fn secondary_reserved(fill: u8, last: u8) -> Self {
        let mut id = [fill; NAMESPACE_ID_SIZE];
        id[NAMESPACE_ID_SIZE - 1] = last;
        Namespace::new(NAMESPACE_VERSION_MAX, id)
    }

    /// Builds a version 0 namespace from up to 10 user bytes, left-padded with zeros.
    pub fn new_v0(sub_id: &[u8]) -> Result<Self, NamespaceError> {
        if sub_id.len() > NAMESPACE_VERSION_ZERO_ID_SIZE {
            return Err(NamespaceError::SubIdTooLong {
                max: NAMESPACE_VERSION_ZERO_ID_SIZE,
                actual: sub_id.len(),
            });
        }
        let mut id = [0u8; NAMESPACE_ID_SIZE];
        id[NAMESPACE_ID_SIZE - sub_id.len()..].copy_from_slice(sub_id);
        Ok(Namespace::new(NAMESPACE_VERSION_ZERO, id))
    }

    /// Parses a namespace from its 29-byte wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NamespaceError> {
        let arr = <[u8; NAMESPACE_SIZE]>::try_from(bytes).map_err(|_| NamespaceError::InvalidLength {
            expected: NAMESPACE_SIZE,
            actual: bytes.len(),
        })?;
        let ns = Namespace(arr);
        ns.validate_version()?;
        Ok(ns)
    }

    pub fn as_bytes(&self) -> &[u8; NAMESPACE_SIZE] {
        &self.0
    }

    pub fn version(&self) -> u8 {
        self.0[0]
    }

    pub fn id(&self) -> &[u8] {
        &self.0[1..]
    }

    fn validate_version(&self) -> Result<(), NamespaceError> {
        match self.version() {
            NAMESPACE_VERSION_ZERO => {
                if self.id()[..NAMESPACE_VERSION_ZERO_PREFIX_SIZE].iter().any(|b| *b != 0) {
                    return Err(NamespaceError::InvalidVersionZeroPrefix);
                }
                Ok(())
            }
            NAMESPACE_VERSION_MAX => Ok(()),
            v => Err(NamespaceError::UnsupportedVersion(v)),
        }
    }

    pub fn is_primary_reserved(&self) -> bool {
        *self <= MAX_PRIMARY_RESERVED_NAMESPACE
    }

    pub fn is_secondary_reserved(&self) -> bool {
        *self >= MIN_SECONDARY_RESERVED_NAMESPACE
    }

    pub fn is_reserved(&self) -> bool {
        self.is_primary_reserved() || self.is_secondary_reserved()
    }

    pub fn is_parity(&self) -> bool {
        *self == PARITY_SHARES_NAMESPACE
    }

    pub fn is_tail_padding(&self) -> bool {
        *self == TAIL_PADDING_NAMESPACE
    }

    pub fn is_primary_reserved_padding(&self) -> bool {
        *self == PRIMARY_RESERVED_PADDING_NAMESPACE
    }

    /// Checks that blobs may be published under this namespace.
    pub fn validate_for_blob(&self) -> Result<(), NamespaceError> {
        self.validate_version()?;
        if self.is_reserved() {
            return Err(NamespaceError::Reserved(*self));
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: [u8; NAMESPACE_SIZE] = crate::serde_hex::hex_array::deserialize(deserializer)?;
        Namespace::from_bytes(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", hex::encode(self.0))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::serde_hex::encode_lower_hex_prefixed(&self.0))
    }
}

/// Errors produced by namespace construction and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("invalid namespace length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("version 0 sub id too long: max {max} bytes, got {actual}")]
    SubIdTooLong { max: usize, actual: usize },

    #[error("version 0 namespace id must start with 18 zero bytes")]
    InvalidVersionZeroPrefix,

    #[error("unsupported namespace version {0}")]
    UnsupportedVersion(u8),

    #[error("namespace {0} is reserved")]
    Reserved(Namespace),
}
