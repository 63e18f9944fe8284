//! Blobs: namespaced user payloads placed in the sparse region of the square.

use crate::da_definition::SHARE_VERSION_ZERO;
use crate::namespace::{Namespace, NamespaceError};
use crate::share::SUPPORTED_SHARE_VERSIONS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user payload published under a namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlob")]
pub struct Blob {
    pub namespace: Namespace,
    /// Raw payload, serialized as `0x`-prefixed hex.
    #[serde(with = "crate::serde_hex::hex_vec")]
    pub data: Vec<u8>,
    pub share_version: u8,
}

impl Blob {
    /// Creates a version 0 blob after validating its namespace.
    pub fn new(namespace: Namespace, data: Vec<u8>) -> Result<Self, BlobError> {
        Self::with_share_version(namespace, data, SHARE_VERSION_ZERO)
    }

    pub fn with_share_version(namespace: Namespace, data: Vec<u8>, share_version: u8) -> Result<Self, BlobError> {
        let blob = Blob {
            namespace,
            data,
            share_version,
        };
        blob.validate()?;
        Ok(blob)
    }

    /// Checks the namespace is usable for blobs, the share version is known
    /// and the length fits the 4-byte sequence length.
    pub fn validate(&self) -> Result<(), BlobError> {
        self.namespace.validate_for_blob()?;
        if !SUPPORTED_SHARE_VERSIONS.contains(&self.share_version) {
            return Err(BlobError::UnsupportedShareVersion(self.share_version));
        }
        if u32::try_from(self.data.len()).is_err() {
            return Err(BlobError::TooLarge(self.data.len()));
        }
        Ok(())
    }
}

/// Unchecked JSON form of a [`Blob`]; deserialization validates through `TryFrom`.
#[derive(Deserialize)]
struct RawBlob {
    namespace: Namespace,
    #[serde(with = "crate::serde_hex::hex_vec")]
    data: Vec<u8>,
    share_version: u8,
}

impl TryFrom<RawBlob> for Blob {
    type Error = BlobError;

    fn try_from(raw: RawBlob) -> Result<Self, Self::Error> {
        Blob::with_share_version(raw.namespace, raw.data, raw.share_version)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlobError {
    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    #[error("unsupported share version {0}")]
    UnsupportedShareVersion(u8),

    #[error("blob of {0} bytes does not fit a 4-byte sequence length")]
    TooLarge(usize),
}
