//! Fixed-size shares and their header fields.
//!
//! Wire layout of every share (`SHARE_SIZE` bytes):
//!
//! ```text
//! [namespace 29][info 1][sequence_len 4 | start only][reserved 4 | compact only][payload][zero padding]
//! ```
//!
//! The info byte packs the share version in its seven high bits and the
//! sequence-start flag in its low bit. Only the first share of a sequence
//! carries the big-endian sequence length. Compact shares (transactions)
//! additionally carry a big-endian offset to the first unit that starts in
//! the share, or zero when no unit starts there.
//!
//! `Share::kind` exposes a tagged view (`ShareKind::Data` / `ShareKind::Padding`)
//! so decoding matches on variants instead of probing byte patterns.

use crate::da_definition::{
    COMPACT_SHARE_RESERVED_BYTES, MAX_SHARE_VERSION, NAMESPACE_SIZE, SEQUENCE_LEN_BYTES, SHARE_INFO_BYTES,
    SHARE_SIZE, SHARE_VERSION_ZERO,
};
use crate::namespace::{Namespace, NamespaceError, PAY_FOR_BLOB_NAMESPACE, TX_NAMESPACE};
use std::fmt;
use thiserror::Error;

const INFO_START: usize = NAMESPACE_SIZE;
const SEQUENCE_LEN_START: usize = INFO_START + SHARE_INFO_BYTES;

/// Share versions this crate can encode and decode.
pub const SUPPORTED_SHARE_VERSIONS: &[u8] = &[SHARE_VERSION_ZERO];

/// Info byte: `version << 1 | sequence_start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoByte(u8);

impl InfoByte {
    pub fn new(version: u8, is_sequence_start: bool) -> Result<Self, ShareError> {
        if version > MAX_SHARE_VERSION {
            return Err(ShareError::VersionTooLarge(version));
        }
        Ok(InfoByte((version << 1) | u8::from(is_sequence_start)))
    }

    pub fn from_byte(b: u8) -> Self {
        InfoByte(b)
    }

    pub fn as_byte(self) -> u8 {
        self.0
    }

    pub fn version(self) -> u8 {
        self.0 >> 1
    }

    pub fn is_sequence_start(self) -> bool {
        self.0 & 1 == 1
    }
}

/// Tagged view over a share's contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareKind<'a> {
    /// A share carrying part of a transaction or blob sequence.
    Data {
        namespace: Namespace,
        info: InfoByte,
        /// Present on sequence-start shares only.
        sequence_len: Option<u32>,
        /// Offset of the first unit starting in this share; compact shares only.
        next_unit_offset: Option<u32>,
        payload: &'a [u8],
    },
    /// An empty sequence-start share used to fill gaps.
    Padding { namespace: Namespace },
}

/// One share of the square.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Share(Box<[u8; SHARE_SIZE]>);

impl Share {
    /// Parses and validates a share from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ShareError> {
        let arr = <[u8; SHARE_SIZE]>::try_from(bytes).map_err(|_| ShareError::InvalidLength {
            expected: SHARE_SIZE,
            actual: bytes.len(),
        })?;
        Namespace::from_bytes(&arr[..NAMESPACE_SIZE])?;
        let info = InfoByte::from_byte(arr[INFO_START]);
        if !SUPPORTED_SHARE_VERSIONS.contains(&info.version()) {
            return Err(ShareError::UnsupportedVersion(info.version()));
        }
        let share = Share(Box::new(arr));
        if let Some(offset) = share.next_unit_offset() {
            let offset = offset as usize;
            if offset != 0 && (offset < share.payload_start() || offset >= SHARE_SIZE) {
                return Err(ShareError::ReservedOutOfRange(offset as u32));
            }
        }
        Ok(share)
    }

    /// Wraps bytes produced by this crate's splitters.
    pub(crate) fn from_array(arr: [u8; SHARE_SIZE]) -> Self {
        Share(Box::new(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SHARE_SIZE] {
        &self.0
    }

    pub fn namespace(&self) -> Namespace {
        let mut raw = [0u8; NAMESPACE_SIZE];
        raw.copy_from_slice(&self.0[..NAMESPACE_SIZE]);
        let mut id = [0u8; NAMESPACE_SIZE - 1];
        id.copy_from_slice(&raw[1..]);
        Namespace::new(raw[0], id)
    }

    pub fn info(&self) -> InfoByte {
        InfoByte::from_byte(self.0[INFO_START])
    }

    pub fn version(&self) -> u8 {
        self.info().version()
    }

    pub fn is_sequence_start(&self) -> bool {
        self.info().is_sequence_start()
    }

    /// Transaction shares are compact; everything else is sparse.
    pub fn is_compact(&self) -> bool {
        let ns = self.namespace();
        ns == TX_NAMESPACE || ns == PAY_FOR_BLOB_NAMESPACE
    }

    /// Declared byte length of the sequence this share starts.
    pub fn sequence_len(&self) -> Option<u32> {
        if !self.is_sequence_start() {
            return None;
        }
        let mut len = [0u8; SEQUENCE_LEN_BYTES];
        len.copy_from_slice(&self.0[SEQUENCE_LEN_START..SEQUENCE_LEN_START + SEQUENCE_LEN_BYTES]);
        Some(u32::from_be_bytes(len))
    }

    fn reserved_start(&self) -> usize {
        if self.is_sequence_start() {
            SEQUENCE_LEN_START + SEQUENCE_LEN_BYTES
        } else {
            SEQUENCE_LEN_START
        }
    }

    /// Offset of the first compact unit beginning in this share (0 = none).
    pub fn next_unit_offset(&self) -> Option<u32> {
        if !self.is_compact() {
            return None;
        }
        let start = self.reserved_start();
        let mut raw = [0u8; COMPACT_SHARE_RESERVED_BYTES];
        raw.copy_from_slice(&self.0[start..start + COMPACT_SHARE_RESERVED_BYTES]);
        Some(u32::from_be_bytes(raw))
    }

    fn payload_start(&self) -> usize {
        let start = self.reserved_start();
        if self.is_compact() {
            start + COMPACT_SHARE_RESERVED_BYTES
        } else {
            start
        }
    }

    /// Payload bytes after all headers, including any trailing zero padding.
    pub fn raw_data(&self) -> &[u8] {
        &self.0[self.payload_start()..]
    }

    /// A padding share is a sparse sequence start declaring zero bytes.
    ///
    /// The builder never places empty blobs, so inside a square this byte
    /// pattern always means padding.
    pub fn is_padding(&self) -> bool {
        self.sequence_len() == Some(0) && !self.is_compact()
    }

    pub fn kind(&self) -> ShareKind<'_> {
        if self.is_padding() {
            return ShareKind::Padding {
                namespace: self.namespace(),
            };
        }
        ShareKind::Data {
            namespace: self.namespace(),
            info: self.info(),
            sequence_len: self.sequence_len(),
            next_unit_offset: self.next_unit_offset(),
            payload: self.raw_data(),
        }
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("namespace", &self.namespace())
            .field("info", &self.info())
            .field("sequence_len", &self.sequence_len())
            .finish()
    }
}

/// Converts a sequence's byte length into its 4-byte header value.
pub(crate) fn sequence_len_for(len: usize) -> Result<u32, ShareError> {
    u32::try_from(len).map_err(|_| ShareError::SequenceTooLong {
        len,
        max: u32::MAX,
    })
}

/// Writes the header of a share and returns the buffer plus the payload cursor.
pub(crate) fn share_header(
    namespace: &Namespace,
    version: u8,
    sequence_len: Option<u32>,
    compact: bool,
) -> Result<([u8; SHARE_SIZE], usize), ShareError> {
    let mut buf = [0u8; SHARE_SIZE];
    buf[..NAMESPACE_SIZE].copy_from_slice(namespace.as_bytes());
    buf[INFO_START] = InfoByte::new(version, sequence_len.is_some())?.as_byte();
    let mut cursor = SEQUENCE_LEN_START;
    if let Some(len) = sequence_len {
        buf[cursor..cursor + SEQUENCE_LEN_BYTES].copy_from_slice(&len.to_be_bytes());
        cursor += SEQUENCE_LEN_BYTES;
    }
    if compact {
        cursor += COMPACT_SHARE_RESERVED_BYTES;
    }
    Ok((buf, cursor))
}

/// Errors produced while reading a single share (framing errors).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareError {
    #[error("invalid share length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    #[error("share version {0} exceeds the maximum of 127")]
    VersionTooLarge(u8),

    #[error("unsupported share version {0}")]
    UnsupportedVersion(u8),

    #[error("reserved bytes point outside the share payload: {0}")]
    ReservedOutOfRange(u32),

    #[error("sequence of {len} bytes exceeds the {max}-byte length field")]
    SequenceTooLong { len: usize, max: u32 },
}
