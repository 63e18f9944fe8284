//! Share sequences, padding shares and the framing errors of the decode side.
//!
//! A sequence is the run of shares encoding one logical unit: a blob, or the
//! whole compact region of one namespace. It begins with a sequence-start share
//! declaring its byte length and continues with shares of the same namespace.

use crate::compact_shares::compact_shares_needed;
use crate::blob::BlobError;
use crate::da_definition::SHARE_VERSION_ZERO;
use crate::namespace::{Namespace, PRIMARY_RESERVED_PADDING_NAMESPACE, TAIL_PADDING_NAMESPACE};
use crate::share::{share_header, Share, ShareError, ShareKind};
use crate::sparse_shares::sparse_shares_needed;
use crate::varint::VarintError;
use thiserror::Error;

/// Shares of one logical unit in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareSequence {
    pub namespace: Namespace,
    pub shares: Vec<Share>,
}

impl ShareSequence {
    /// Groups `shares` into a single sequence, checking framing.
    pub fn from_shares(shares: Vec<Share>) -> Result<Self, ParseError> {
        let first = shares.first().ok_or(ParseError::Empty)?;
        if !first.is_sequence_start() {
            return Err(ParseError::ExpectedSequenceStart { index: 0 });
        }
        let namespace = first.namespace();
        for (index, share) in shares.iter().enumerate().skip(1) {
            if share.namespace() != namespace {
                return Err(ParseError::NamespaceMismatch {
                    index,
                    expected: namespace,
                    found: share.namespace(),
                });
            }
            if share.is_sequence_start() {
                return Err(ParseError::UnexpectedSequenceStart { index });
            }
        }
        let sequence = ShareSequence { namespace, shares };
        sequence.validate_num_shares()?;
        Ok(sequence)
    }

    /// Declared byte length from the first share.
    pub fn sequence_len(&self) -> Result<u32, ParseError> {
        self.shares
            .first()
            .and_then(Share::sequence_len)
            .ok_or(ParseError::ExpectedSequenceStart { index: 0 })
    }

    pub fn is_compact(&self) -> bool {
        self.shares.first().is_some_and(Share::is_compact)
    }

    /// Checks that the declared length needs exactly as many shares as the sequence has.
    pub fn validate_num_shares(&self) -> Result<(), ParseError> {
        let declared = self.sequence_len()?;
        let expected = if self.is_compact() {
            compact_shares_needed(declared as usize)
        } else {
            sparse_shares_needed(declared as usize)
        };
        if expected != self.shares.len() {
            return Err(ParseError::LengthMismatch {
                declared,
                expected_shares: expected,
                actual_shares: self.shares.len(),
            });
        }
        Ok(())
    }

    /// Payload bytes of the sequence with trailing zero padding removed.
    pub fn raw_data(&self) -> Result<Vec<u8>, ParseError> {
        let declared = self.sequence_len()? as usize;
        let mut data = Vec::with_capacity(declared);
        for share in &self.shares {
            match share.kind() {
                ShareKind::Data { payload, .. } => data.extend_from_slice(payload),
                ShareKind::Padding { .. } => {}
            }
        }
        if data.len() < declared {
            return Err(ParseError::LengthMismatch {
                declared: declared as u32,
                expected_shares: self.shares.len() + 1,
                actual_shares: self.shares.len(),
            });
        }
        data.truncate(declared);
        Ok(data)
    }
}

/// Splits a run of shares into sequences.
///
/// Padding shares are dropped when `ignore_padding` is set; otherwise each
/// padding share is returned as its own one-share sequence.
pub fn parse_share_sequences(shares: &[Share], ignore_padding: bool) -> Result<Vec<ShareSequence>, ParseError> {
    let mut sequences: Vec<ShareSequence> = Vec::new();
    for (index, share) in shares.iter().enumerate() {
        if share.is_sequence_start() {
            if ignore_padding && share.is_padding() {
                continue;
            }
            sequences.push(ShareSequence {
                namespace: share.namespace(),
                shares: vec![share.clone()],
            });
            continue;
        }
        let Some(current) = sequences.last_mut() else {
            return Err(ParseError::ExpectedSequenceStart { index });
        };
        if current.namespace != share.namespace() {
            return Err(ParseError::NamespaceMismatch {
                index,
                expected: current.namespace,
                found: share.namespace(),
            });
        }
        current.shares.push(share.clone());
    }
    for sequence in &sequences {
        sequence.validate_num_shares()?;
    }
    Ok(sequences)
}

/// Padding share that keeps the namespace of the blob before it.
pub fn namespace_padding_share(namespace: &Namespace) -> Result<Share, ShareError> {
    let (buf, _) = share_header(namespace, SHARE_VERSION_ZERO, Some(0), false)?;
    Ok(Share::from_array(buf))
}

pub fn namespace_padding_shares(namespace: &Namespace, n: usize) -> Result<Vec<Share>, ShareError> {
    let share = namespace_padding_share(namespace)?;
    Ok(vec![share; n])
}

/// Padding between the compact region and the first blob.
pub fn reserved_padding_shares(n: usize) -> Result<Vec<Share>, ShareError> {
    namespace_padding_shares(&PRIMARY_RESERVED_PADDING_NAMESPACE, n)
}

/// Padding after the last blob.
pub fn tail_padding_shares(n: usize) -> Result<Vec<Share>, ShareError> {
    namespace_padding_shares(&TAIL_PADDING_NAMESPACE, n)
}

/// Framing errors surfaced when decoding shares back into units.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Varint(#[from] VarintError),

    #[error("no shares supplied")]
    Empty,

    #[error("share {index} is a continuation share where a sequence start was expected")]
    ExpectedSequenceStart { index: usize },

    #[error("share {index} starts a new sequence inside a unit")]
    UnexpectedSequenceStart { index: usize },

    #[error("share {index} has namespace {found}, sequence has {expected}")]
    NamespaceMismatch {
        index: usize,
        expected: Namespace,
        found: Namespace,
    },

    #[error("declared length {declared} needs {expected_shares} shares, got {actual_shares}")]
    LengthMismatch {
        declared: u32,
        expected_shares: usize,
        actual_shares: usize,
    },

    #[error("compact unit declares {declared} bytes but only {available} remain")]
    UnitTruncated { declared: u64, available: usize },

    #[error("share {index} records next unit offset {found}, units place it at {expected}")]
    InvalidNextUnitOffset { index: usize, expected: u32, found: u32 },

    #[error("sequence in namespace {0} is not a blob")]
    NotABlob(Namespace),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::Blob;
    use crate::sparse_shares::split_blob;

    fn ns(b: u8) -> Namespace {
        Namespace::new_v0(&[b; 10]).unwrap()
    }

    fn blob_shares(b: u8, len: usize) -> Vec<Share> {
        split_blob(&Blob::new(ns(b), vec![b; len]).unwrap()).unwrap()
    }

    #[test]
    fn splits_consecutive_blobs() {
        let mut shares = blob_shares(1, 1000);
        shares.extend(blob_shares(2, 10));
        let sequences = parse_share_sequences(&shares, true).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].shares.len(), 3);
        assert_eq!(sequences[0].raw_data().unwrap(), vec![1; 1000]);
        assert_eq!(sequences[1].namespace, ns(2));
    }

    #[test]
    fn padding_is_skipped_or_kept() {
        let mut shares = blob_shares(1, 10);
        shares.extend(namespace_padding_shares(&ns(1), 2).unwrap());
        shares.extend(tail_padding_shares(1).unwrap());
        assert_eq!(parse_share_sequences(&shares, true).unwrap().len(), 1);
        let all = parse_share_sequences(&shares, false).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].namespace, TAIL_PADDING_NAMESPACE);
        assert_eq!(all[3].raw_data().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn leading_continuation_is_rejected() {
        let shares = blob_shares(1, 1000);
        assert_eq!(
            parse_share_sequences(&shares[1..], true).unwrap_err(),
            ParseError::ExpectedSequenceStart { index: 0 }
        );
    }

    #[test]
    fn namespace_switch_mid_sequence_is_rejected() {
        let mut shares = blob_shares(1, 1000);
        shares[2] = blob_shares(2, 1000).remove(2);
        assert!(matches!(
            parse_share_sequences(&shares, true).unwrap_err(),
            ParseError::NamespaceMismatch { index: 2, .. }
        ));
    }

    #[test]
    fn missing_share_is_a_length_mismatch() {
        let shares = blob_shares(1, 1000);
        assert_eq!(
            ShareSequence::from_shares(shares[..2].to_vec()).unwrap_err(),
            ParseError::LengthMismatch {
                declared: 1000,
                expected_shares: 3,
                actual_shares: 2
            }
        );
    }
}
