//! Sparse share codec: one blob per sequence.

use crate::blob::Blob;
use crate::da_definition::{CONTINUATION_SPARSE_SHARE_CONTENT_SIZE, FIRST_SPARSE_SHARE_CONTENT_SIZE, SHARE_SIZE};
use crate::share::{sequence_len_for, share_header, Share, ShareError};
use crate::share_sequence::{ParseError, ShareSequence};

/// Number of shares a blob of `bytes` bytes occupies. Empty blobs still take one share.
pub fn sparse_shares_needed(bytes: usize) -> usize {
    if bytes <= FIRST_SPARSE_SHARE_CONTENT_SIZE {
        return 1;
    }
    1 + (bytes - FIRST_SPARSE_SHARE_CONTENT_SIZE).div_ceil(CONTINUATION_SPARSE_SHARE_CONTENT_SIZE)
}

/// Largest blob payload that fits in `shares` sparse shares.
pub fn available_bytes_from_sparse_shares(shares: usize) -> usize {
    match shares {
        0 => 0,
        n => FIRST_SPARSE_SHARE_CONTENT_SIZE + (n - 1) * CONTINUATION_SPARSE_SHARE_CONTENT_SIZE,
    }
}

/// Encodes a blob into its run of sparse shares.
pub fn split_blob(blob: &Blob) -> Result<Vec<Share>, ShareError> {
    let sequence_len = sequence_len_for(blob.data.len())?;
    let mut shares = Vec::with_capacity(sparse_shares_needed(blob.data.len()));
    let mut rest = blob.data.as_slice();
    let mut first = true;
    loop {
        let declared = first.then_some(sequence_len);
        let (mut buf, cursor) = share_header(&blob.namespace, blob.share_version, declared, false)?;
        let take = rest.len().min(SHARE_SIZE - cursor);
        buf[cursor..cursor + take].copy_from_slice(&rest[..take]);
        rest = &rest[take..];
        shares.push(Share::from_array(buf));
        first = false;
        if rest.is_empty() {
            break;
        }
    }
    Ok(shares)
}

/// Decodes a run of shares known to hold exactly one blob.
pub fn parse_blob(shares: &[Share]) -> Result<Blob, ParseError> {
    let sequence = ShareSequence::from_shares(shares.to_vec())?;
    blob_from_sequence(&sequence)
}

pub(crate) fn blob_from_sequence(sequence: &ShareSequence) -> Result<Blob, ParseError> {
    if sequence.is_compact() {
        return Err(ParseError::NotABlob(sequence.namespace));
    }
    let share_version = sequence.shares[0].version();
    let data = sequence.raw_data()?;
    Ok(Blob::with_share_version(sequence.namespace, data, share_version)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;

    fn blob(len: usize) -> Blob {
        let data = (0..len).map(|i| (i % 251) as u8).collect();
        Blob::new(Namespace::new_v0(&[7; 10]).unwrap(), data).unwrap()
    }

    #[test]
    fn share_counts_at_boundaries() {
        assert_eq!(sparse_shares_needed(0), 1);
        assert_eq!(sparse_shares_needed(478), 1);
        assert_eq!(sparse_shares_needed(479), 2);
        assert_eq!(sparse_shares_needed(478 + 482), 2);
        assert_eq!(sparse_shares_needed(478 + 482 + 1), 3);
        assert_eq!(available_bytes_from_sparse_shares(3), 478 + 2 * 482);
        for n in 1..6 {
            assert_eq!(sparse_shares_needed(available_bytes_from_sparse_shares(n)), n);
        }
    }

    #[test]
    fn split_then_parse_recovers_blob() {
        for len in (0..=3 * SHARE_SIZE).chain([5000]) {
            let b = blob(len);
            let shares = split_blob(&b).unwrap();
            assert_eq!(shares.len(), sparse_shares_needed(len));
            assert_eq!(parse_blob(&shares).unwrap(), b);
        }
    }

    #[test]
    fn empty_blob_is_one_start_share() {
        let shares = split_blob(&blob(0)).unwrap();
        assert_eq!(shares.len(), 1);
        assert!(shares[0].is_sequence_start());
        assert_eq!(shares[0].sequence_len(), Some(0));
    }

    #[test]
    fn only_first_share_declares_length() {
        let shares = split_blob(&blob(2000)).unwrap();
        assert_eq!(shares[0].sequence_len(), Some(2000));
        assert!(shares[1..].iter().all(|s| s.sequence_len().is_none()));
        // trailing bytes of the last share are zero
        let last = shares.last().unwrap().raw_data();
        let used = 2000 - 478 - 3 * 482;
        assert!(last[used..].iter().all(|b| *b == 0));
    }

    #[test]
    fn extra_share_is_rejected() {
        let mut shares = split_blob(&blob(100)).unwrap();
        shares.extend(split_blob(&blob(2000)).unwrap().into_iter().skip(1));
        assert!(matches!(parse_blob(&shares), Err(ParseError::LengthMismatch { .. })));
    }
}
