//! Compact share codec: many short transactions packed into one sequence.
//!
//! Every unit is prefixed with its uvarint length and the delimited units are
//! concatenated in submission order. The concatenation is the sequence payload;
//! its length is the sequence length declared in the first share. Each compact
//! share reserves four bytes holding the in-share offset of the first unit that
//! starts in it (0 when none does), so a unit can be located from any share
//! without scanning the sequence from its start.

use crate::da_definition::{
    COMPACT_SHARE_RESERVED_BYTES, CONTINUATION_COMPACT_SHARE_CONTENT_SIZE, FIRST_COMPACT_SHARE_CONTENT_SIZE,
    SHARE_SIZE,
};
use crate::namespace::Namespace;
use crate::share::{sequence_len_for, share_header, Share, ShareError};
use crate::share_sequence::{parse_share_sequences, ParseError, ShareSequence};
use crate::varint;
use std::ops::Range;

/// Number of shares needed for a compact sequence of `sequence_len` delimited bytes.
pub fn compact_shares_needed(sequence_len: usize) -> usize {
    if sequence_len <= FIRST_COMPACT_SHARE_CONTENT_SIZE {
        return 1;
    }
    1 + (sequence_len - FIRST_COMPACT_SHARE_CONTENT_SIZE).div_ceil(CONTINUATION_COMPACT_SHARE_CONTENT_SIZE)
}

/// Bytes a unit of `unit_len` bytes occupies once delimited.
pub fn delimited_len(unit_len: usize) -> usize {
    varint::size(unit_len as u64) + unit_len
}

/// Maps a byte position in the sequence payload to `(share index, offset within share)`.
fn locate(position: usize) -> (usize, usize) {
    let first_payload_start = SHARE_SIZE - FIRST_COMPACT_SHARE_CONTENT_SIZE;
    let continuation_payload_start = SHARE_SIZE - CONTINUATION_COMPACT_SHARE_CONTENT_SIZE;
    if position < FIRST_COMPACT_SHARE_CONTENT_SIZE {
        return (0, first_payload_start + position);
    }
    let rest = position - FIRST_COMPACT_SHARE_CONTENT_SIZE;
    (
        1 + rest / CONTINUATION_COMPACT_SHARE_CONTENT_SIZE,
        continuation_payload_start + rest % CONTINUATION_COMPACT_SHARE_CONTENT_SIZE,
    )
}

/// First unit start per share: `result[i]` is the in-share offset or 0.
fn next_unit_offsets(unit_starts: &[usize], share_count: usize) -> Vec<u32> {
    let mut offsets = vec![0u32; share_count];
    for start in unit_starts {
        let (index, offset) = locate(*start);
        if offsets[index] == 0 {
            offsets[index] = offset as u32;
        }
    }
    offsets
}

/// Accumulates units of one compact namespace and exports them as shares.
#[derive(Clone, Debug)]
pub struct CompactShareSplitter {
    namespace: Namespace,
    share_version: u8,
    payload: Vec<u8>,
    unit_starts: Vec<usize>,
}

impl CompactShareSplitter {
    pub fn new(namespace: Namespace, share_version: u8) -> Self {
        Self {
            namespace,
            share_version,
            payload: Vec::new(),
            unit_starts: Vec::new(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Appends one unit in submission order.
    pub fn write_tx(&mut self, tx: &[u8]) {
        self.unit_starts.push(self.payload.len());
        varint::write(tx.len() as u64, &mut self.payload);
        self.payload.extend_from_slice(tx);
    }

    pub fn is_empty(&self) -> bool {
        self.unit_starts.is_empty()
    }

    /// Shares the sequence occupies; zero when no unit was written.
    pub fn count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        compact_shares_needed(self.payload.len())
    }

    /// Share index range (relative to the first share of the sequence) of each unit.
    pub fn share_ranges(&self) -> Vec<Range<usize>> {
        self.unit_starts
            .iter()
            .enumerate()
            .map(|(i, start)| {
                let end = self.unit_starts.get(i + 1).copied().unwrap_or(self.payload.len());
                let (first, _) = locate(*start);
                let (last, _) = locate(end - 1);
                first..last + 1
            })
            .collect()
    }

    /// Encodes the accumulated units.
    pub fn export(&self) -> Result<Vec<Share>, ShareError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let sequence_len = sequence_len_for(self.payload.len())?;
        let count = self.count();
        let offsets = next_unit_offsets(&self.unit_starts, count);
        let mut shares = Vec::with_capacity(count);
        let mut rest = self.payload.as_slice();
        for (index, offset) in offsets.into_iter().enumerate() {
            let declared = (index == 0).then_some(sequence_len);
            let (mut buf, cursor) = share_header(&self.namespace, self.share_version, declared, true)?;
            buf[cursor - COMPACT_SHARE_RESERVED_BYTES..cursor].copy_from_slice(&offset.to_be_bytes());
            let take = rest.len().min(SHARE_SIZE - cursor);
            buf[cursor..cursor + take].copy_from_slice(&rest[..take]);
            rest = &rest[take..];
            shares.push(Share::from_array(buf));
        }
        Ok(shares)
    }
}

/// Encodes `txs` as a single compact sequence in `namespace`.
pub fn split_txs<T: AsRef<[u8]>>(namespace: Namespace, share_version: u8, txs: &[T]) -> Result<Vec<Share>, ShareError> {
    let mut splitter = CompactShareSplitter::new(namespace, share_version);
    for tx in txs {
        splitter.write_tx(tx.as_ref());
    }
    splitter.export()
}

/// Splits the payload of one compact sequence back into units, checking the
/// next-unit offsets recorded in each share.
pub fn parse_compact_sequence(sequence: &ShareSequence) -> Result<Vec<Vec<u8>>, ParseError> {
    let data = sequence.raw_data()?;
    let mut units = Vec::new();
    let mut unit_starts = Vec::new();
    let mut position = 0;
    while position < data.len() {
        unit_starts.push(position);
        let (len, read) = varint::read(&data[position..])?;
        position += read;
        let available = data.len() - position;
        if len > available as u64 {
            return Err(ParseError::UnitTruncated {
                declared: len,
                available,
            });
        }
        let len = len as usize;
        units.push(data[position..position + len].to_vec());
        position += len;
    }
    let expected = next_unit_offsets(&unit_starts, sequence.shares.len());
    for (index, (share, expected)) in sequence.shares.iter().zip(expected).enumerate() {
        let found = share.next_unit_offset().unwrap_or_default();
        if found != expected {
            return Err(ParseError::InvalidNextUnitOffset { index, expected, found });
        }
    }
    Ok(units)
}

/// Decodes every compact sequence in `shares`, in order.
pub fn parse_compact_shares(shares: &[Share]) -> Result<Vec<Vec<u8>>, ParseError> {
    let mut units = Vec::new();
    for sequence in parse_share_sequences(shares, true)? {
        if !sequence.is_compact() {
            continue;
        }
        units.extend(parse_compact_sequence(&sequence)?);
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{PAY_FOR_BLOB_NAMESPACE, TX_NAMESPACE};

    fn tx(len: usize, fill: u8) -> Vec<u8> {
        vec![fill; len]
    }

    #[test]
    fn share_counts_at_boundaries() {
        assert_eq!(compact_shares_needed(0), 1);
        assert_eq!(compact_shares_needed(474), 1);
        assert_eq!(compact_shares_needed(475), 2);
        assert_eq!(compact_shares_needed(474 + 478), 2);
        assert_eq!(compact_shares_needed(474 + 478 + 1), 3);
        assert_eq!(delimited_len(127), 128);
        assert_eq!(delimited_len(128), 130);
    }

    #[test]
    fn short_txs_share_one_share() {
        let txs = vec![tx(10, 1), tx(20, 2), tx(30, 3)];
        let shares = split_txs(TX_NAMESPACE, 0, &txs).unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].sequence_len(), Some(63));
        // first unit starts right after the reserved bytes
        assert_eq!(shares[0].next_unit_offset(), Some(38));
        assert_eq!(parse_compact_shares(&shares).unwrap(), txs);
    }

    #[test]
    fn split_then_parse_recovers_units() {
        let txs = vec![tx(0, 0), tx(300, 1), tx(1000, 2), tx(5, 3), tx(478, 4)];
        let shares = split_txs(PAY_FOR_BLOB_NAMESPACE, 0, &txs).unwrap();
        let total: usize = txs.iter().map(|t| delimited_len(t.len())).sum();
        assert_eq!(shares.len(), compact_shares_needed(total));
        assert!(shares.iter().all(Share::is_compact));
        assert_eq!(parse_compact_shares(&shares).unwrap(), txs);
    }

    #[test]
    fn every_length_round_trips() {
        for len in 0..=3 * SHARE_SIZE {
            let single = vec![tx(len, 5)];
            let shares = split_txs(TX_NAMESPACE, 0, &single).unwrap();
            assert_eq!(shares.len(), compact_shares_needed(delimited_len(len)));
            assert_eq!(parse_compact_shares(&shares).unwrap(), single);

            // a trailing unit exercises the next-unit offset wherever this one ends
            let pair = vec![tx(len, 6), tx(3, 7)];
            let shares = split_txs(TX_NAMESPACE, 0, &pair).unwrap();
            assert_eq!(parse_compact_shares(&shares).unwrap(), pair);
        }
    }

    #[test]
    fn continuation_without_unit_start_has_zero_offset() {
        // one unit long enough to span three shares
        let shares = split_txs(TX_NAMESPACE, 0, &[tx(1200, 9)]).unwrap();
        assert_eq!(shares.len(), 3);
        assert_eq!(shares[1].next_unit_offset(), Some(0));
        assert_eq!(shares[2].next_unit_offset(), Some(0));
    }

    #[test]
    fn offset_points_at_unit_in_continuation_share() {
        let txs = vec![tx(500, 1), tx(10, 2)];
        let shares = split_txs(TX_NAMESPACE, 0, &txs).unwrap();
        assert_eq!(shares.len(), 2);
        // second unit begins at payload byte 502, i.e. byte 28 of share 1's payload
        let offset = shares[1].next_unit_offset().unwrap() as usize;
        assert_eq!(offset, 34 + 28);
        assert_eq!(shares[1].as_bytes()[offset], 10);
    }

    #[test]
    fn share_ranges_cover_each_unit() {
        let mut splitter = CompactShareSplitter::new(TX_NAMESPACE, 0);
        splitter.write_tx(&tx(10, 1));
        splitter.write_tx(&tx(900, 2));
        splitter.write_tx(&tx(10, 3));
        assert_eq!(splitter.count(), 2);
        assert_eq!(splitter.share_ranges(), vec![0..1, 0..2, 1..2]);
    }

    #[test]
    fn tampered_offset_is_rejected() {
        let shares = split_txs(TX_NAMESPACE, 0, &[tx(500, 1), tx(10, 2)]).unwrap();
        let mut raw = *shares[1].as_bytes();
        raw[30..34].copy_from_slice(&0u32.to_be_bytes());
        let tampered = vec![shares[0].clone(), Share::from_bytes(&raw).unwrap()];
        assert!(matches!(
            parse_compact_shares(&tampered),
            Err(ParseError::InvalidNextUnitOffset { index: 1, .. })
        ));
    }

    #[test]
    fn empty_splitter_exports_nothing() {
        let splitter = CompactShareSplitter::new(TX_NAMESPACE, 0);
        assert_eq!(splitter.count(), 0);
        assert!(splitter.export().unwrap().is_empty());
    }
}
