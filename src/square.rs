//! The N×N share square and the roots derived from it.
//!
//! The square owns calculation of its `DATA_ROOT`, the binary Merkle root of
//! the row roots followed by the column roots, each a namespaced Merkle root
//! over the shares of that row or column. Roots are computed over the original
//! square only; parity extension is left to the erasure-coding layer.

use crate::blob::Blob;
use crate::compact_shares::parse_compact_sequence;
use crate::da_definition::{self as definitions, Hash32};
use crate::nmt::{shares_root, NmtError, NmtNode};
use crate::share::Share;
use crate::share_sequence::{parse_share_sequences, ParseError};
use crate::sparse_shares::blob_from_sequence;
use rayon::prelude::*;
use thiserror::Error;

/// Row-major square of shares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Square {
    size: usize,
    shares: Vec<Share>,
}

impl Square {
    /// Wraps `shares` as a square, checking the count is the square of a power of two.
    pub fn new(shares: Vec<Share>) -> Result<Self, SquareError> {
        let size = shares.len().isqrt();
        if size * size != shares.len() || !size.is_power_of_two() {
            return Err(SquareError::NotASquare(shares.len()));
        }
        Ok(Square { size, shares })
    }

    /// Width (and height) of the square.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn into_shares(self) -> Vec<Share> {
        self.shares
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Share> {
        (row < self.size && col < self.size).then(|| &self.shares[row * self.size + col])
    }

    pub fn row(&self, row: usize) -> Option<&[Share]> {
        (row < self.size).then(|| &self.shares[row * self.size..(row + 1) * self.size])
    }

    pub fn column(&self, col: usize) -> Option<Vec<Share>> {
        (col < self.size).then(|| self.shares.iter().skip(col).step_by(self.size).cloned().collect())
    }

    /// Converts a share index into `(row, col)`.
    pub fn coordinates(&self, index: usize) -> (usize, usize) {
        (index / self.size, index % self.size)
    }

    /// Namespaced Merkle root of each row.
    pub fn row_roots(&self) -> Result<Vec<NmtNode>, SquareError> {
        self.shares
            .par_chunks(self.size)
            .map(|row| shares_root(row).map_err(SquareError::from))
            .collect()
    }

    /// Namespaced Merkle root of each column.
    pub fn column_roots(&self) -> Result<Vec<NmtNode>, SquareError> {
        (0..self.size)
            .into_par_iter()
            .map(|col| {
                let column: Vec<Share> = self.shares.iter().skip(col).step_by(self.size).cloned().collect();
                shares_root(&column).map_err(SquareError::from)
            })
            .collect()
    }

    /// Computes the `DATA_ROOT` summarizing the whole square.
    pub fn data_root(&self) -> Result<Hash32, SquareError> {
        let mut leaves: Vec<_> = self.row_roots()?.iter().map(NmtNode::to_bytes).collect();
        leaves.extend(self.column_roots()?.iter().map(NmtNode::to_bytes));
        Ok(definitions::MERKLE_ROOT(&leaves))
    }

    /// Transactions of every compact sequence, in square order.
    pub fn txs(&self) -> Result<Vec<Vec<u8>>, SquareError> {
        let mut txs = Vec::new();
        for sequence in parse_share_sequences(&self.shares, true)? {
            if sequence.is_compact() {
                txs.extend(parse_compact_sequence(&sequence)?);
            }
        }
        Ok(txs)
    }

    /// Blobs in square order, padding skipped.
    pub fn blobs(&self) -> Result<Vec<Blob>, SquareError> {
        let mut blobs = Vec::new();
        for sequence in parse_share_sequences(&self.shares, true)? {
            if !sequence.is_compact() {
                blobs.push(blob_from_sequence(&sequence)?);
            }
        }
        Ok(blobs)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SquareError {
    #[error("{0} shares do not form a power-of-two square")]
    NotASquare(usize),

    #[error(transparent)]
    Nmt(#[from] NmtError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
