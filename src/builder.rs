//! Square builder: places transactions and blobs into the smallest valid square.
//!
//! Layout, in row-major order:
//! 1. the compact region: the transaction sequence, then the pay-for-blob
//!    sequence, each in submission order;
//! 2. reserved padding up to the first blob's aligned start;
//! 3. blobs sorted by namespace (stable within a namespace), each starting at
//!    a multiple of `min(round_down_pow2(len), size)` and separated by padding
//!    that carries the preceding blob's namespace;
//! 4. tail padding to the end of the square.
//!
//! Empty blobs are rejected: a zero-length sparse sequence start is how
//! padding is encoded, so such a blob could not be recovered from the square.
//!
//! Encoding and commitment checks fan out over `rayon`; the placement pass that
//! needs every share count is single-threaded so the result is bit-identical
//! from run to run.

use crate::blob::{Blob, BlobError};
use crate::commitment::{verify_commitment, Commitment, CommitmentError};
use crate::compact_shares::CompactShareSplitter;
use crate::da_definition::{round_down_power_of_two, round_up_by, SHARE_VERSION_ZERO};
use crate::namespace::{Namespace, PAY_FOR_BLOB_NAMESPACE, TX_NAMESPACE};
use crate::share::{Share, ShareError};
use crate::share_sequence::{namespace_padding_shares, reserved_padding_shares, tail_padding_shares};
use crate::sparse_shares::split_blob;
use crate::square::{Square, SquareError};
use crate::square_config::{SquareConfig, SquareConfigError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A blob together with the commitment its paying transaction declared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobSubmission {
    pub blob: Blob,
    pub commitment: Commitment,
}

/// A `(row, column)` position in the square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// Where one blob ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobPlacement {
    /// Position of the blob in the submission list.
    pub submission_index: usize,
    pub namespace: Namespace,
    /// Half-open range of share indices.
    pub share_range: Range<usize>,
    /// First cell occupied.
    pub start: Cell,
    /// Cell just past the last one occupied (row-major).
    pub end: Cell,
    /// Commitment recomputed from the placed shares.
    pub commitment: Commitment,
}

/// Output of a successful build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltSquare {
    pub square: Square,
    /// Placements in square order.
    pub blobs: Vec<BlobPlacement>,
    /// Share range of each transaction, in submission order.
    pub tx_share_ranges: Vec<Range<usize>>,
    /// Share range of each pay-for-blob transaction, in submission order.
    pub pfb_share_ranges: Vec<Range<usize>>,
}

/// Collects the units of one candidate block.
#[derive(Clone, Debug)]
pub struct Builder {
    config: SquareConfig,
    txs: Vec<Vec<u8>>,
    pfb_txs: Vec<Vec<u8>>,
    blobs: Vec<BlobSubmission>,
}

struct EncodedBlob {
    submission_index: usize,
    namespace: Namespace,
    commitment: Commitment,
    shares: Vec<Share>,
}

/// First index at or after `cursor` where a blob of `blob_len` shares may start.
pub fn next_share_index(cursor: usize, blob_len: usize, square_size: usize) -> usize {
    let width = round_down_power_of_two(blob_len.max(1)).min(square_size);
    round_up_by(cursor, width)
}

/// Shares used (including inter-blob padding, excluding tail padding) at `square_size`.
fn layout_len(compact_len: usize, blob_lens: &[usize], square_size: usize) -> usize {
    blob_lens.iter().fold(compact_len, |cursor, len| {
        next_share_index(cursor, *len, square_size) + len
    })
}

/// Smallest square width that fits the units, or a capacity error.
pub fn square_size_for(config: &SquareConfig, compact_len: usize, blob_lens: &[usize]) -> Result<usize, BuildError> {
    let required = compact_len + blob_lens.iter().sum::<usize>();
    let max = config.max_square_size();
    let mut size = required.isqrt();
    if size * size < required {
        size += 1;
    }
    let mut size = size.next_power_of_two().max(config.min_square_size);
    while size <= max {
        let used = layout_len(compact_len, blob_lens, size);
        if used <= size * size {
            return Ok(size);
        }
        size *= 2;
    }
    let used = layout_len(compact_len, blob_lens, max);
    warn!(required = used, max_square_size = max, "units do not fit in the largest square");
    Err(BuildError::CapacityExceeded {
        required: used,
        capacity: config.max_shares(),
        max_square_size: max,
    })
}

impl Builder {
    pub fn new(config: SquareConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self {
            config,
            txs: Vec::new(),
            pfb_txs: Vec::new(),
            blobs: Vec::new(),
        })
    }

    pub fn config(&self) -> &SquareConfig {
        &self.config
    }

    /// Appends an ordinary transaction.
    pub fn append_tx(&mut self, tx: Vec<u8>) -> &mut Self {
        self.txs.push(tx);
        self
    }

    /// Appends a transaction that pays for blobs.
    pub fn append_pfb_tx(&mut self, tx: Vec<u8>) -> &mut Self {
        self.pfb_txs.push(tx);
        self
    }

    pub fn append_blob(&mut self, submission: BlobSubmission) -> &mut Self {
        self.blobs.push(submission);
        self
    }

    /// Lays out every appended unit.
    pub fn build(&self) -> Result<BuiltSquare, BuildError> {
        let ((tx_splitter, pfb_splitter), encoded) = rayon::join(
            || {
                (
                    compact_splitter(TX_NAMESPACE, &self.txs),
                    compact_splitter(PAY_FOR_BLOB_NAMESPACE, &self.pfb_txs),
                )
            },
            || encode_blobs(&self.blobs),
        );
        let mut encoded = encoded?;
        // stable: blobs of one namespace keep submission order
        encoded.sort_by_key(|b| b.namespace);

        let tx_shares = tx_splitter.export()?;
        let pfb_shares = pfb_splitter.export()?;
        let compact_len = tx_shares.len() + pfb_shares.len();
        let blob_lens: Vec<usize> = encoded.iter().map(|b| b.shares.len()).collect();
        let size = square_size_for(&self.config, compact_len, &blob_lens)?;

        let mut shares = Vec::with_capacity(size * size);
        shares.extend(tx_shares);
        shares.extend(pfb_shares);

        let mut ranges = Vec::with_capacity(encoded.len());
        let mut previous: Option<Namespace> = None;
        for blob in &encoded {
            let start = next_share_index(shares.len(), blob.shares.len(), size);
            let gap = start - shares.len();
            match previous {
                Some(ns) => shares.extend(namespace_padding_shares(&ns, gap)?),
                None => shares.extend(reserved_padding_shares(gap)?),
            }
            shares.extend(blob.shares.iter().cloned());
            debug!(
                namespace = %blob.namespace,
                start,
                len = blob.shares.len(),
                padding = gap,
                "placed blob"
            );
            ranges.push(start..shares.len());
            previous = Some(blob.namespace);
        }
        let tail = size * size - shares.len();
        shares.extend(tail_padding_shares(tail)?);
        let square = Square::new(shares)?;

        let blobs = encoded
            .par_iter()
            .zip(ranges.par_iter())
            .map(|(blob, range)| place(&square, blob, range.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let tx_share_ranges = tx_splitter.share_ranges();
        let pfb_offset = tx_splitter.count();
        let pfb_share_ranges = pfb_splitter
            .share_ranges()
            .into_iter()
            .map(|r| r.start + pfb_offset..r.end + pfb_offset)
            .collect();

        info!(
            square_size = size,
            txs = self.txs.len(),
            pfb_txs = self.pfb_txs.len(),
            blobs = blobs.len(),
            "built square"
        );
        Ok(BuiltSquare {
            square,
            blobs,
            tx_share_ranges,
            pfb_share_ranges,
        })
    }
}

/// Lays out `txs`, `pfb_txs` and `blobs` under `config`.
pub fn build(
    config: SquareConfig,
    txs: Vec<Vec<u8>>,
    pfb_txs: Vec<Vec<u8>>,
    blobs: Vec<BlobSubmission>,
) -> Result<BuiltSquare, BuildError> {
    let mut builder = Builder::new(config)?;
    builder.txs = txs;
    builder.pfb_txs = pfb_txs;
    builder.blobs = blobs;
    builder.build()
}

fn compact_splitter(namespace: Namespace, txs: &[Vec<u8>]) -> CompactShareSplitter {
    let mut splitter = CompactShareSplitter::new(namespace, SHARE_VERSION_ZERO);
    for tx in txs {
        splitter.write_tx(tx);
    }
    splitter
}

fn encode_blobs(submissions: &[BlobSubmission]) -> Result<Vec<EncodedBlob>, BuildError> {
    submissions
        .par_iter()
        .enumerate()
        .map(|(submission_index, submission)| -> Result<EncodedBlob, BuildError> {
            submission.blob.validate()?;
            // its single share would be indistinguishable from padding
            if submission.blob.data.is_empty() {
                return Err(BuildError::EmptyBlob {
                    submission_index,
                    namespace: submission.blob.namespace,
                });
            }
            Ok(EncodedBlob {
                submission_index,
                namespace: submission.blob.namespace,
                commitment: submission.commitment,
                shares: split_blob(&submission.blob)?,
            })
        })
        .collect()
}

fn place(square: &Square, blob: &EncodedBlob, share_range: Range<usize>) -> Result<BlobPlacement, BuildError> {
    let placed = &square.shares()[share_range.clone()];
    verify_commitment(placed, &blob.commitment).map_err(|e| match e {
        CommitmentError::Mismatch { declared, computed } => BuildError::CommitmentMismatch {
            submission_index: blob.submission_index,
            namespace: blob.namespace,
            declared,
            computed,
        },
        other => BuildError::Commitment(other),
    })?;
    let (row, col) = square.coordinates(share_range.start);
    let (end_row, end_col) = square.coordinates(share_range.end);
    Ok(BlobPlacement {
        submission_index: blob.submission_index,
        namespace: blob.namespace,
        start: Cell { row, col },
        end: Cell {
            row: end_row,
            col: end_col,
        },
        share_range,
        commitment: blob.commitment,
    })
}

/// Errors that can be returned by square construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] SquareConfigError),

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Square(#[from] SquareError),

    #[error(transparent)]
    Commitment(#[from] CommitmentError),

    /// The units need more shares than the largest allowed square holds.
    #[error("square capacity exceeded: need {required} shares, max square {max_square_size} holds {capacity}")]
    CapacityExceeded {
        required: usize,
        capacity: usize,
        max_square_size: usize,
    },

    /// Zero-length blobs cannot be placed in a square.
    #[error("blob {submission_index} in namespace {namespace} is empty")]
    EmptyBlob { submission_index: usize, namespace: Namespace },

    /// The commitment recomputed from the placed shares differs from the declared one.
    #[error("blob {submission_index} in namespace {namespace}: declared commitment {declared} != computed {computed}")]
    CommitmentMismatch {
        submission_index: usize,
        namespace: Namespace,
        declared: Commitment,
        computed: Commitment,
    },
}
