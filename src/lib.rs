//! da-square crate library entry point.
//!
//! This crate lays out transactions and blobs in a square of fixed-size shares
//! and derives the commitments that let a verifier check a blob's inclusion.
//!
//! Modules:
//! - `da_definition`: CAPITALIZED protocol constants and binary Merkle functions.
//! - `serde_hex`: Serde helpers to encode/decode bytes as 0x-prefixed hex.
//! - `namespace`, `share`, `varint`: the share wire format.
//! - `blob`, `sparse_shares`, `compact_shares`, `share_sequence`: the share codec.
//! - `nmt`, `commitment`: namespaced Merkle roots and blob commitments.
//! - `square_config`, `square`, `builder`: square sizing and layout.

pub mod serde_hex;
pub mod da_definition;
pub mod namespace;
pub mod varint;
pub mod share;
pub mod blob;
pub mod share_sequence;
pub mod sparse_shares;
pub mod compact_shares;
pub mod nmt;
pub mod commitment;
pub mod square_config;
pub mod square;
pub mod builder;

pub use blob::Blob;
pub use builder::{build, BlobPlacement, BlobSubmission, BuildError, Builder, BuiltSquare, Cell};
pub use commitment::{create_commitment, Commitment};
pub use namespace::Namespace;
pub use share::Share;
pub use square::Square;
pub use square_config::SquareConfig;
