//! Serde helpers to serialize/deserialize bytes as 0x-prefixed hex strings.
//!
//! - `hex_vec`: for `Vec<u8>` of any length (blob payloads).
//! - `hex_array`: for `[u8; N]` with exact length enforcement (namespaces,
//!   commitments, roots).

use serde::{Deserialize, Deserializer, Serializer};
use thiserror::Error;

/// Errors that can occur during hex (de)serialization.
#[derive(Debug, Error)]
pub enum HexSerdeError {
    /// Input string must begin with `0x` prefix.
    #[error("missing 0x prefix")]
    MissingPrefix,

    /// Input contained non-hex characters or odd-length digits.
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    /// For fixed-size arrays: decoded byte length did not match the expected size.
    #[error("length mismatch: expected {expected} bytes, got {actual} bytes")]
    LengthMismatch { expected: usize, actual: usize },
}

fn strip_0x(s: &str) -> Result<&str, HexSerdeError> {
    s.strip_prefix("0x").ok_or(HexSerdeError::MissingPrefix)
}

pub(crate) fn encode_lower_hex_prefixed(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    out.push_str(&hex::encode(bytes));
    out
}

fn decode_prefixed(s: &str) -> Result<Vec<u8>, HexSerdeError> {
    let hex_part = strip_0x(s)?;
    hex::decode(hex_part).map_err(|e| HexSerdeError::InvalidHex(e.to_string()))
}

/// Serde helpers for `Vec<u8>` as 0x-hex.
pub mod hex_vec {
    use super::*;

    /// Serialize bytes as an `"0x..."` lowercase hex string.
    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&encode_lower_hex_prefixed(bytes))
    }

    /// Deserialize a `Vec<u8>` from an `"0x..."` hex string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        decode_prefixed(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

/// Serde helpers for `[u8; N]` as 0x-hex.
pub mod hex_array {
    use super::*;

    /// Serialize a fixed-size array as an `"0x..."` lowercase hex string.
    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&encode_lower_hex_prefixed(bytes))
    }

    /// Deserialize a `[u8; N]` from an `"0x..."` hex string of exactly `N` bytes.
    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        let bytes = decode_prefixed(&s).map_err(|e| serde::de::Error::custom(e.to_string()))?;
        <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
            serde::de::Error::custom(
                HexSerdeError::LengthMismatch {
                    expected: N,
                    actual: bytes.len(),
                }
                .to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct VecWrap(#[serde(with = "crate::serde_hex::hex_vec")] Vec<u8>);

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Arr29Wrap(#[serde(with = "crate::serde_hex::hex_array")] [u8; 29]);

    #[test]
    fn vec_serializes_as_prefixed_hex() {
        let v = VecWrap(vec![0x00, 0x01, 0xaa, 0xff]);
        let s = serde_json::to_string(&v).unwrap();
        assert_eq!(s, "\"0x0001aaff\"");
        let back: VecWrap = serde_json::from_str(&s).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn empty_vec_is_bare_prefix() {
        let s = serde_json::to_string(&VecWrap(vec![])).unwrap();
        assert_eq!(s, "\"0x\"");
    }

    #[test]
    fn array_keeps_exact_width() {
        let mut a = [0u8; 29];
        a[0] = 0xde;
        a[28] = 0xad;
        let s = serde_json::to_string(&Arr29Wrap(a)).unwrap();
        let v: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v.as_str().unwrap().len(), 2 + 58);
        let back: Arr29Wrap = serde_json::from_str(&s).unwrap();
        assert_eq!(back.0, a);
    }

    #[test]
    fn vec_rejects_missing_prefix() {
        let err = serde_json::from_str::<VecWrap>("\"deadbeef\"").unwrap_err();
        assert!(err.to_string().contains("missing 0x prefix"));
    }

    #[test]
    fn array_wrong_length_rejected() {
        let s = format!("\"0x{}\"", "00".repeat(28));
        let err = serde_json::from_str::<Arr29Wrap>(&s).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }

    #[test]
    fn invalid_hex_char_rejected() {
        let err = serde_json::from_str::<VecWrap>("\"0xzz\"").unwrap_err();
        assert!(err.to_string().contains("invalid hex encoding"));
    }
}
