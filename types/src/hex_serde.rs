//! Serde adapter that encodes fixed-size byte arrays as lowercase hex strings.
//!
//! Used with `#[serde(with = "crate::hex_serde")]` so that hashes, keys and
//! signatures read naturally in the JSON wire format and the persisted chain.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

use crate::ParseError;

/// Decode a hex string into exactly `N` bytes.
pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
    let bytes = hex::decode(s).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ParseError::InvalidLength {
            expected: N,
            actual: len,
        })
}

pub fn serialize<S: Serializer, const N: usize>(
    bytes: &[u8; N],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
    deserializer: D,
) -> Result<[u8; N], D::Error> {
    let s = String::deserialize(deserializer)?;
    decode_fixed(&s).map_err(D::Error::custom)
}
