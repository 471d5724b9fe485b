//! Bitcoin block header codec.
//!
//! Headers arrive as the fixed 80-byte wire serialization.  Decoding reads the
//! little-endian fields, computes the block identifier as a double SHA-256
//! over the raw bytes, and keeps everything needed by the proof-of-work and
//! chain-linkage checks.  Hashes are stored in wire order and rendered in the
//! reversed "display" order used by block explorers and RPC interfaces.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Serialized size of a block header.
pub const HEADER_LEN: usize = 80;

/// Length of a block hash in bytes.
pub const HASH_LEN: usize = 32;

/// Errors raised while decoding headers or block hashes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("header must be {expected} bytes, got {actual}")]
    /// The buffer is not exactly one serialized header.
    Length {
        /// Required byte length.
        expected: usize,
        /// Supplied byte length.
        actual: usize,
    },
    #[error("invalid hex: {0}")]
    /// Hex input could not be decoded.
    Hex(String),
}

/// 32-byte block identifier.
///
/// The bytes are kept in wire order (as they appear inside a serialized
/// header); [`fmt::Display`] and [`FromStr`] use the reversed display order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockHash([u8; HASH_LEN]);

impl BlockHash {
    /// All-zero hash, the `prev_hash` of the genesis block.
    pub const ZERO: BlockHash = BlockHash([0u8; HASH_LEN]);

    /// Wraps bytes given in wire order.
    pub fn from_wire_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Wire-order bytes.
    pub fn as_wire_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Bytes in display order (most significant byte first).
    pub fn to_display_bytes(&self) -> [u8; HASH_LEN] {
        let mut out = self.0;
        out.reverse();
        out
    }

    /// Parses the 64-character display hex form.
    pub fn from_display_hex(input: &str) -> Result<Self, HeaderError> {
        let bytes = hex::decode(input.trim()).map_err(|err| HeaderError::Hex(err.to_string()))?;
        if bytes.len() != HASH_LEN {
            return Err(HeaderError::Length {
                expected: HASH_LEN,
                actual: bytes.len(),
            });
        }
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(&bytes);
        out.reverse();
        Ok(Self(out))
    }

    /// Renders the display hex form (lowercase, 64 characters).
    pub fn to_display_hex(&self) -> String {
        hex::encode(self.to_display_bytes())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_hex())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.to_display_hex())
    }
}

impl FromStr for BlockHash {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_display_hex(s)
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_display_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_display_hex(&text).map_err(de::Error::custom)
    }
}

/// Double SHA-256, the identifier function for headers.
pub fn double_sha256(bytes: &[u8]) -> [u8; HASH_LEN] {
    let first = Sha256::digest(bytes);
    Sha256::digest(first).into()
}

/// Decoded block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version field.
    pub version: i32,
    /// Identifier of the parent block.
    pub prev_hash: BlockHash,
    /// Merkle root of the block's transactions, wire order.
    pub merkle_root: [u8; HASH_LEN],
    /// Miner timestamp (seconds since the Unix epoch).
    pub time: u32,
    /// Compact difficulty target (`nBits`).
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
    /// Identifier of this block, computed from the serialized fields.
    pub hash: BlockHash,
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn read_hash(bytes: &[u8], offset: usize) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&bytes[offset..offset + HASH_LEN]);
    out
}

impl BlockHeader {
    /// Decodes exactly one 80-byte serialized header.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() != HEADER_LEN {
            return Err(HeaderError::Length {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            version: read_u32(bytes, 0) as i32,
            prev_hash: BlockHash(read_hash(bytes, 4)),
            merkle_root: read_hash(bytes, 36),
            time: read_u32(bytes, 68),
            bits: read_u32(bytes, 72),
            nonce: read_u32(bytes, 76),
            hash: BlockHash(double_sha256(bytes)),
        })
    }

    /// Decodes a hex-encoded header.
    pub fn from_hex(input: &str) -> Result<Self, HeaderError> {
        let bytes = hex::decode(input.trim()).map_err(|err| HeaderError::Hex(err.to_string()))?;
        Self::decode(&bytes)
    }

    /// Serializes the header fields back into wire form.
    ///
    /// The stored `hash` is not written; it is always recomputed on decode.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(self.prev_hash.as_wire_bytes());
        out[36..68].copy_from_slice(&self.merkle_root);
        out[68..72].copy_from_slice(&self.time.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{GENESIS_HASH, MAINNET_HEADERS};

    #[test]
    fn decodes_genesis_bit_exact() {
        let header = BlockHeader::from_hex(MAINNET_HEADERS[0]).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.prev_hash, BlockHash::ZERO);
        assert_eq!(header.time, 1_231_006_505);
        assert_eq!(header.bits, 0x1d00_ffff);
        assert_eq!(header.nonce, 2_083_236_893);
        assert_eq!(header.hash.to_string(), GENESIS_HASH);
        assert_eq!(
            hex::encode(header.merkle_root),
            "3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a"
        );
    }

    #[test]
    fn previous_hash_uses_display_order() {
        let header = BlockHeader::from_hex(MAINNET_HEADERS[1]).unwrap();
        assert_eq!(header.prev_hash.to_string(), GENESIS_HASH);
        assert_eq!(
            header.hash.to_string(),
            "00000000839a8e6886ab5951d76f411475428afc90947ee320161bbf18eb6048"
        );
    }

    #[test]
    fn encode_restores_wire_bytes() {
        for raw in MAINNET_HEADERS {
            let header = BlockHeader::from_hex(raw).unwrap();
            assert_eq!(hex::encode(header.encode()), raw);
        }
    }

    #[test]
    fn rejects_wrong_length() {
        let bytes = hex::decode(MAINNET_HEADERS[0]).unwrap();
        assert_eq!(
            BlockHeader::decode(&bytes[..79]),
            Err(HeaderError::Length {
                expected: HEADER_LEN,
                actual: 79
            })
        );
        let mut long = bytes.clone();
        long.push(0);
        assert!(BlockHeader::decode(&long).is_err());
        assert!(BlockHeader::decode(&[]).is_err());
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(matches!(
            BlockHeader::from_hex("zz"),
            Err(HeaderError::Hex(_))
        ));
        assert!(matches!(
            BlockHash::from_display_hex("00ff"),
            Err(HeaderError::Length { actual: 2, .. })
        ));
    }

    #[test]
    fn hash_display_roundtrip_and_serde() {
        let hash: BlockHash = GENESIS_HASH.parse().unwrap();
        assert_eq!(hash.to_string(), GENESIS_HASH);
        assert_eq!(hash.as_wire_bytes()[31], 0x00);
        assert_eq!(hash.as_wire_bytes()[0], 0x6f);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{GENESIS_HASH}\""));
        let back: BlockHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
