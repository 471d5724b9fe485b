//! Randomness beacon derived from the draw block.
//!
//! The seed is the draw block's display hash (lowercase hex).  Each of the
//! `hash_rounds + 1` rounds hashes the ASCII text of the previous value with
//! SHA-256 and renders the digest as UPPERCASE hex, so the beacon mixed into
//! ticket scores is always uppercase.

use crate::header::{BlockHash, BlockHeader};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Raised when the draw block does not fall inside the supplied run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BeaconError {
    #[error(
        "draw block {draw_block_height} is outside the {available} blocks supplied after height {current_block_height}"
    )]
    /// `draw_block_height - current_block_height - 1` is not a valid index.
    IndexOutOfRange {
        /// Height of the designated draw block.
        draw_block_height: u64,
        /// Height of the reference block the run extends.
        current_block_height: u64,
        /// Number of headers supplied.
        available: usize,
    },
}

/// Beacon value together with the block that seeded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beacon {
    /// Block whose hash seeded the beacon.
    pub draw_block: BlockHash,
    /// Final uppercase hex digest.
    pub value: String,
}

impl Beacon {
    /// Hex digest used as shared randomness.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// SHA-256 of `input`, rendered as lowercase hex.
pub fn sha256_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

fn beacon_round(input: &str) -> String {
    hex::encode_upper(Sha256::digest(input.as_bytes()))
}

/// Hashes `seed` repeatedly, `hash_rounds + 1` times in total.
///
/// ```
/// use hashuffle::beacon::{iterate_hash, sha256_hex};
///
/// assert_eq!(iterate_hash("abc", 0), sha256_hex(b"abc").to_uppercase());
/// ```
pub fn iterate_hash(seed: &str, hash_rounds: u32) -> String {
    let mut value = beacon_round(seed);
    for _ in 0..hash_rounds {
        value = beacon_round(&value);
    }
    value
}

/// Position of the draw block within a run that starts right after
/// `current_block_height`.
pub fn draw_block_index(
    draw_block_height: u64,
    current_block_height: u64,
    available: usize,
) -> Result<usize, BeaconError> {
    let out_of_range = || BeaconError::IndexOutOfRange {
        draw_block_height,
        current_block_height,
        available,
    };
    let offset = draw_block_height
        .checked_sub(current_block_height)
        .and_then(|gap| gap.checked_sub(1))
        .ok_or_else(out_of_range)?;
    let index = usize::try_from(offset).map_err(|_| out_of_range())?;
    if index >= available {
        return Err(out_of_range());
    }
    Ok(index)
}

/// Selects the draw block from `headers` and derives the beacon from it.
pub fn derive_beacon(
    headers: &[BlockHeader],
    draw_block_height: u64,
    current_block_height: u64,
    hash_rounds: u32,
) -> Result<Beacon, BeaconError> {
    let index = draw_block_index(draw_block_height, current_block_height, headers.len())?;
    let draw_block = headers[index].hash;
    Ok(Beacon {
        draw_block,
        value: iterate_hash(&draw_block.to_display_hex(), hash_rounds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{mainnet_headers, REFERENCE_DRAW_HASH};
    use proptest::prelude::*;

    #[test]
    fn sha256_hex_matches_known_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn zero_rounds_still_hashes_once() {
        assert_eq!(
            iterate_hash(REFERENCE_DRAW_HASH, 0),
            "508E761C43C70113B51403F7B19C47689920CCF50E119EA04D3EE767A9978B34"
        );
        assert_eq!(
            iterate_hash(REFERENCE_DRAW_HASH, 1),
            "71095AF8C9D020DE75DB8C6758A3549480B52093EAEBC7C359F081E6CC637AF1"
        );
        assert_eq!(
            iterate_hash(REFERENCE_DRAW_HASH, 2),
            "605C41F6002729702EF5FB1BBD11B9F1067E73351B771EE62BF7AF7B245F0604"
        );
    }

    #[test]
    fn rounds_hash_the_uppercase_text() {
        // Only the seed is lowercase; later rounds consume uppercase digests.
        let first = iterate_hash(REFERENCE_DRAW_HASH, 0);
        assert_eq!(first, first.to_uppercase());
        assert_eq!(
            iterate_hash(REFERENCE_DRAW_HASH, 1),
            sha256_hex(first.as_bytes()).to_uppercase()
        );
        assert_ne!(
            iterate_hash(REFERENCE_DRAW_HASH, 1),
            sha256_hex(first.to_lowercase().as_bytes()).to_uppercase()
        );
        assert_ne!(
            iterate_hash(REFERENCE_DRAW_HASH, 0),
            iterate_hash(&REFERENCE_DRAW_HASH.to_uppercase(), 0)
        );
    }

    #[test]
    fn derives_from_the_draw_block() {
        let headers = mainnet_headers();
        // Reference block is genesis (height 0); draw block is height 1.
        let beacon = derive_beacon(&headers[1..], 1, 0, 0).unwrap();
        assert_eq!(beacon.draw_block, headers[1].hash);
        assert_eq!(
            beacon.as_str(),
            "4C8977D0CBCF030914CBA262E0C317CFB7F36877C006E606BD71A5FAED17737C"
        );
        let later = derive_beacon(&headers[1..], 2, 0, 0).unwrap();
        assert_eq!(later.draw_block, headers[2].hash);
        assert_eq!(
            later.as_str(),
            "E59CC3FCCC2BB7D01E5D23335CA6F9D2AF4FE846A1C301D78BE310DE1CF89762"
        );
    }

    #[test]
    fn rejects_index_outside_run() {
        let headers = mainnet_headers();
        assert_eq!(
            derive_beacon(&headers[1..], 4, 0, 0),
            Err(BeaconError::IndexOutOfRange {
                draw_block_height: 4,
                current_block_height: 0,
                available: 3,
            })
        );
        assert!(derive_beacon(&headers[1..], 0, 0, 0).is_err());
        assert!(derive_beacon(&headers[1..], 5, 10, 0).is_err());
        assert!(derive_beacon(&[], 1, 0, 0).is_err());
    }

    proptest! {
        #[test]
        fn beacon_is_deterministic_and_round_sensitive(seed in "[0-9a-f]{64}", rounds in 0u32..16) {
            let first = iterate_hash(&seed, rounds);
            prop_assert_eq!(&first, &iterate_hash(&seed, rounds));
            prop_assert_ne!(&first, &iterate_hash(&seed, rounds + 1));
            prop_assert_eq!(first.len(), 64);
            prop_assert!(!first.bytes().any(|b| b.is_ascii_lowercase()));
        }
    }
}
