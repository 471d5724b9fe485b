//! Proof-of-work validation for single headers.
//!
//! The compact `nBits` encoding packs a 256-bit threshold into one exponent
//! byte and a 23-bit mantissa: `target = mantissa * 256^(exponent - 3)`.  Bit
//! 23 of the mantissa is a sign flag; a negative or zero target can never be
//! met.  A header is valid when its hash, read as an unsigned big-endian
//! integer in display order, does not exceed the target.

use crate::header::{BlockHash, BlockHeader};
use num_bigint::BigUint;
use num_traits::Zero;

const MANTISSA_MASK: u32 = 0x007f_ffff;
const SIGN_FLAG: u32 = 0x0080_0000;

/// Expands compact difficulty bits into the full target.
///
/// Returns `None` for targets that encode a negative number or zero.
///
/// ```
/// use hashuffle::pow::compact_to_target;
///
/// let target = compact_to_target(0x1d00_ffff).unwrap();
/// assert_eq!(target.bits(), 224);
/// assert!(compact_to_target(0x0400_0000).is_none());
/// ```
pub fn compact_to_target(bits: u32) -> Option<BigUint> {
    let exponent = bits >> 24;
    let mantissa = bits & MANTISSA_MASK;
    if mantissa != 0 && bits & SIGN_FLAG != 0 {
        return None;
    }
    let target = if exponent <= 3 {
        BigUint::from(mantissa >> (8 * (3 - exponent)))
    } else {
        BigUint::from(mantissa) << (8 * (exponent - 3) as usize)
    };
    if target.is_zero() {
        None
    } else {
        Some(target)
    }
}

/// Interprets a block hash as an unsigned integer (display order, big-endian).
pub fn hash_to_integer(hash: &BlockHash) -> BigUint {
    BigUint::from_bytes_le(hash.as_wire_bytes())
}

/// Returns `true` if `hash` satisfies the target encoded by `bits`.
pub fn meets_target(hash: &BlockHash, bits: u32) -> bool {
    match compact_to_target(bits) {
        Some(target) => hash_to_integer(hash) <= target,
        None => false,
    }
}

/// Checks that the header's hash satisfies its own declared difficulty.
pub fn is_valid(header: &BlockHeader) -> bool {
    meets_target(&header.hash, header.bits)
}
