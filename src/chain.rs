//! Header-chain verification against a known starting block.
//!
//! A candidate run is accepted only if every header, in order, carries valid
//! proof-of-work, declares exactly the reference difficulty bits, and names
//! the previous block (the starting block for the first header) as parent.
//! The first failing header rejects the whole run.

use crate::header::{BlockHash, BlockHeader};
use crate::pow;
use thiserror::Error;
use tracing::{debug, warn};

/// Reasons a header run fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("block {index} ({hash}) does not satisfy its proof-of-work target")]
    /// The header hash exceeds the target encoded by its bits.
    InvalidProofOfWork {
        /// Position within the run.
        index: usize,
        /// Offending block.
        hash: BlockHash,
    },
    #[error("block {index} ({hash}) declares bits {actual:#010x}, expected {expected:#010x}")]
    /// The header declares a different difficulty than the reference block.
    DifficultyMismatch {
        /// Position within the run.
        index: usize,
        /// Offending block.
        hash: BlockHash,
        /// Reference difficulty bits.
        expected: u32,
        /// Bits declared by the header.
        actual: u32,
    },
    #[error("block {index} ({hash}) points to {actual}, expected parent {expected}")]
    /// The header does not link to the preceding block.
    BrokenChainLink {
        /// Position within the run.
        index: usize,
        /// Offending block.
        hash: BlockHash,
        /// Hash the header should have named as parent.
        expected: BlockHash,
        /// Parent hash the header actually names.
        actual: BlockHash,
    },
}

/// Verifies that `headers` extend `starting_hash` under a fixed difficulty.
pub fn validate_chain(
    starting_hash: &BlockHash,
    difficulty_target: u32,
    headers: &[BlockHeader],
) -> Result<(), ChainError> {
    let mut previous = *starting_hash;
    for (index, header) in headers.iter().enumerate() {
        if !pow::is_valid(header) {
            warn!(index, hash = %header.hash, "block fails proof-of-work");
            return Err(ChainError::InvalidProofOfWork {
                index,
                hash: header.hash,
            });
        }
        if header.bits != difficulty_target {
            warn!(
                index,
                hash = %header.hash,
                bits = header.bits,
                expected = difficulty_target,
                "block difficulty differs from reference"
            );
            return Err(ChainError::DifficultyMismatch {
                index,
                hash: header.hash,
                expected: difficulty_target,
                actual: header.bits,
            });
        }
        if header.prev_hash != previous {
            warn!(index, hash = %header.hash, parent = %previous, "block does not link to parent");
            return Err(ChainError::BrokenChainLink {
                index,
                hash: header.hash,
                expected: previous,
                actual: header.prev_hash,
            });
        }
        debug!(index, hash = %header.hash, parent = %previous, "verified block");
        previous = header.hash;
    }
    Ok(())
}

/// Boolean form of [`validate_chain`].
pub fn is_chain_valid(
    starting_hash: &BlockHash,
    difficulty_target: u32,
    headers: &[BlockHeader],
) -> bool {
    validate_chain(starting_hash, difficulty_target, headers).is_ok()
}
