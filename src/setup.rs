//! Setup-time invariants for a proposed draw.

use crate::draw::DrawState;
use thiserror::Error;

/// Invariant violations in a proposed draw state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("a draw needs at least one participant")]
    /// No participants were registered.
    EmptyParticipantSet,
    #[error("draw block {draw_block_height} is not above current block {current_block_height}")]
    /// The draw block is not strictly after the reference block.
    DrawBlockNotInFuture {
        /// Proposed draw block height.
        draw_block_height: u64,
        /// Height of the reference block.
        current_block_height: u64,
    },
    #[error(
        "draw block {draw_block_height} plus {number_of_blocks_for_verification} confirmations overflows the block height"
    )]
    /// The last confirmation height does not fit in a `u64`.
    VerificationWindowOverflow {
        /// Proposed draw block height.
        draw_block_height: u64,
        /// Confirmations required after the draw block.
        number_of_blocks_for_verification: u64,
    },
}

/// Checks a proposed state before any signatures are collected.
pub fn validate_setup<P>(state: &DrawState<P>) -> Result<(), SetupError> {
    if state.participants.is_empty() {
        return Err(SetupError::EmptyParticipantSet);
    }
    if state.draw_block_height <= state.current_block.height {
        return Err(SetupError::DrawBlockNotInFuture {
            draw_block_height: state.draw_block_height,
            current_block_height: state.current_block.height,
        });
    }
    if state.last_block_height().is_none() {
        return Err(SetupError::VerificationWindowOverflow {
            draw_block_height: state.draw_block_height,
            number_of_blocks_for_verification: state.number_of_blocks_for_verification,
        });
    }
    Ok(())
}
