//! Command dispatch for the ledger layer.
//!
//! The ledger submits either a setup proposal or a draw claim against a
//! state; [`verify`] routes each to the matching pure check and reports a
//! single verdict.  Signature collection, notarisation and spending the state
//! stay with the caller.

use crate::draw::{resolve, DrawError, DrawState, Winner};
use crate::setup::{validate_setup, SetupError};
use thiserror::Error;

/// Command attached to a draw transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand<P> {
    /// A new draw is being created.
    Setup,
    /// `claimant` submits raw candidate headers to finalise the draw.
    PerformDraw {
        /// Serialized 80-byte headers following the reference block.
        blocks: Vec<Vec<u8>>,
        /// Party attempting to claim the outcome.
        claimant: P,
    },
}

/// Accepted command outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<P> {
    /// The proposed state satisfies every setup invariant.
    SetupAccepted,
    /// The claimant won the draw.
    DrawWon(Winner<P>),
}

/// Rejected command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("setup rejected: {0}")]
    /// Setup invariants failed.
    Setup(#[from] SetupError),
    #[error("draw rejected: {0}")]
    /// Draw resolution failed.
    Draw(#[from] DrawError),
}

/// Verifies `command` against `state`.
pub fn verify<P>(state: &DrawState<P>, command: &DrawCommand<P>) -> Result<Verdict<P>, CommandError>
where
    P: PartialEq + Clone + Sync,
{
    match command {
        DrawCommand::Setup => {
            validate_setup(state)?;
            Ok(Verdict::SetupAccepted)
        }
        DrawCommand::PerformDraw { blocks, claimant } => {
            let winner = resolve(state, blocks, claimant)?;
            Ok(Verdict::DrawWon(winner))
        }
    }
}
