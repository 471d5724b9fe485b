//! Draw state and winner resolution.
//!
//! A [`DrawState`] pins a reference Bitcoin block, the future height whose
//! hash seeds the beacon, how many confirmations must follow it, and the
//! ticketed participants.  [`resolve`] turns a claimant's candidate header run
//! into a verdict:
//!
//! 1. the run length must equal `draw_height + confirmations - current_height`;
//! 2. every buffer must decode as an 80-byte header;
//! 3. the run must extend the reference block under its difficulty;
//! 4. the draw block's hash seeds the beacon;
//! 5. every participant is scored and ranked ascending, stably;
//! 6. the last-ranked participant wins, and only the winner may claim.
//!
//! Nothing here mutates the state.  Marking a draw as consumed belongs to the
//! ledger layer and must only follow an `Ok` verdict.

use crate::beacon::{derive_beacon, Beacon, BeaconError};
use crate::chain::{validate_chain, ChainError};
use crate::header::{BlockHash, BlockHeader, HeaderError};
use crate::score::{rank, score_participants, ScoredParticipant};
use crate::setup::{validate_setup, SetupError};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Human-readable party identifier used by the CLI and JSON documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyName(String);

impl PartyName {
    /// Name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PartyName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PartyName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// A party holding one ticket in a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant<P = PartyName> {
    /// Identity checked against the claimant.
    pub party: P,
    /// Ticket number mixed into the score.
    pub ticket_id: u64,
}

impl<P> Participant<P> {
    /// Creates a participant.
    pub fn new(party: P, ticket_id: u64) -> Self {
        Self { party, ticket_id }
    }
}

/// Bitcoin block the candidate run must extend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceBlock {
    /// Hash of the reference block.
    pub hash: BlockHash,
    /// Height of the reference block.
    pub height: u64,
    /// Compact difficulty bits every candidate header must declare.
    pub difficulty_target: u32,
}

/// Parameters and participants of one draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawState<P = PartyName> {
    /// Block the candidate run starts from.
    pub current_block: ReferenceBlock,
    /// Height of the block whose hash seeds the beacon.
    pub draw_block_height: u64,
    /// Blocks required on top of the draw block.
    pub number_of_blocks_for_verification: u64,
    /// Extra SHA-256 rounds applied when deriving the beacon.
    pub number_of_hash_rounds: u32,
    /// Ticketed participants in registration order.
    pub participants: Vec<Participant<P>>,
}

impl<P> DrawState<P> {
    /// Builds a state whose tickets are `0..n` in the order `parties` are given.
    ///
    /// By convention the organiser comes first and holds ticket 0.
    pub fn with_parties<I>(
        current_block: ReferenceBlock,
        draw_block_height: u64,
        number_of_blocks_for_verification: u64,
        number_of_hash_rounds: u32,
        parties: I,
    ) -> Self
    where
        I: IntoIterator<Item = P>,
    {
        let participants = parties
            .into_iter()
            .enumerate()
            .map(|(ticket, party)| Participant::new(party, ticket as u64))
            .collect();
        Self {
            current_block,
            draw_block_height,
            number_of_blocks_for_verification,
            number_of_hash_rounds,
            participants,
        }
    }

    /// Number of headers a claimant must supply, or `None` if the window is
    /// empty or negative.
    pub fn expected_block_count(&self) -> Option<u64> {
        self.draw_block_height
            .checked_add(self.number_of_blocks_for_verification)?
            .checked_sub(self.current_block.height)
            .filter(|count| *count > 0)
    }

    /// Height of the last header in a complete candidate run.
    pub fn last_block_height(&self) -> Option<u64> {
        self.draw_block_height
            .checked_add(self.number_of_blocks_for_verification)
    }
}

/// Participant that won a draw, with the evidence for the win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner<P = PartyName> {
    /// Winning participant.
    pub participant: Participant<P>,
    /// Winning score.
    pub score: BigUint,
    /// Beacon the scores were derived from.
    pub beacon: Beacon,
}

/// Full ranking for a verified candidate run.
#[derive(Debug, Clone)]
pub struct DrawOutcome<'a, P> {
    /// Beacon derived from the draw block.
    pub beacon: Beacon,
    /// Participants sorted ascending by score.
    pub ranking: Vec<ScoredParticipant<'a, P>>,
}

impl<'a, P> DrawOutcome<'a, P> {
    /// Highest-ranked participant.
    pub fn winner(&self) -> Option<&ScoredParticipant<'a, P>> {
        self.ranking.last()
    }

    /// Pays out to `claimant` only if they hold the winning ticket.
    pub fn claim(self, claimant: &P) -> Result<Winner<P>, DrawError>
    where
        P: PartialEq + Clone,
    {
        let top = self
            .winner()
            .ok_or(DrawError::InvalidState(SetupError::EmptyParticipantSet))?;
        if top.participant.party != *claimant {
            return Err(DrawError::NotWinner {
                winning_ticket: top.participant.ticket_id,
            });
        }
        info!(
            ticket = top.participant.ticket_id,
            draw_block = %self.beacon.draw_block,
            "draw resolved"
        );
        let participant = top.participant.clone();
        let score = top.score.clone();
        Ok(Winner {
            participant,
            score,
            beacon: self.beacon,
        })
    }
}

/// Reasons a draw resolution attempt is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("draw state is invalid: {0}")]
    /// The state violates a setup invariant and cannot be resolved.
    InvalidState(#[from] SetupError),
    #[error("expected {expected} candidate blocks, got {actual}")]
    /// The candidate run does not cover the state's window.
    WrongBlockCount {
        /// Required number of headers.
        expected: u64,
        /// Supplied number of headers.
        actual: usize,
    },
    #[error("candidate block {index} is malformed: {source}")]
    /// A candidate buffer is not a serialized header.
    MalformedHeader {
        /// Position within the run.
        index: usize,
        /// Decoding failure.
        #[source]
        source: HeaderError,
    },
    #[error("blockchain is invalid: {0}")]
    /// The candidate run does not extend the reference block.
    InvalidBlockchain(#[from] ChainError),
    #[error(transparent)]
    /// The draw block lies outside the candidate run.
    IndexOutOfRange(#[from] BeaconError),
    #[error("claimant is not the winner (winning ticket {winning_ticket})")]
    /// Someone other than the winner attempted to claim.
    NotWinner {
        /// Ticket that actually won.
        winning_ticket: u64,
    },
}

fn decode_candidates<B: AsRef<[u8]>>(candidate_blocks: &[B]) -> Result<Vec<BlockHeader>, DrawError> {
    candidate_blocks
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            BlockHeader::decode(raw.as_ref())
                .map_err(|source| DrawError::MalformedHeader { index, source })
        })
        .collect()
}

/// Verifies a candidate run and ranks every participant, without a claimant.
pub fn rank_draw<'a, P, B>(
    state: &'a DrawState<P>,
    candidate_blocks: &[B],
) -> Result<DrawOutcome<'a, P>, DrawError>
where
    P: Sync,
    B: AsRef<[u8]>,
{
    validate_setup(state)?;
    let expected = state.expected_block_count().ok_or(DrawError::InvalidState(
        SetupError::VerificationWindowOverflow {
            draw_block_height: state.draw_block_height,
            number_of_blocks_for_verification: state.number_of_blocks_for_verification,
        },
    ))?;
    if candidate_blocks.len() as u64 != expected {
        return Err(DrawError::WrongBlockCount {
            expected,
            actual: candidate_blocks.len(),
        });
    }
    let headers = decode_candidates(candidate_blocks)?;
    validate_chain(
        &state.current_block.hash,
        state.current_block.difficulty_target,
        &headers,
    )?;
    let beacon = derive_beacon(
        &headers,
        state.draw_block_height,
        state.current_block.height,
        state.number_of_hash_rounds,
    )?;
    debug!(draw_block = %beacon.draw_block, beacon = %beacon.value, "derived beacon");
    Ok(rank_with_beacon(state, beacon))
}

fn rank_with_beacon<P: Sync>(state: &DrawState<P>, beacon: Beacon) -> DrawOutcome<'_, P> {
    let ranking = rank(score_participants(&state.participants, beacon.as_str()));
    DrawOutcome { beacon, ranking }
}

/// Resolves a draw for `claimant`.
///
/// Returns the winner only when `claimant` is the winning party; every other
/// outcome is a rejection that leaves the state untouched.
pub fn resolve<P, B>(
    state: &DrawState<P>,
    candidate_blocks: &[B],
    claimant: &P,
) -> Result<Winner<P>, DrawError>
where
    P: PartialEq + Clone + Sync,
    B: AsRef<[u8]>,
{
    rank_draw(state, candidate_blocks)?.claim(claimant)
}
