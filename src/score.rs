//! Participant scoring and ranking.
//!
//! A participant's score is `SHA-256(decimal(ticket_id) ‖ beacon)` read as an
//! unsigned 256-bit integer.  Ranking sorts ascending and is stable, so among
//! equal scores the participant listed later ranks higher.

use crate::draw::Participant;
use num_bigint::BigUint;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
use sha2::{Digest, Sha256};

#[cfg(not(target_arch = "wasm32"))]
const PARALLEL_THRESHOLD: usize = 1 << 12;

/// Participant paired with the score computed for one beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredParticipant<'a, P> {
    /// Participant being scored.
    pub participant: &'a Participant<P>,
    /// Score derived from the participant's ticket and the beacon.
    pub score: BigUint,
}

/// Score for a bare ticket id.
///
/// ```
/// use hashuffle::score::ticket_score;
///
/// assert_eq!(ticket_score(7, "beacon"), ticket_score(7, "beacon"));
/// assert_ne!(ticket_score(7, "beacon"), ticket_score(8, "beacon"));
/// ```
pub fn ticket_score(ticket_id: u64, beacon: &str) -> BigUint {
    let mut hasher = Sha256::new();
    hasher.update(ticket_id.to_string().as_bytes());
    hasher.update(beacon.as_bytes());
    BigUint::from_bytes_be(&hasher.finalize())
}

/// Score for one participant.
pub fn score_of<P>(participant: &Participant<P>, beacon: &str) -> BigUint {
    ticket_score(participant.ticket_id, beacon)
}

/// Scores every participant, preserving input order.
pub fn score_participants<'a, P: Sync>(
    participants: &'a [Participant<P>],
    beacon: &str,
) -> Vec<ScoredParticipant<'a, P>> {
    let score = |participant: &'a Participant<P>| ScoredParticipant {
        participant,
        score: score_of(participant, beacon),
    };
    #[cfg(not(target_arch = "wasm32"))]
    {
        if participants.len() >= PARALLEL_THRESHOLD && rayon::current_num_threads() > 1 {
            return participants.par_iter().map(score).collect();
        }
    }
    participants.iter().map(score).collect()
}

/// Sorts ascending by score; equal scores keep their input order.
pub fn rank<P>(mut scored: Vec<ScoredParticipant<'_, P>>) -> Vec<ScoredParticipant<'_, P>> {
    scored.sort_by(|a, b| a.score.cmp(&b.score));
    scored
}
