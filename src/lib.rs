#![deny(missing_docs)]

//! # hashuffle
//!
//! **hashuffle** verifies lottery draws whose randomness comes from Bitcoin's
//! proof-of-work chain.  A draw pins a known block, a future draw height and a
//! number of confirmations; once those blocks exist anyone holding the
//! headers can recompute the winner, and nobody can bias it without mining.
//!
//! The verification pipeline is split into small, pure modules:
//!
//! * [`header`]: 80-byte header codec and double-SHA-256 block ids.
//! * [`pow`]: compact difficulty bits and the proof-of-work check.
//! * [`chain`]: linkage and difficulty walk over a candidate header run.
//! * [`beacon`]: iterated SHA-256 beacon seeded by the draw block.
//! * [`score`]: per-ticket scores and stable ranking.
//! * [`draw`]: the draw state and [`resolve`], which names the winner.
//! * [`setup`]: invariants a draw must satisfy before it is created.
//! * [`contract`]: command dispatch for a ledger that stores draw states.
//!
//! [`schema`] and [`blocks`] read draw documents and candidate headers from
//! disk for the `hashuffle` binary.
//!
//! ## Usage
//!
//! ```rust
//! use hashuffle::{resolve, BlockHash, DrawState, PartyName, ReferenceBlock};
//!
//! let genesis: BlockHash = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
//!     .parse()
//!     .unwrap();
//! let state = DrawState::with_parties(
//!     ReferenceBlock { hash: genesis, height: 0, difficulty_target: 0x1d00_ffff },
//!     1,
//!     2,
//!     0,
//!     ["PartyA", "PartyB", "PartyC"].map(PartyName::from),
//! );
//! let blocks = [
//!     "010000006fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000982051fd1e4ba744bbbe680e1fee14677ba1a3c3540bf7b1cdb606e857233e0e61bc6649ffff001d01e36299",
//!     "010000004860eb18bf1b1620e37e9490fc8a427514416fd75159ab86688e9a8300000000d5fdcc541e25de1c7a5addedf24858b8bb665c9f36ef744ee42c316022c90f9bb0bc6649ffff001d08d2bd61",
//!     "01000000bddd99ccfda39da1b108ce1a5d70038d0a967bacb68b6b63065f626a0000000044f672226090d85db9a9f2fbfe5f0f9609b387af7be5b7fbb7a1767c831c9e995dbe6649ffff001d05e0ed6d",
//! ]
//! .map(|raw| hex::decode(raw).unwrap());
//!
//! let winner = resolve(&state, &blocks, &PartyName::from("PartyB")).unwrap();
//! assert_eq!(winner.participant.ticket_id, 1);
//! ```

pub mod beacon;
pub mod blocks;
pub mod chain;
pub mod contract;
pub mod draw;
#[cfg(test)]
mod fixtures;
pub mod header;
pub mod pow;
pub mod schema;
pub mod score;
pub mod setup;

pub use beacon::{derive_beacon, iterate_hash, Beacon, BeaconError};
pub use blocks::{load_candidates, BlockFileError};
pub use chain::{is_chain_valid, validate_chain, ChainError};
pub use contract::{verify, CommandError, DrawCommand, Verdict};
pub use draw::{
    rank_draw, resolve, DrawError, DrawOutcome, DrawState, Participant, PartyName, ReferenceBlock,
    Winner,
};
pub use header::{BlockHash, BlockHeader, HeaderError};
pub use schema::{load_draw, write_draw, DocumentError, DrawJson, DRAW_SCHEMA};
pub use score::{rank, score_participants, ticket_score, ScoredParticipant};
pub use setup::{validate_setup, SetupError};
