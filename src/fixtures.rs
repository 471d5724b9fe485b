//! Shared test fixtures: early mainnet headers and a tiny regtest-style miner.

use crate::draw::{DrawState, PartyName, ReferenceBlock};
use crate::header::{BlockHash, BlockHeader};
use crate::pow;

/// Mainnet headers for heights 0 through 3.
pub const MAINNET_HEADERS: [&str; 4] = [
    "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c",
    "010000006fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000982051fd1e4ba744bbbe680e1fee14677ba1a3c3540bf7b1cdb606e857233e0e61bc6649ffff001d01e36299",
    "010000004860eb18bf1b1620e37e9490fc8a427514416fd75159ab86688e9a8300000000d5fdcc541e25de1c7a5addedf24858b8bb665c9f36ef744ee42c316022c90f9bb0bc6649ffff001d08d2bd61",
    "01000000bddd99ccfda39da1b108ce1a5d70038d0a967bacb68b6b63065f626a0000000044f672226090d85db9a9f2fbfe5f0f9609b387af7be5b7fbb7a1767c831c9e995dbe6649ffff001d05e0ed6d",
];

/// Hash of the mainnet genesis block.
pub const GENESIS_HASH: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

/// Hash of mainnet block 564943.
pub const REFERENCE_DRAW_HASH: &str =
    "000000000000000000133629449fa3c77646df4694a5dd26a165a1719999f88b";

/// Reference block height of the mainnet 564943 draw.
pub const REFERENCE_CURRENT_HEIGHT: u64 = 564_939;

/// Height of the block that seeds the mainnet 564943 draw.
pub const REFERENCE_DRAW_HEIGHT: u64 = 564_943;

/// Confirmations required after block 564943.
pub const REFERENCE_CONFIRMATIONS: u64 = 5;

/// Minimum mainnet difficulty, declared by the earliest blocks.
pub const MAINNET_BITS: u32 = 0x1d00_ffff;

/// Regtest difficulty; roughly every second nonce qualifies.
pub const EASY_BITS: u32 = 0x207f_ffff;

/// [`MAINNET_HEADERS`] as raw 80-byte buffers.
pub fn mainnet_header_bytes() -> Vec<Vec<u8>> {
    MAINNET_HEADERS
        .iter()
        .map(|raw| hex::decode(raw).unwrap())
        .collect()
}

/// [`MAINNET_HEADERS`] decoded.
pub fn mainnet_headers() -> Vec<BlockHeader> {
    MAINNET_HEADERS
        .iter()
        .map(|raw| BlockHeader::from_hex(raw).unwrap())
        .collect()
}

/// Genesis-anchored draw: block 1 seeds the beacon, blocks 2 and 3 confirm it.
pub fn genesis_draw(hash_rounds: u32) -> DrawState<PartyName> {
    DrawState::with_parties(
        ReferenceBlock {
            hash: GENESIS_HASH.parse().unwrap(),
            height: 0,
            difficulty_target: MAINNET_BITS,
        },
        1,
        2,
        hash_rounds,
        ["PartyA", "PartyB", "PartyC"].map(PartyName::from),
    )
}

/// Three-party draw with the 564939/564943/5 window, anchored at `anchor`.
pub fn reference_draw(anchor: BlockHash, bits: u32, hash_rounds: u32) -> DrawState<PartyName> {
    DrawState::with_parties(
        ReferenceBlock {
            hash: anchor,
            height: REFERENCE_CURRENT_HEIGHT,
            difficulty_target: bits,
        },
        REFERENCE_DRAW_HEIGHT,
        REFERENCE_CONFIRMATIONS,
        hash_rounds,
        ["PartyA", "PartyB", "PartyC"].map(PartyName::from),
    )
}

/// Mines `count` linked headers on top of `start`.
pub fn mine_chain(start: BlockHash, bits: u32, count: usize) -> Vec<BlockHeader> {
    let mut previous = start;
    let mut out = Vec::with_capacity(count);
    for height in 0..count {
        let mut merkle_root = [0u8; 32];
        merkle_root[0] = height as u8;
        let mut candidate = BlockHeader {
            version: 0x2000_0000,
            prev_hash: previous,
            merkle_root,
            time: 1_600_000_000 + height as u32,
            bits,
            nonce: 0,
            hash: BlockHash::ZERO,
        };
        let header = loop {
            let decoded = BlockHeader::decode(&candidate.encode()).unwrap();
            if pow::is_valid(&decoded) {
                break decoded;
            }
            candidate.nonce += 1;
        };
        previous = header.hash;
        out.push(header);
    }
    out
}

/// [`mine_chain`] serialized for the draw entry points.
pub fn mine_chain_bytes(start: BlockHash, bits: u32, count: usize) -> Vec<Vec<u8>> {
    mine_chain(start, bits, count)
        .iter()
        .map(|header| header.encode().to_vec())
        .collect()
}
