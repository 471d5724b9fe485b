//! Replays a draw anchored at the Bitcoin genesis block.
//!
//! Block 1 seeds the beacon and blocks 2 and 3 confirm it.  The demo ranks
//! all three parties, lets each one try to claim, then repeats the draw with
//! one extra hash round to show how the beacon reshuffles the order.

use hashuffle::{rank_draw, resolve, BlockHash, DrawState, PartyName, ReferenceBlock};

const CANDIDATES: [&str; 3] = [
    "010000006fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000982051fd1e4ba744bbbe680e1fee14677ba1a3c3540bf7b1cdb606e857233e0e61bc6649ffff001d01e36299",
    "010000004860eb18bf1b1620e37e9490fc8a427514416fd75159ab86688e9a8300000000d5fdcc541e25de1c7a5addedf24858b8bb665c9f36ef744ee42c316022c90f9bb0bc6649ffff001d08d2bd61",
    "01000000bddd99ccfda39da1b108ce1a5d70038d0a967bacb68b6b63065f626a0000000044f672226090d85db9a9f2fbfe5f0f9609b387af7be5b7fbb7a1767c831c9e995dbe6649ffff001d05e0ed6d",
];

fn draw(genesis: BlockHash, hash_rounds: u32) -> DrawState {
    DrawState::with_parties(
        ReferenceBlock {
            hash: genesis,
            height: 0,
            difficulty_target: 0x1d00_ffff,
        },
        1,
        2,
        hash_rounds,
        ["PartyA", "PartyB", "PartyC"].map(PartyName::from),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let genesis: BlockHash =
        "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f".parse()?;
    let blocks = CANDIDATES
        .iter()
        .map(hex::decode)
        .collect::<Result<Vec<_>, _>>()?;

    for rounds in [0, 1] {
        let state = draw(genesis, rounds);
        let outcome = rank_draw(&state, &blocks)?;
        println!("hash rounds: {rounds}");
        println!("  draw block: {}", outcome.beacon.draw_block);
        println!("  beacon:     {}", outcome.beacon.value);
        for scored in &outcome.ranking {
            println!(
                "  ticket {} {:<7} score {}",
                scored.participant.ticket_id, scored.participant.party, scored.score
            );
        }
        for participant in &state.participants {
            match resolve(&state, &blocks, &participant.party) {
                Ok(winner) => println!(
                    "  {} claims: won with ticket {}",
                    participant.party, winner.participant.ticket_id
                ),
                Err(err) => println!("  {} claims: {err}", participant.party),
            }
        }
    }
    Ok(())
}
