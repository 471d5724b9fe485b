//! Command-line front end for verifying Bitcoin-seeded draws.
//!
//! Draw parameters live in a `hashuffle.draw.v1` JSON document; candidate
//! headers come from a hex listing or a directory of `blocks_<height>.dat`
//! files.  Every command prints JSON on stdout and exits 1 on failure.

use clap::{Args, Parser, Subcommand};
use hashuffle::beacon::iterate_hash;
use hashuffle::header::BlockHeader;
use hashuffle::pow;
use hashuffle::{
    load_candidates, load_draw, rank_draw, verify, write_draw, BlockHash, DrawCommand, DrawState,
    PartyName, ReferenceBlock, Verdict,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hashuffle", version, about = "Verify Bitcoin-seeded lottery draws")]
struct Cli {
    /// Log verification steps to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a new draw document with sequential tickets
    Init(InitArgs),
    /// Check a draw document against the setup rules
    Setup {
        /// Draw document
        state: PathBuf,
    },
    /// Resolve a draw for a claimant
    Draw {
        #[command(flatten)]
        input: DrawInput,
        /// Party claiming the win
        #[arg(long)]
        claimant: String,
    },
    /// Verify the candidate run and print every participant's rank
    Rank {
        #[command(flatten)]
        input: DrawInput,
    },
    /// Decode a serialized block header
    Header {
        /// Hex-encoded 80-byte header
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        hex: Option<String>,
        /// Read the header from a block file instead
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Derive a beacon from a block hash
    Beacon {
        /// Display-order block hash
        #[arg(long)]
        hash: BlockHash,
        /// Extra hash rounds
        #[arg(long, default_value_t = 0)]
        rounds: u32,
    },
}

#[derive(Args)]
struct InitArgs {
    /// Output path for the draw document
    #[arg(short, long)]
    output: PathBuf,
    /// Hash of the reference block
    #[arg(long)]
    current_hash: BlockHash,
    /// Height of the reference block
    #[arg(long)]
    current_height: u64,
    /// Compact difficulty bits of the reference block (decimal or 0x-prefixed)
    #[arg(long, value_parser = parse_bits)]
    bits: u32,
    /// Height of the block whose hash seeds the beacon
    #[arg(long)]
    draw_height: u64,
    /// Confirmations required after the draw block
    #[arg(long, default_value_t = 6)]
    confirmations: u64,
    /// Extra beacon hash rounds
    #[arg(long, default_value_t = 0)]
    rounds: u32,
    /// Participants in ticket order, organiser first
    #[arg(long = "party", required = true)]
    parties: Vec<String>,
}

#[derive(Args)]
struct DrawInput {
    /// Draw document
    #[arg(long)]
    state: PathBuf,
    /// Hex listing or directory of blocks_<height>.dat files
    #[arg(long, env = "HASHUFFLE_BLOCKS")]
    blocks: PathBuf,
}

fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn parse_bits(input: &str) -> Result<u32, String> {
    let parsed = match input.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|err| format!("invalid compact bits {input:?}: {err}"))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "hashuffle=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => fatal(&format!("failed to encode output: {err}")),
    }
}

fn load_state(path: &Path) -> DrawState {
    load_draw(path).unwrap_or_else(|err| fatal(&err.to_string()))
}

fn load_blocks(path: &Path, state: &DrawState) -> Vec<Vec<u8>> {
    let blocks = load_candidates(path, state).unwrap_or_else(|err| fatal(&err.to_string()));
    debug!(count = blocks.len(), source = %path.display(), "loaded candidate blocks");
    blocks
}

fn header_json(header: &BlockHeader) -> Value {
    json!({
        "hash": header.hash,
        "version": header.version,
        "prev_hash": header.prev_hash,
        "merkle_root": BlockHash::from_wire_bytes(header.merkle_root),
        "time": header.time,
        "bits": format!("0x{:08x}", header.bits),
        "nonce": header.nonce,
        "target": pow::compact_to_target(header.bits).map(|t| format!("{t:064x}")),
        "proof_of_work_valid": pow::is_valid(header),
    })
}

fn run_init(args: InitArgs) {
    let state = DrawState::with_parties(
        ReferenceBlock {
            hash: args.current_hash,
            height: args.current_height,
            difficulty_target: args.bits,
        },
        args.draw_height,
        args.confirmations,
        args.rounds,
        args.parties.into_iter().map(PartyName::from),
    );
    if let Err(err) = verify(&state, &DrawCommand::Setup) {
        fatal(&err.to_string());
    }
    let path = write_draw(&args.output, &state).unwrap_or_else(|err| fatal(&err.to_string()));
    print_json(&json!({
        "written": path.display().to_string(),
        "expected_block_count": state.expected_block_count(),
    }));
}

fn run_setup(path: &Path) {
    let state = load_state(path);
    match verify(&state, &DrawCommand::Setup) {
        Ok(_) => print_json(&json!({
            "verdict": "setup_accepted",
            "participants": state.participants.len(),
            "expected_block_count": state.expected_block_count(),
            "last_block_height": state.last_block_height(),
        })),
        Err(err) => fatal(&err.to_string()),
    }
}

fn run_draw(input: &DrawInput, claimant: String) {
    let state = load_state(&input.state);
    let blocks = load_blocks(&input.blocks, &state);
    let command = DrawCommand::PerformDraw {
        blocks,
        claimant: PartyName::from(claimant),
    };
    match verify(&state, &command) {
        Ok(Verdict::DrawWon(winner)) => print_json(&json!({
            "verdict": "draw_won",
            "party": winner.participant.party,
            "ticket_id": winner.participant.ticket_id,
            "score": winner.score.to_string(),
            "draw_block": winner.beacon.draw_block,
            "beacon": winner.beacon.value,
        })),
        Ok(Verdict::SetupAccepted) => fatal("unexpected setup verdict for a draw command"),
        Err(err) => fatal(&err.to_string()),
    }
}

fn run_rank(input: &DrawInput) {
    let state = load_state(&input.state);
    let blocks = load_blocks(&input.blocks, &state);
    let outcome = rank_draw(&state, &blocks).unwrap_or_else(|err| fatal(&err.to_string()));
    let ranking: Vec<Value> = outcome
        .ranking
        .iter()
        .map(|scored| {
            json!({
                "party": scored.participant.party,
                "ticket_id": scored.participant.ticket_id,
                "score": scored.score.to_string(),
            })
        })
        .collect();
    print_json(&json!({
        "draw_block": outcome.beacon.draw_block,
        "beacon": outcome.beacon.value,
        "winner": outcome.winner().map(|w| w.participant.party.as_str()),
        "ranking": ranking,
    }));
}

fn run_header(hex_input: Option<String>, file: Option<PathBuf>) {
    let bytes = match (hex_input, file) {
        (Some(text), _) => {
            hex::decode(text.trim()).unwrap_or_else(|err| fatal(&format!("invalid hex: {err}")))
        }
        (None, Some(path)) => {
            let raw = fs::read(&path)
                .unwrap_or_else(|err| fatal(&format!("{}: {err}", path.display())));
            hashuffle::blocks::extract_header(&raw).unwrap_or_else(|err| fatal(&err.to_string()))
        }
        (None, None) => fatal("header: supply a hex header or --file"),
    };
    let header = BlockHeader::decode(&bytes).unwrap_or_else(|err| fatal(&err.to_string()));
    print_json(&header_json(&header));
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Init(args) => run_init(args),
        Command::Setup { state } => run_setup(&state),
        Command::Draw { input, claimant } => run_draw(&input, claimant),
        Command::Rank { input } => run_rank(&input),
        Command::Header { hex, file } => run_header(hex, file),
        Command::Beacon { hash, rounds } => print_json(&json!({
            "draw_block": hash,
            "rounds": rounds,
            "beacon": iterate_hash(&hash.to_display_hex(), rounds),
        })),
    }
}
