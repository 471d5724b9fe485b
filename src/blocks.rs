//! Loading candidate headers from disk.
//!
//! Two layouts are understood:
//!
//! * a text listing with one hex-encoded header per line (`#` comments and
//!   blank lines are skipped);
//! * a directory of `blocks_<height>.dat` files, one per block.  Each file may
//!   hold a bare 80-byte header, a full serialized block, or a mainnet P2P
//!   message whose payload is a block.

use crate::draw::DrawState;
use crate::header::{double_sha256, HEADER_LEN};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Mainnet P2P message magic.
pub const MAINNET_MAGIC: [u8; 4] = [0xf9, 0xbe, 0xb4, 0xd9];

const ENVELOPE_LEN: usize = 24;
const BLOCK_COMMAND: &[u8] = b"block";

/// Errors raised while loading candidate headers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockFileError {
    #[error("block file I/O error: {0}")]
    /// Filesystem failure.
    Io(String),
    #[error("line {line}: invalid hex header: {reason}")]
    /// A listing line is not valid hex.
    Hex {
        /// One-based line number.
        line: usize,
        /// Decoder message.
        reason: String,
    },
    #[error("block data is {0} bytes, shorter than a header")]
    /// Fewer bytes than one header (or one envelope).
    Truncated(usize),
    #[error("message payload length {declared} does not match {actual} bytes present")]
    /// Envelope length field disagrees with the data.
    LengthMismatch {
        /// Length declared in the envelope.
        declared: usize,
        /// Payload bytes present.
        actual: usize,
    },
    #[error("message checksum mismatch")]
    /// Envelope checksum does not cover the payload.
    Checksum,
    #[error("message command {0:?} is not a block")]
    /// The envelope carries some other message.
    NotABlock(String),
    #[error("block window is empty or overflows")]
    /// The draw state describes no blocks to load.
    EmptyWindow,
}

/// Parses a text listing of hex-encoded headers.
pub fn parse_hex_listing(contents: &str) -> Result<Vec<Vec<u8>>, BlockFileError> {
    let mut out = Vec::new();
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let bytes = hex::decode(line).map_err(|err| BlockFileError::Hex {
            line: idx + 1,
            reason: err.to_string(),
        })?;
        out.push(bytes);
    }
    Ok(out)
}

/// Returns the 80 header bytes contained in `raw`.
///
/// Length problems in a bare header are left to the header decoder; only
/// envelopes and full blocks are unwrapped here.
pub fn extract_header(raw: &[u8]) -> Result<Vec<u8>, BlockFileError> {
    if raw.len() >= ENVELOPE_LEN && raw[..4] == MAINNET_MAGIC {
        return unwrap_envelope(raw);
    }
    if raw.len() > HEADER_LEN {
        return Ok(raw[..HEADER_LEN].to_vec());
    }
    Ok(raw.to_vec())
}

fn unwrap_envelope(raw: &[u8]) -> Result<Vec<u8>, BlockFileError> {
    let command: Vec<u8> = raw[4..16].iter().copied().take_while(|b| *b != 0).collect();
    if command != BLOCK_COMMAND {
        return Err(BlockFileError::NotABlock(
            String::from_utf8_lossy(&command).into_owned(),
        ));
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&raw[16..20]);
    let declared = u32::from_le_bytes(len_bytes) as usize;
    let payload = &raw[ENVELOPE_LEN..];
    if payload.len() != declared {
        return Err(BlockFileError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }
    if double_sha256(payload)[..4] != raw[20..24] {
        return Err(BlockFileError::Checksum);
    }
    if payload.len() < HEADER_LEN {
        return Err(BlockFileError::Truncated(payload.len()));
    }
    Ok(payload[..HEADER_LEN].to_vec())
}

/// Reads `blocks_<height>.dat` for every height in `from..=to`.
pub fn load_block_range(dir: &Path, from: u64, to: u64) -> Result<Vec<Vec<u8>>, BlockFileError> {
    let mut out = Vec::new();
    for height in from..=to {
        let path = dir.join(format!("blocks_{height}.dat"));
        let raw = fs::read(&path)
            .map_err(|err| BlockFileError::Io(format!("{}: {err}", path.display())))?;
        out.push(extract_header(&raw)?);
    }
    Ok(out)
}

/// Loads the candidate run for `state` from a directory or a hex listing.
///
/// A directory is read for the heights directly above the reference block up
/// to the last confirmation; any other path is treated as a listing.
pub fn load_candidates<P>(path: &Path, state: &DrawState<P>) -> Result<Vec<Vec<u8>>, BlockFileError> {
    if path.is_dir() {
        let from = state
            .current_block
            .height
            .checked_add(1)
            .ok_or(BlockFileError::EmptyWindow)?;
        let to = state.last_block_height().ok_or(BlockFileError::EmptyWindow)?;
        if to < from {
            return Err(BlockFileError::EmptyWindow);
        }
        return load_block_range(path, from, to);
    }
    let contents = fs::read_to_string(path)
        .map_err(|err| BlockFileError::Io(format!("{}: {err}", path.display())))?;
    parse_hex_listing(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{genesis_draw, mainnet_header_bytes, MAINNET_HEADERS};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("hashuffle_{tag}_{nanos}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn envelope(command: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut out = MAINNET_MAGIC.to_vec();
        let mut cmd = [0u8; 12];
        cmd[..command.len()].copy_from_slice(command);
        out.extend_from_slice(&cmd);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&double_sha256(payload)[..4]);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn listing_skips_comments_and_blanks() {
        let text = format!(
            "# candidate run\n{}\n\n  {}  \n",
            MAINNET_HEADERS[1], MAINNET_HEADERS[2]
        );
        let blocks = parse_hex_listing(&text).unwrap();
        assert_eq!(blocks, mainnet_header_bytes()[1..3].to_vec());
    }

    #[test]
    fn listing_reports_bad_line() {
        let text = format!("{}\nnot-hex\n", MAINNET_HEADERS[1]);
        assert!(matches!(
            parse_hex_listing(&text),
            Err(BlockFileError::Hex { line: 2, .. })
        ));
    }

    #[test]
    fn extracts_header_from_full_block_and_envelope() {
        let header = mainnet_header_bytes()[1].clone();
        let mut block = header.clone();
        block.extend_from_slice(&[1, 0xaa, 0xbb]);
        assert_eq!(extract_header(&block).unwrap(), header);
        assert_eq!(extract_header(&envelope(b"block", &block)).unwrap(), header);
        assert_eq!(extract_header(&header).unwrap(), header);
    }

    #[test]
    fn rejects_bad_envelopes() {
        let block = mainnet_header_bytes()[1].clone();
        assert!(matches!(
            extract_header(&envelope(b"tx", &block)),
            Err(BlockFileError::NotABlock(cmd)) if cmd == "tx"
        ));
        let mut corrupt = envelope(b"block", &block);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xff;
        assert_eq!(extract_header(&corrupt), Err(BlockFileError::Checksum));
        let mut short = envelope(b"block", &block);
        short.pop();
        assert!(matches!(
            extract_header(&short),
            Err(BlockFileError::LengthMismatch { declared: 80, actual: 79 })
        ));
        assert_eq!(
            extract_header(&envelope(b"block", &block[..40])),
            Err(BlockFileError::Truncated(40))
        );
    }

    #[test]
    fn loads_window_from_directory() {
        let dir = temp_dir("blocks");
        let raw = mainnet_header_bytes();
        for (height, bytes) in raw.iter().enumerate() {
            fs::write(dir.join(format!("blocks_{height}.dat")), bytes).unwrap();
        }
        let state = genesis_draw(0);
        let loaded = load_candidates(&dir, &state).unwrap();
        assert_eq!(loaded, raw[1..].to_vec());
        fs::remove_file(dir.join("blocks_3.dat")).unwrap();
        assert!(matches!(
            load_candidates(&dir, &state),
            Err(BlockFileError::Io(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn loads_listing_file() {
        let dir = temp_dir("listing");
        let path = dir.join("run.hex");
        fs::write(&path, MAINNET_HEADERS[1..].join("\n")).unwrap();
        let loaded = load_candidates(&path, &genesis_draw(0)).unwrap();
        assert_eq!(loaded.len(), 3);
        fs::remove_dir_all(&dir).unwrap();
    }
}
