//! Versioned JSON document describing a draw.
//!
//! ```json
//! {
//!   "schema": "hashuffle.draw.v1",
//!   "current_block": {
//!     "hash": "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
//!     "height": 0,
//!     "difficulty_target": 486604799
//!   },
//!   "draw_block_height": 1,
//!   "number_of_blocks_for_verification": 2,
//!   "number_of_hash_rounds": 0,
//!   "participants": [{ "party": "PartyA", "ticket_id": 0 }]
//! }
//! ```

use crate::draw::{DrawState, Participant, PartyName, ReferenceBlock};
use crate::header::BlockHash;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Schema tag written into every draw document.
pub const DRAW_SCHEMA: &str = "hashuffle.draw.v1";

/// Errors raised while reading or writing draw documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("draw document I/O error: {0}")]
    /// Filesystem failure.
    Io(String),
    #[error("draw document decode error: {0}")]
    /// JSON could not be parsed or encoded.
    Decode(String),
    #[error("invalid draw schema: {0}")]
    /// The schema tag is not [`DRAW_SCHEMA`].
    InvalidSchema(String),
    #[error("invalid block hash {hash:?}: {reason}")]
    /// The reference block hash is not 64 hex characters.
    InvalidHash {
        /// Offending text.
        hash: String,
        /// Parse failure.
        reason: String,
    },
}

/// Reference block as written in a draw document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockJson {
    /// Display-order block hash.
    pub hash: String,
    /// Block height.
    pub height: u64,
    /// Compact difficulty bits.
    pub difficulty_target: u32,
}

/// Serialized draw document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawJson {
    /// Schema identifier (`hashuffle.draw.v1`).
    pub schema: String,
    /// Block the candidate run extends.
    pub current_block: BlockJson,
    /// Height of the beacon block.
    pub draw_block_height: u64,
    /// Confirmations required after the beacon block.
    pub number_of_blocks_for_verification: u64,
    /// Extra beacon hash rounds.
    #[serde(default)]
    pub number_of_hash_rounds: u32,
    /// Ticketed participants.
    pub participants: Vec<Participant<PartyName>>,
}

impl DrawJson {
    /// Captures a draw state as a document.
    pub fn from_state(state: &DrawState<PartyName>) -> Self {
        Self {
            schema: DRAW_SCHEMA.to_string(),
            current_block: BlockJson {
                hash: state.current_block.hash.to_display_hex(),
                height: state.current_block.height,
                difficulty_target: state.current_block.difficulty_target,
            },
            draw_block_height: state.draw_block_height,
            number_of_blocks_for_verification: state.number_of_blocks_for_verification,
            number_of_hash_rounds: state.number_of_hash_rounds,
            participants: state.participants.clone(),
        }
    }

    /// Converts the document into a draw state.
    pub fn into_state(self) -> Result<DrawState<PartyName>, DocumentError> {
        if self.schema != DRAW_SCHEMA {
            return Err(DocumentError::InvalidSchema(self.schema));
        }
        let hash = BlockHash::from_display_hex(&self.current_block.hash).map_err(|err| {
            DocumentError::InvalidHash {
                hash: self.current_block.hash.clone(),
                reason: err.to_string(),
            }
        })?;
        Ok(DrawState {
            current_block: ReferenceBlock {
                hash,
                height: self.current_block.height,
                difficulty_target: self.current_block.difficulty_target,
            },
            draw_block_height: self.draw_block_height,
            number_of_blocks_for_verification: self.number_of_blocks_for_verification,
            number_of_hash_rounds: self.number_of_hash_rounds,
            participants: self.participants,
        })
    }

    /// Parses a document from JSON text.
    pub fn from_json_str(input: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(input).map_err(|err| DocumentError::Decode(err.to_string()))
    }
}

/// Reads a draw document and converts it into a state.
pub fn load_draw(path: &Path) -> Result<DrawState<PartyName>, DocumentError> {
    let contents = fs::read_to_string(path)
        .map_err(|err| DocumentError::Io(format!("{}: {err}", path.display())))?;
    DrawJson::from_json_str(&contents)?.into_state()
}

/// Writes a draw document, replacing `path` atomically.
pub fn write_draw(path: &Path, state: &DrawState<PartyName>) -> Result<PathBuf, DocumentError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| DocumentError::Io(err.to_string()))?;
    }
    let contents = serde_json::to_string_pretty(&DrawJson::from_state(state))
        .map_err(|err| DocumentError::Decode(err.to_string()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents).map_err(|err| DocumentError::Io(err.to_string()))?;
    fs::rename(&tmp_path, path).map_err(|err| DocumentError::Io(err.to_string()))?;
    Ok(path.to_path_buf())
}
