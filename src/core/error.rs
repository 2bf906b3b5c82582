//! Error types for blockworld

use thiserror::Error;

use crate::core::types::Vec3;
use crate::voxel::block::{BlockId, BlockSide};
use crate::voxel::chunk::ChunkCoord;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// A block id that the registry does not know. Fatal: points at a corrupt
    /// save or a registry/version mismatch.
    #[error("unknown block id {0}")]
    UnknownBlockId(BlockId),

    /// A solid block without a texture for one of its faces.
    #[error("block {block} has no texture for its {side:?} face")]
    MissingTexture { block: BlockId, side: BlockSide },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid position {0}")]
    InvalidPosition(Vec3),

    #[error("block id {0} is already registered")]
    DuplicateBlockId(BlockId),

    #[error("texture '{0}' is not in the atlas")]
    UnknownTexture(String),

    #[error("corrupted save for chunk {coord:?}: {reason}")]
    CorruptSave { coord: ChunkCoord, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
