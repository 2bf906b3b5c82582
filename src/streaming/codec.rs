//! Chunk serialization for the save cache

use rkyv::{Archive, Deserialize, Serialize};
use rkyv::util::AlignedVec;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::voxel::block::{BlockId, BlockRegistry};
use crate::voxel::chunk::{Chunk, ChunkCoord};

/// Serializable chunk volume
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq)]
pub struct ChunkData {
    pub coord_x: i32,
    pub coord_z: i32,
    pub width: u32,
    pub height: u32,
    /// Block ids in volume order
    pub blocks: Vec<BlockId>,
}

impl ChunkData {
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            coord_x: chunk.coord.x,
            coord_z: chunk.coord.z,
            width: chunk.width(),
            height: chunk.height(),
            blocks: chunk.blocks().to_vec(),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        ChunkCoord::new(self.coord_x, self.coord_z)
    }
}

fn corrupt(coord: ChunkCoord, reason: impl Into<String>) -> Error {
    Error::CorruptSave {
        coord,
        reason: reason.into(),
    }
}

/// Serialize a chunk to bytes (uncompressed)
pub fn serialize_chunk(chunk: &Chunk) -> Result<Vec<u8>> {
    let data = ChunkData::from_chunk(chunk);

    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&data)
        .map_err(|e| corrupt(chunk.coord, format!("serialization failed: {}", e)))?;

    Ok(bytes.to_vec())
}

/// Deserialize a chunk from bytes (uncompressed)
///
/// The stored coordinate and dimensions must match what the caller expects,
/// and every id must be registered. Unknown ids fail with `UnknownBlockId`;
/// anything else that does not fit is `CorruptSave`.
pub fn deserialize_chunk(
    coord: ChunkCoord,
    data: &[u8],
    width: u32,
    height: u32,
    registry: &BlockRegistry,
) -> Result<Chunk> {
    // rkyv needs the archive aligned; decompressed buffers give no guarantee.
    let mut aligned = AlignedVec::<16>::with_capacity(data.len());
    aligned.extend_from_slice(data);

    let archived = rkyv::access::<ArchivedChunkData, rkyv::rancor::Error>(&aligned)
        .map_err(|e| corrupt(coord, format!("invalid archive: {}", e)))?;
    let chunk_data: ChunkData = rkyv::deserialize::<ChunkData, rkyv::rancor::Error>(archived)
        .map_err(|e| corrupt(coord, format!("invalid archive: {}", e)))?;

    if chunk_data.coord() != coord {
        return Err(corrupt(
            coord,
            format!("entry belongs to chunk {}", chunk_data.coord()),
        ));
    }
    if chunk_data.width != width || chunk_data.height != height {
        return Err(corrupt(
            coord,
            format!(
                "stored as {}x{}, expected {}x{}",
                chunk_data.width, chunk_data.height, width, height
            ),
        ));
    }
    let expected = width as usize * width as usize * height as usize;
    if chunk_data.blocks.len() != expected {
        return Err(corrupt(
            coord,
            format!("{} blocks, expected {}", chunk_data.blocks.len(), expected),
        ));
    }
    if let Some(&id) = chunk_data.blocks.iter().find(|&&id| !registry.contains(id)) {
        return Err(Error::UnknownBlockId(id));
    }

    Ok(Chunk::from_blocks(coord, width, height, chunk_data.blocks))
}

/// Compress a serialized chunk using LZ4
pub fn compress_chunk(chunk: &Chunk) -> Result<Vec<u8>> {
    let serialized = serialize_chunk(chunk)?;
    Ok(lz4_flex::compress_prepend_size(&serialized))
}

/// Decompress and deserialize a chunk
pub fn decompress_chunk(
    coord: ChunkCoord,
    data: &[u8],
    width: u32,
    height: u32,
    registry: &BlockRegistry,
) -> Result<Chunk> {
    let decompressed = lz4_flex::decompress_size_prepended(data)
        .map_err(|e| corrupt(coord, format!("LZ4 decompression failed: {}", e)))?;
    deserialize_chunk(coord, &decompressed, width, height, registry)
}
