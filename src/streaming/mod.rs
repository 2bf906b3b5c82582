//! Chunk streaming around the viewer

pub mod cache;
pub mod codec;
pub mod config;
pub mod manager;
pub mod priority;

pub use cache::SaveCache;
pub use codec::{
    ChunkData, compress_chunk, decompress_chunk, deserialize_chunk, serialize_chunk,
};
pub use config::StreamingConfig;
pub use manager::{ChunkManager, ChunkState, LoadSource, TickReport, desired_set};
pub use priority::{ChunkPriority, ChunkPriorityQueue};
