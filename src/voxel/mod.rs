//! Block data, chunk volumes and meshing

pub mod atlas;
pub mod block;
pub mod chunk;
pub mod interaction;
pub mod leaf;
pub mod mesher;

pub use atlas::{AtlasQuad, TextureAtlas};
pub use block::{AIR, BlockDefinition, BlockId, BlockRegistry, BlockSide, BlockSpec, BlockType};
pub use chunk::{Chunk, ChunkCoord, ChunkMeshes};
pub use interaction::{BlockQuery, BlockTarget, Movement, pick_block, probe_movement};
pub use leaf::{LeafData, LeafStore};
pub use mesher::{ChunkMesh, ChunkMesher, ChunkNeighbors, MeshBuffers};
