//! Procedural terrain generation

pub mod generator;
pub use generator::{ChunkGenerator, TerrainPalette, TerrainParams};

pub mod biome;
pub use biome::BiomeMap;

pub mod trees;
pub use trees::Tree;
