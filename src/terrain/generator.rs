//! Noise-based procedural chunk generation

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::biome::BiomeMap;
use super::trees::{Tree, TreeValueGrid, search_radius};
use crate::core::error::Error;
use crate::core::types::Result;
use crate::voxel::block::{AIR, BlockId, BlockRegistry};
use crate::voxel::chunk::{Chunk, ChunkCoord};
use crate::voxel::leaf::{LeafData, LeafStore};

/// Parameters controlling terrain generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub seed: u32,
    pub scale: f32,             // Horizontal scale of the height field (larger = smoother)
    pub octaves: u32,           // FBM octaves (detail levels)
    pub persistence: f32,       // FBM persistence (0.5 typical)
    pub lacunarity: f32,        // FBM lacunarity (2.0 typical)
    pub baseline: i32,          // Ground height where the noise is zero
    pub amplitude: f32,         // Height swing around the baseline
    pub water_level: i32,       // Columns at or below this are underwater
    pub biome_seed_offset: u32, // Added to the seed for the biome field
    pub biome_scale: f32,       // Horizontal scale of biome regions
    pub tree_scale: f32,        // Horizontal scale of the tree placement field
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 64.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            baseline: 24,
            amplitude: 16.0,
            water_level: 20,
            biome_seed_offset: 1000,
            biome_scale: 256.0,
            tree_scale: 3.3,
        }
    }
}

/// Block ids written by the fill rule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainPalette {
    pub stone: BlockId,
    pub dirt: BlockId,
    pub grass: BlockId,
    pub sand: BlockId,
    pub log: BlockId,
    pub leaves: BlockId,
    pub water: BlockId,
}

impl Default for TerrainPalette {
    /// Ids of the bundled block definitions
    fn default() -> Self {
        Self {
            stone: 1,
            dirt: 2,
            grass: 3,
            sand: 4,
            log: 5,
            leaves: 6,
            water: 7,
        }
    }
}

impl TerrainPalette {
    /// Fail with `UnknownBlockId` if any id is not registered
    pub fn validate(&self, registry: &BlockRegistry) -> Result<()> {
        for id in [
            self.stone,
            self.dirt,
            self.grass,
            self.sand,
            self.log,
            self.leaves,
            self.water,
        ] {
            registry.get(id)?;
        }
        Ok(())
    }
}

/// Fills chunks with terrain, water and trees
pub struct ChunkGenerator {
    params: TerrainParams,
    palette: TerrainPalette,
    height: u32,
    noise: Fbm<Perlin>,
    biome_map: BiomeMap,
}

impl ChunkGenerator {
    /// Create a generator for chunks `height` blocks tall. The palette is
    /// checked against the registry up front.
    pub fn new(
        params: TerrainParams,
        palette: TerrainPalette,
        height: u32,
        registry: &BlockRegistry,
    ) -> Result<Self> {
        if height == 0 || i32::try_from(height).is_err() {
            return Err(Error::InvalidConfig(format!("unusable chunk height {}", height)));
        }
        palette.validate(registry)?;

        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);
        let biome_map = BiomeMap::new(&params);

        log::debug!(
            "Chunk generator ready (seed {}, water level {})",
            params.seed,
            params.water_level
        );

        Ok(Self {
            params,
            palette,
            height,
            noise,
            biome_map,
        })
    }

    /// Get terrain parameters
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    pub fn palette(&self) -> &TerrainPalette {
        &self.palette
    }

    /// Ground height of a world column, clamped into the chunk's vertical range
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let nx = x as f64 / self.params.scale as f64;
        let nz = z as f64 / self.params.scale as f64;
        let noise_value = self.noise.get([nx, nz]);

        let offset = (noise_value * self.params.amplitude as f64).floor() as i32;
        let ground = self.params.baseline + offset;
        ground.clamp(0, self.height as i32 - 1)
    }

    /// Biome value of a world column in `[0, 1]`
    pub fn biome_at(&self, x: i32, z: i32) -> f64 {
        self.biome_map.biome_at(x, z)
    }

    /// Ground heights for a chunk, indexed `z * width + x`
    pub fn height_map(&self, coord: ChunkCoord, width: u32) -> Vec<i32> {
        let origin = coord.world_origin(width);
        let w = width as i32;
        (0..w)
            .flat_map(|z| (0..w).map(move |x| (x, z)))
            .map(|(x, z)| self.height_at(origin.x + x, origin.z + z))
            .collect()
    }

    /// Trees rooted inside a chunk
    pub fn trees(&self, coord: ChunkCoord, width: u32, heights: &[i32]) -> Vec<Tree> {
        let origin = coord.world_origin(width);
        let w = width as i32;
        let grid = TreeValueGrid::sample(origin.x, origin.z, w, |x, z| {
            self.biome_map.tree_value_at(x, z)
        });

        let mut trees = Vec::new();
        for z in 0..w {
            for x in 0..w {
                let (wx, wz) = (origin.x + x, origin.z + z);
                let ground = heights[(z * w + x) as usize];
                if ground <= self.params.water_level {
                    continue;
                }

                let biome = self.biome_map.biome_at(wx, wz);
                if !grid.is_local_max(wx, wz, search_radius(biome)) {
                    continue;
                }

                let tree = Tree::from_biome(wx, wz, ground, biome);
                if tree.ceiling() < self.height as i32 {
                    trees.push(tree);
                }
            }
        }
        trees
    }

    /// Fill a chunk. Canopy that overhangs other chunks is parked in `leaves`
    /// under the owning coordinate; this chunk's own pending entry is consumed.
    ///
    /// Returns the number of trees rooted in the chunk.
    pub fn generate(&self, chunk: &mut Chunk, leaves: &mut LeafStore) -> usize {
        let coord = chunk.coord;
        let width = chunk.width();
        let w = width as i32;
        let origin = coord.world_origin(width);

        let heights = self.height_map(coord, width);
        let trees = self.trees(coord, width, &heights);

        let mut own_leaves = leaves.take(coord).unwrap_or_default();
        let mut trunks: Vec<Option<&Tree>> = vec![None; (w * w) as usize];

        for tree in &trees {
            let (lx, lz) = (tree.x - origin.x, tree.z - origin.z);
            trunks[(lz * w + lx) as usize] = Some(tree);

            for cell in tree.canopy() {
                if cell.y < 0 || cell.y >= chunk.height() as i32 {
                    continue;
                }
                let owner = ChunkCoord::from_block(cell.x, cell.z, width);
                let owner_origin = owner.world_origin(width);
                let (cx, cz) = (cell.x - owner_origin.x, cell.z - owner_origin.z);
                if owner == coord {
                    own_leaves.mark(cx, cell.y, cz);
                } else {
                    leaves.entry(owner).mark(cx, cell.y, cz);
                }
            }
        }

        for z in 0..w {
            for x in 0..w {
                let column = (z * w + x) as usize;
                let ground = heights[column];
                let trunk = trunks[column];
                for y in 0..chunk.height() as i32 {
                    let id = self.block_for(ground, y, trunk, &own_leaves, x, z);
                    chunk.set(x, y, z, id);
                }
            }
        }

        log::trace!("Generated chunk {} with {} trees", coord, trees.len());
        trees.len()
    }

    /// Fill rule for one cell
    fn block_for(
        &self,
        ground: i32,
        y: i32,
        trunk: Option<&Tree>,
        leaves: &LeafData,
        x: i32,
        z: i32,
    ) -> BlockId {
        let p = &self.palette;
        let underwater = ground <= self.params.water_level;

        if y < ground - 3 {
            p.stone
        } else if y < ground {
            if underwater { p.sand } else { p.dirt }
        } else if y == ground {
            if underwater { p.sand } else { p.grass }
        } else if trunk.is_some_and(|t| y <= t.top()) {
            p.log
        } else if leaves.contains(x, y, z) {
            p.leaves
        } else if underwater && y <= self.params.water_level {
            p.water
        } else {
            AIR
        }
    }
}
