//! Chunk streaming around a moving viewer
//!
//! [`ChunkManager::tick`] keeps a circle of chunks resident around the viewer.
//! Chunks that fall out of range are released from the render backend and
//! parked, compressed, in the save cache. At most one chunk becomes resident
//! per tick, loaded from the cache when possible and generated otherwise; the
//! new chunk and its resident axis neighbours are then re-meshed.

use std::collections::{HashMap, HashSet};

use crate::core::config::WorldConfig;
use crate::core::error::Error;
use crate::core::types::{IVec3, Result, Vec3, ensure_finite};
use crate::render::backend::RenderBackend;
use crate::streaming::cache::SaveCache;
use crate::streaming::codec::{compress_chunk, decompress_chunk};
use crate::streaming::config::StreamingConfig;
use crate::streaming::priority::ChunkPriorityQueue;
use crate::terrain::generator::ChunkGenerator;
use crate::voxel::block::{AIR, BlockId, BlockRegistry, BlockType};
use crate::voxel::chunk::{Chunk, ChunkCoord};
use crate::voxel::interaction::BlockQuery;
use crate::voxel::leaf::LeafStore;
use crate::voxel::mesher::{ChunkMesher, ChunkNeighbors};

/// Lifecycle state of a chunk key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Not wanted and not cached
    Absent,
    /// Within view distance but not loaded yet
    Desired,
    /// Resident, waiting for its first mesh
    Unmeshed,
    /// Resident with up-to-date meshes
    Meshed,
    /// Out of range, serialized in the save cache
    Evicted,
}

/// Where a newly resident chunk came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    Generated,
    Cache,
}

/// What one tick did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Chunk the viewer stands in
    pub viewer: ChunkCoord,
    /// Chunks moved from the resident set into the save cache
    pub evicted: Vec<ChunkCoord>,
    /// Chunk made resident this tick
    pub loaded: Option<(ChunkCoord, LoadSource)>,
    /// Number of chunks re-meshed
    pub remeshed: usize,
    /// Desired chunks still waiting after this tick
    pub pending: usize,
}

/// Leaf spill for chunks farther than this many chunks beyond the view
/// distance is dropped
const LEAF_RETENTION_MARGIN: u32 = 2;

/// Owns every resident chunk and streams them around the viewer
pub struct ChunkManager<B: RenderBackend> {
    config: StreamingConfig,
    registry: BlockRegistry,
    generator: ChunkGenerator,
    chunks: HashMap<ChunkCoord, Chunk>,
    cache: SaveCache,
    leaves: LeafStore,
    queue: ChunkPriorityQueue,
    desired: HashSet<ChunkCoord>,
    viewer: Option<ChunkCoord>,
    backend: B,
}

impl<B: RenderBackend> ChunkManager<B> {
    /// Create a manager with nothing resident
    pub fn new(config: &WorldConfig, registry: BlockRegistry, backend: B) -> Result<Self> {
        config.streaming.validate()?;
        let streaming = config.streaming.clone();
        let generator = ChunkGenerator::new(
            config.terrain.clone(),
            config.palette.clone(),
            streaming.chunk_height,
            &registry,
        )?;

        log::info!(
            "Chunk manager: {}x{}x{} chunks, view distance {}, cache capacity {}",
            streaming.chunk_width,
            streaming.chunk_height,
            streaming.chunk_width,
            streaming.view_distance,
            streaming.cache_capacity
        );

        Ok(Self {
            cache: SaveCache::new(streaming.cache_capacity),
            config: streaming,
            registry,
            generator,
            chunks: HashMap::new(),
            leaves: LeafStore::new(),
            queue: ChunkPriorityQueue::new(),
            desired: HashSet::new(),
            viewer: None,
            backend,
        })
    }

    /// Advance streaming by one step for the given viewer position
    pub fn tick(&mut self, viewer: Vec3) -> Result<TickReport> {
        let center = self.viewer_chunk_at(viewer)?;

        if self.viewer != Some(center) {
            log::debug!("Viewer entered chunk {}", center);
        }
        self.viewer = Some(center);
        self.desired = desired_set(center, self.config.view_distance);

        let mut report = TickReport {
            viewer: center,
            ..Default::default()
        };

        // Evict everything out of range
        let mut stale: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|coord| !self.desired.contains(coord))
            .copied()
            .collect();
        stale.sort();
        for coord in stale {
            self.evict(coord)?;
            report.evicted.push(coord);
        }

        self.prune_leaves(center);

        // Load one pending chunk
        let chunks = &self.chunks;
        self.queue
            .update(center, self.desired.iter(), |coord| chunks.contains_key(&coord));

        if let Some(next) = self.queue.pop() {
            let source = self.load(next.coord)?;
            report.loaded = Some((next.coord, source));

            if self.remesh(next.coord)? {
                report.remeshed += 1;
            }
            for neighbor in next.coord.axis_neighbors() {
                if self.remesh(neighbor)? {
                    report.remeshed += 1;
                }
            }
        }
        report.pending = self.queue.len();

        log::trace!(
            "Tick at {}: {} evicted, loaded {:?}, {} pending",
            center,
            report.evicted.len(),
            report.loaded,
            report.pending
        );
        Ok(report)
    }

    /// Chunk containing the viewer. Positions so far out that the view
    /// circle or its block coordinates would leave `i32` range are rejected.
    fn viewer_chunk_at(&self, viewer: Vec3) -> Result<ChunkCoord> {
        let viewer = ensure_finite(viewer)?;

        let width = self.config.chunk_width as f64;
        let reach = self.config.view_distance as f64 + 1.0;
        let limit = (f64::from(i32::MAX) / width).floor() - reach - 1.0;

        let x = (f64::from(viewer.x) / width).floor();
        let z = (f64::from(viewer.z) / width).floor();
        if x.abs() > limit || z.abs() > limit {
            return Err(Error::InvalidPosition(viewer));
        }
        Ok(ChunkCoord::new(x as i32, z as i32))
    }

    /// Forget leaf spill aimed at chunks far behind the viewer
    fn prune_leaves(&mut self, center: ChunkCoord) {
        let keep = self.config.view_distance + LEAF_RETENTION_MARGIN;
        let before = self.leaves.len();
        self.leaves.retain(|owner| {
            owner.x.abs_diff(center.x).max(owner.z.abs_diff(center.z)) <= keep
        });

        let pruned = before - self.leaves.len();
        if pruned > 0 {
            log::debug!("Dropped leaf spill for {} distant chunks", pruned);
        }
    }

    /// Move a resident chunk into the save cache, releasing its meshes
    fn evict(&mut self, coord: ChunkCoord) -> Result<()> {
        let Some(mut chunk) = self.chunks.remove(&coord) else {
            return Ok(());
        };
        chunk.release_meshes(&mut self.backend);

        let bytes = compress_chunk(&chunk)?;
        if let Some((dropped, _)) = self.cache.insert(coord, bytes) {
            log::warn!(
                "Save cache full ({} entries), dropped chunk {}; it will be regenerated",
                self.cache.capacity(),
                dropped
            );
        }

        log::debug!("Evicted chunk {}", coord);
        Ok(())
    }

    /// Make a chunk resident from the cache or the generator
    fn load(&mut self, coord: ChunkCoord) -> Result<LoadSource> {
        let (width, height) = (self.config.chunk_width, self.config.chunk_height);

        let (chunk, source) = match self.cache.take(coord) {
            Some(bytes) => {
                let chunk = decompress_chunk(coord, &bytes, width, height, &self.registry)?;
                if self.leaves.discard(coord) {
                    log::debug!("Discarded stale leaves for cached chunk {}", coord);
                }
                (chunk, LoadSource::Cache)
            }
            None => {
                let mut chunk = Chunk::new(coord, width, height);
                let trees = self.generator.generate(&mut chunk, &mut self.leaves);
                log::debug!("Generated chunk {} ({} trees)", coord, trees);
                (chunk, LoadSource::Generated)
            }
        };

        self.chunks.insert(coord, chunk);

        // Spill aimed at chunks that already exist can never be consumed.
        let (chunks, cache) = (&self.chunks, &self.cache);
        self.leaves
            .retain(|owner| !chunks.contains_key(&owner) && !cache.contains(owner));

        Ok(source)
    }

    /// Rebuild a resident chunk's meshes. Returns false if it is not resident.
    fn remesh(&mut self, coord: ChunkCoord) -> Result<bool> {
        let Some(chunk) = self.chunks.get(&coord) else {
            return Ok(false);
        };

        let [left, right, back, front] = coord.axis_neighbors();
        let neighbors = ChunkNeighbors {
            left: self.chunks.get(&left),
            right: self.chunks.get(&right),
            front: self.chunks.get(&front),
            back: self.chunks.get(&back),
        };
        let mesh = ChunkMesher::new(&self.registry).mesh(chunk, &neighbors)?;

        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.apply_mesh(&mesh, &mut self.backend);
        }
        Ok(true)
    }

    /// Split a world block position into its chunk and local coordinates
    fn locate(&self, x: i32, y: i32, z: i32) -> Option<(ChunkCoord, IVec3)> {
        if y < 0 || y >= self.config.chunk_height as i32 {
            return None;
        }
        let coord = ChunkCoord::from_block(x, z, self.config.chunk_width);
        let origin = coord.world_origin(self.config.chunk_width);
        Some((coord, IVec3::new(x - origin.x, y, z - origin.z)))
    }

    /// Block at a world position. `None` outside `[0, height)` or when the
    /// chunk is not resident.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&BlockType> {
        let (coord, local) = self.locate(x, y, z)?;
        let id = self.chunks.get(&coord)?.get(local.x, local.y, local.z)?;
        self.registry.get(id).ok()
    }

    /// Place a block. Returns `Ok(false)` when the position is out of range or
    /// its chunk is not resident. The chunk is re-meshed, along with any
    /// neighbour whose boundary the cell touches.
    pub fn set_block_at(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> Result<bool> {
        self.registry.get(id)?;

        let Some((coord, local)) = self.locate(x, y, z) else {
            return Ok(false);
        };
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return Ok(false);
        };
        if !chunk.set(local.x, local.y, local.z, id) {
            return Ok(false);
        }

        self.remesh(coord)?;

        let last = self.config.chunk_width as i32 - 1;
        let [left, right, back, front] = coord.axis_neighbors();
        if local.x == 0 {
            self.remesh(left)?;
        }
        if local.x == last {
            self.remesh(right)?;
        }
        if local.z == 0 {
            self.remesh(back)?;
        }
        if local.z == last {
            self.remesh(front)?;
        }

        Ok(true)
    }

    /// Replace a block with air
    pub fn remove_block_at(&mut self, x: i32, y: i32, z: i32) -> Result<bool> {
        self.set_block_at(x, y, z, AIR)
    }

    /// Lifecycle state of a chunk key
    pub fn chunk_state(&self, coord: ChunkCoord) -> ChunkState {
        if let Some(chunk) = self.chunks.get(&coord) {
            if chunk.is_meshed() {
                ChunkState::Meshed
            } else {
                ChunkState::Unmeshed
            }
        } else if self.desired.contains(&coord) {
            ChunkState::Desired
        } else if self.cache.contains(coord) {
            ChunkState::Evicted
        } else {
            ChunkState::Absent
        }
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn is_cached(&self, coord: ChunkCoord) -> bool {
        self.cache.contains(coord)
    }

    /// Coordinates of every resident chunk
    pub fn resident(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn resident_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Desired chunks that are not resident yet
    pub fn pending_count(&self) -> usize {
        self.desired
            .iter()
            .filter(|coord| !self.chunks.contains_key(coord))
            .count()
    }

    /// Chunk the viewer was in at the last tick
    pub fn viewer_chunk(&self) -> Option<ChunkCoord> {
        self.viewer
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    pub fn leaves(&self) -> &LeafStore {
        &self.leaves
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: RenderBackend> BlockQuery for ChunkManager<B> {
    fn is_solid(&self, cell: IVec3) -> bool {
        self.block_at(cell.x, cell.y, cell.z)
            .is_some_and(|block| block.solid)
    }
}

impl<B: RenderBackend> Drop for ChunkManager<B> {
    fn drop(&mut self) {
        let count = self.chunks.len();
        for chunk in self.chunks.values_mut() {
            chunk.release_meshes(&mut self.backend);
        }
        log::info!("Chunk manager shut down, released {} chunks", count);
    }
}

/// Chunks within a circle of `view_distance` around `center`
pub fn desired_set(center: ChunkCoord, view_distance: u32) -> HashSet<ChunkCoord> {
    let r = view_distance as i32;
    let mut desired = HashSet::new();
    for dx in -r..=r {
        for dz in -r..=r {
            if dx * dx + dz * dz < r * r {
                desired.insert(center.offset(dx, dz));
            }
        }
    }
    desired
}
