//! Chunk system for managing column regions of voxel space

use std::fmt;

use crate::core::types::{IVec3, Vec3};
use crate::render::backend::{MeshHandle, MeshKind, RenderBackend};
use crate::voxel::block::{AIR, BlockId};
use crate::voxel::mesher::{ChunkMesh, MeshBuffers};

/// Integer coordinate identifying a chunk column in the world grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing an integer block position
    pub fn from_block(x: i32, z: i32, width: u32) -> Self {
        let w = width as i32;
        Self {
            x: x.div_euclid(w),
            z: z.div_euclid(w),
        }
    }

    /// Chunk containing a world position
    pub fn from_world_pos(pos: Vec3, width: u32) -> Self {
        Self {
            x: (pos.x / width as f32).floor() as i32,
            z: (pos.z / width as f32).floor() as i32,
        }
    }

    /// World-space block position of this chunk's minimum corner (y = 0)
    pub fn world_origin(&self, width: u32) -> IVec3 {
        let w = width as i32;
        IVec3::new(self.x * w, 0, self.z * w)
    }

    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// `|dx| + |dz|`
    pub fn manhattan_distance(&self, other: ChunkCoord) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }

    /// The four axis neighbours, in left, right, back, front order
    pub fn axis_neighbors(&self) -> [ChunkCoord; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// GPU meshes owned by a chunk
#[derive(Debug, Default)]
pub struct ChunkMeshes {
    pub opaque: Option<MeshHandle>,
    pub transparent: Option<MeshHandle>,
}

impl ChunkMeshes {
    fn slot(&mut self, kind: MeshKind) -> &mut Option<MeshHandle> {
        match kind {
            MeshKind::Opaque => &mut self.opaque,
            MeshKind::Transparent => &mut self.transparent,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_none() && self.transparent.is_none()
    }
}

/// A `width x width x height` column of block ids plus its GPU meshes
pub struct Chunk {
    /// Coordinate of this chunk in the world grid
    pub coord: ChunkCoord,
    width: u32,
    height: u32,
    /// Flat volume indexed `y * width * width + z * width + x`
    blocks: Vec<BlockId>,
    meshes: ChunkMeshes,
    meshed: bool,
}

impl Chunk {
    /// Create a new all-air chunk
    pub fn new(coord: ChunkCoord, width: u32, height: u32) -> Self {
        let len = width as usize * width as usize * height as usize;
        Self::from_blocks(coord, width, height, vec![AIR; len])
    }

    /// Create a chunk from an existing volume. The caller guarantees the
    /// length matches the dimensions.
    pub fn from_blocks(coord: ChunkCoord, width: u32, height: u32, blocks: Vec<BlockId>) -> Self {
        debug_assert_eq!(blocks.len(), width as usize * width as usize * height as usize);
        Self {
            coord,
            width,
            height,
            blocks,
            meshes: ChunkMeshes::default(),
            meshed: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// World-space block position of the minimum corner
    pub fn origin(&self) -> IVec3 {
        self.coord.world_origin(self.width)
    }

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let (w, h) = (self.width as i32, self.height as i32);
        if x < 0 || x >= w || z < 0 || z >= w || y < 0 || y >= h {
            return None;
        }
        Some((y * w * w + z * w + x) as usize)
    }

    /// Block at local coordinates, `None` outside the volume
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        self.index(x, y, z).map(|i| self.blocks[i])
    }

    /// Set a block at local coordinates. Returns false outside the volume.
    pub fn set(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        match self.index(x, y, z) {
            Some(i) => {
                self.blocks[i] = id;
                true
            }
            None => false,
        }
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [BlockId] {
        &mut self.blocks
    }

    pub fn is_meshed(&self) -> bool {
        self.meshed
    }

    pub fn meshes(&self) -> &ChunkMeshes {
        &self.meshes
    }

    /// Push a freshly built mesh to the backend, replacing whatever this chunk
    /// showed before. An empty list releases its mesh.
    pub fn apply_mesh<B: RenderBackend>(&mut self, mesh: &ChunkMesh, backend: &mut B) {
        let origin = self.origin();
        self.apply_buffers(MeshKind::Opaque, &mesh.opaque, origin, backend);
        self.apply_buffers(MeshKind::Transparent, &mesh.transparent, origin, backend);
        self.meshed = true;
    }

    fn apply_buffers<B: RenderBackend>(
        &mut self,
        kind: MeshKind,
        buffers: &MeshBuffers,
        origin: IVec3,
        backend: &mut B,
    ) {
        let slot = self.meshes.slot(kind);
        match (slot.take(), buffers.is_empty()) {
            (Some(handle), true) => backend.release(handle),
            (Some(handle), false) => {
                backend.update(&handle, buffers);
                *slot = Some(handle);
            }
            (None, false) => *slot = Some(backend.upload(origin, kind, buffers)),
            (None, true) => {}
        }
    }

    /// Release every GPU mesh this chunk holds
    pub fn release_meshes<B: RenderBackend>(&mut self, backend: &mut B) {
        if let Some(handle) = self.meshes.opaque.take() {
            backend.release(handle);
        }
        if let Some(handle) = self.meshes.transparent.take() {
            backend.release(handle);
        }
        self.meshed = false;
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        if !self.meshes.is_empty() {
            log::warn!("Chunk {} dropped while still holding GPU meshes", self.coord);
        }
    }
}
