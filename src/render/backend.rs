//! Render backend seam
//!
//! The core never draws. It hands finished mesh buffers to a [`RenderBackend`]
//! and keeps the returned [`MeshHandle`] until the mesh is replaced or the
//! chunk leaves memory.

use std::collections::HashMap;

use crate::core::types::IVec3;
use crate::voxel::mesher::MeshBuffers;

/// Which of a chunk's two meshes a buffer set belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Opaque,
    Transparent,
}

/// Exclusive handle to GPU resources for one mesh.
///
/// Not `Clone`: the owner hands it back through
/// [`RenderBackend::release`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(u64);

impl MeshHandle {
    /// Wrap a backend-specific id
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Receives mesh buffers and owns the GPU side of them
pub trait RenderBackend {
    /// Create GPU resources for a new mesh whose vertices are relative to
    /// `origin` (the chunk's minimum corner in world blocks).
    fn upload(&mut self, origin: IVec3, kind: MeshKind, buffers: &MeshBuffers) -> MeshHandle;

    /// Replace the contents of an existing mesh
    fn update(&mut self, handle: &MeshHandle, buffers: &MeshBuffers);

    /// Free the GPU resources behind a handle
    fn release(&mut self, handle: MeshHandle);
}

impl<B: RenderBackend + ?Sized> RenderBackend for &mut B {
    fn upload(&mut self, origin: IVec3, kind: MeshKind, buffers: &MeshBuffers) -> MeshHandle {
        (**self).upload(origin, kind, buffers)
    }

    fn update(&mut self, handle: &MeshHandle, buffers: &MeshBuffers) {
        (**self).update(handle, buffers)
    }

    fn release(&mut self, handle: MeshHandle) {
        (**self).release(handle)
    }
}

/// Counters kept by [`HeadlessBackend`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub uploads: u64,
    pub updates: u64,
    pub releases: u64,
    /// Bytes currently held across all live meshes
    pub resident_bytes: usize,
}

/// What a headless backend remembers about one live mesh
#[derive(Clone, Debug, PartialEq)]
pub struct MeshRecord {
    pub origin: IVec3,
    pub kind: MeshKind,
    pub vertex_count: usize,
    pub index_count: usize,
    pub bytes: usize,
    /// Number of updates since upload
    pub revision: u32,
}

/// In-memory backend that tracks meshes without a GPU
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    meshes: HashMap<u64, MeshRecord>,
    stats: BackendStats,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meshes uploaded and not yet released
    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    pub fn mesh(&self, handle: &MeshHandle) -> Option<&MeshRecord> {
        self.meshes.get(&handle.0)
    }

    /// Total triangles across live meshes
    pub fn triangle_count(&self) -> usize {
        self.meshes.values().map(|m| m.index_count / 3).sum()
    }

    fn record(origin: IVec3, kind: MeshKind, buffers: &MeshBuffers) -> MeshRecord {
        MeshRecord {
            origin,
            kind,
            vertex_count: buffers.vertex_count(),
            index_count: buffers.indices.len(),
            bytes: buffers.byte_len(),
            revision: 0,
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload(&mut self, origin: IVec3, kind: MeshKind, buffers: &MeshBuffers) -> MeshHandle {
        let id = self.next_id;
        self.next_id += 1;

        let record = Self::record(origin, kind, buffers);
        self.stats.uploads += 1;
        self.stats.resident_bytes += record.bytes;
        self.meshes.insert(id, record);

        log::trace!("Uploaded {:?} mesh {} at {}", kind, id, origin);
        MeshHandle(id)
    }

    fn update(&mut self, handle: &MeshHandle, buffers: &MeshBuffers) {
        let Some(record) = self.meshes.get_mut(&handle.0) else {
            log::warn!("Update for unknown mesh {}", handle.0);
            return;
        };

        let fresh = MeshRecord {
            revision: record.revision + 1,
            ..Self::record(record.origin, record.kind, buffers)
        };
        self.stats.resident_bytes = self.stats.resident_bytes - record.bytes + fresh.bytes;
        self.stats.updates += 1;
        *record = fresh;
    }

    fn release(&mut self, handle: MeshHandle) {
        match self.meshes.remove(&handle.0) {
            Some(record) => {
                self.stats.releases += 1;
                self.stats.resident_bytes -= record.bytes;
            }
            None => log::warn!("Release for unknown mesh {}", handle.0),
        }
    }
}
