//! Face-culling chunk mesher
//!
//! Every solid cell emits a unit-cube quad for each side whose neighbour
//! does not hide it. Opaque and transparent faces go to separate lists so the
//! backend can draw them in two passes.

use crate::core::types::Result;
use crate::voxel::atlas::AtlasQuad;
use crate::voxel::block::{BlockRegistry, BlockSide, BlockType};
use crate::voxel::chunk::Chunk;

/// Unit-cube corners for each side, counter-clockwise seen from outside
const FACE_VERTICES: [[[f32; 3]; 4]; 6] = [
    // Top
    [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
    // Bottom
    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
    // Left
    [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    // Right
    [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
    // Front
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    // Back
    [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
];

/// Two triangles per quad
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Flat, GPU-ready triangle list. Positions are relative to the chunk origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// 3 floats per vertex
    pub positions: Vec<f32>,
    /// 3 floats per vertex
    pub normals: Vec<f32>,
    /// 2 floats per vertex
    pub tex_coords: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    fn with_faces(faces: usize) -> Self {
        Self {
            positions: Vec::with_capacity(faces * 4 * 3),
            normals: Vec::with_capacity(faces * 4 * 3),
            tex_coords: Vec::with_capacity(faces * 4 * 2),
            indices: Vec::with_capacity(faces * 6),
        }
    }

    fn push_face(&mut self, cell: [i32; 3], side: BlockSide, quad: &AtlasQuad) {
        let base = self.vertex_count() as u32;
        let normal = side.normal();

        for (corner, uv) in FACE_VERTICES[side.index()].iter().zip(quad.corners()) {
            self.positions.extend_from_slice(&[
                corner[0] + cell[0] as f32,
                corner[1] + cell[1] as f32,
                corner[2] + cell[2] as f32,
            ]);
            self.normals.extend_from_slice(&normal);
            self.tex_coords.extend_from_slice(uv);
        }
        self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn tex_coord_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.tex_coords)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Total size of all four arrays in bytes
    pub fn byte_len(&self) -> usize {
        self.position_bytes().len()
            + self.normal_bytes().len()
            + self.tex_coord_bytes().len()
            + self.index_bytes().len()
    }
}

/// Both meshes of one chunk
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub opaque: MeshBuffers,
    pub transparent: MeshBuffers,
}

impl ChunkMesh {
    pub fn face_count(&self) -> usize {
        self.opaque.face_count() + self.transparent.face_count()
    }
}

/// Resident axis neighbours of the chunk being meshed
#[derive(Clone, Copy, Default)]
pub struct ChunkNeighbors<'a> {
    /// `(cx - 1, cz)`
    pub left: Option<&'a Chunk>,
    /// `(cx + 1, cz)`
    pub right: Option<&'a Chunk>,
    /// `(cx, cz + 1)`
    pub front: Option<&'a Chunk>,
    /// `(cx, cz - 1)`
    pub back: Option<&'a Chunk>,
}

struct Face {
    cell: [i32; 3],
    side: BlockSide,
    quad: AtlasQuad,
}

/// Builds [`ChunkMesh`]es against a block registry
pub struct ChunkMesher<'a> {
    registry: &'a BlockRegistry,
}

impl<'a> ChunkMesher<'a> {
    pub fn new(registry: &'a BlockRegistry) -> Self {
        Self { registry }
    }

    /// Mesh a chunk. Cells beyond the chunk edge resolve through `neighbors`;
    /// a missing neighbour or a cell outside `[0, height)` counts as empty.
    pub fn mesh(&self, chunk: &Chunk, neighbors: &ChunkNeighbors<'_>) -> Result<ChunkMesh> {
        let w = chunk.width() as i32;
        let h = chunk.height() as i32;

        let mut opaque = Vec::new();
        let mut transparent = Vec::new();

        for y in 0..h {
            for z in 0..w {
                for x in 0..w {
                    let Some(id) = chunk.get(x, y, z) else { continue };
                    let block = self.registry.get(id)?;
                    if !block.solid {
                        continue;
                    }

                    for side in BlockSide::ALL {
                        let o = side.offset();
                        let neighbor =
                            self.neighbor_block(chunk, neighbors, x + o.x, y + o.y, z + o.z)?;

                        let (visible, list) = if block.individual_faces {
                            (true, &mut transparent)
                        } else if block.transparent {
                            (neighbor.is_none_or(|n| !n.solid), &mut transparent)
                        } else {
                            (neighbor.is_none_or(|n| !n.solid || n.transparent), &mut opaque)
                        };

                        if visible {
                            list.push(Face {
                                cell: [x, y, z],
                                side,
                                quad: *block.face(side)?,
                            });
                        }
                    }
                }
            }
        }

        Ok(ChunkMesh {
            opaque: Self::flatten(&opaque),
            transparent: Self::flatten(&transparent),
        })
    }

    fn flatten(faces: &[Face]) -> MeshBuffers {
        let mut buffers = MeshBuffers::with_faces(faces.len());
        for face in faces {
            buffers.push_face(face.cell, face.side, &face.quad);
        }
        buffers
    }

    /// Block at local coordinates that may step one cell past the chunk edge
    fn neighbor_block(
        &self,
        chunk: &Chunk,
        neighbors: &ChunkNeighbors<'_>,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<Option<&'a BlockType>> {
        let w = chunk.width() as i32;
        if y < 0 || y >= chunk.height() as i32 {
            return Ok(None);
        }

        let (source, lx, lz) = if x < 0 {
            (neighbors.left, x + w, z)
        } else if x >= w {
            (neighbors.right, x - w, z)
        } else if z < 0 {
            (neighbors.back, x, z + w)
        } else if z >= w {
            (neighbors.front, x, z - w)
        } else {
            (Some(chunk), x, z)
        };

        match source.and_then(|c| c.get(lx, y, lz)) {
            Some(id) => self.registry.get(id).map(Some),
            None => Ok(None),
        }
    }
}
