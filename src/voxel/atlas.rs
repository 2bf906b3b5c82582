//! Texture atlas layout
//!
//! Textures are packed column-major onto an `n x n` grid where
//! `n = ceil(sqrt(count))`. Only the layout lives here; loading the actual
//! images is the render backend's job.

use std::collections::HashMap;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::voxel::block::BlockDefinition;

/// Four normalised (u, v) corners locating one face image in the atlas,
/// in the order `(x1,y1) (x2,y1) (x2,y2) (x1,y2)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AtlasQuad(pub [[f32; 2]; 4]);

impl AtlasQuad {
    pub fn new(corners: [[f32; 2]; 4]) -> Self {
        Self(corners)
    }

    pub fn corners(&self) -> &[[f32; 2]; 4] {
        &self.0
    }
}

/// Name-to-quad lookup for a packed atlas
#[derive(Clone, Debug, Default)]
pub struct TextureAtlas {
    grid: u32,
    quads: HashMap<String, AtlasQuad>,
    order: Vec<String>,
}

impl TextureAtlas {
    /// Pack texture names onto the grid in the order given. Repeated names
    /// keep their first slot.
    pub fn pack<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !order.contains(&name) {
                order.push(name);
            }
        }

        let grid = (order.len() as f32).sqrt().ceil().max(1.0) as u32;
        let step = 1.0 / grid as f32;

        let quads = order
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let column = i as u32 / grid;
                let row = i as u32 % grid;
                let x1 = column as f32 * step;
                let y1 = row as f32 * step;
                let x2 = x1 + step;
                let y2 = y1 + step;
                (name.clone(), AtlasQuad([[x1, y1], [x2, y1], [x2, y2], [x1, y2]]))
            })
            .collect();

        log::debug!("Packed {} textures into a {}x{} atlas", order.len(), grid, grid);

        Self { grid, quads, order }
    }

    /// Atlas covering every texture named by a definition list
    pub fn for_definitions(defs: &[BlockDefinition]) -> Self {
        Self::pack(defs.iter().flat_map(|def| def.texture_names()))
    }

    /// Quad for a texture name
    pub fn quad(&self, name: &str) -> Result<AtlasQuad> {
        self.quads
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownTexture(name.to_string()))
    }

    /// Cells per atlas side
    pub fn grid_size(&self) -> u32 {
        self.grid
    }

    /// Texture names in slot order, for the backend that builds the image
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
