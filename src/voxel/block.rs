//! Block types and the block registry
//!
//! Chunks store plain [`BlockId`]s; everything else about a block (solidity,
//! transparency, textures) lives in the [`BlockRegistry`], which is built once
//! at startup and passed by reference to whatever needs it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{IVec3, Result};
use crate::voxel::atlas::{AtlasQuad, TextureAtlas};

/// Compact block identifier stored in chunk volumes
pub type BlockId = u16;

/// Reserved id of the air block. Always registered.
pub const AIR: BlockId = 0;

/// One of the six faces of a unit cube
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockSide {
    /// +Y
    Top = 0,
    /// -Y
    Bottom = 1,
    /// -X
    Left = 2,
    /// +X
    Right = 3,
    /// +Z
    Front = 4,
    /// -Z
    Back = 5,
}

impl BlockSide {
    /// All sides, in texture-table order
    pub const ALL: [BlockSide; 6] = [
        BlockSide::Top,
        BlockSide::Bottom,
        BlockSide::Left,
        BlockSide::Right,
        BlockSide::Front,
        BlockSide::Back,
    ];

    /// Unit step towards the neighbouring cell on this side
    pub fn offset(self) -> IVec3 {
        match self {
            BlockSide::Top => IVec3::Y,
            BlockSide::Bottom => IVec3::NEG_Y,
            BlockSide::Left => IVec3::NEG_X,
            BlockSide::Right => IVec3::X,
            BlockSide::Front => IVec3::Z,
            BlockSide::Back => IVec3::NEG_Z,
        }
    }

    /// Outward face normal
    pub fn normal(self) -> [f32; 3] {
        let o = self.offset();
        [o.x as f32, o.y as f32, o.z as f32]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Registration input for a single block type.
///
/// Textures are indexed by [`BlockSide::index`]; solid blocks must provide all
/// six.
#[derive(Clone, Debug)]
pub struct BlockSpec {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub transparent: bool,
    /// Custom (non-cube-culled) geometry: always drawn in full, in the
    /// transparent pass.
    pub individual_faces: bool,
    pub textures: [Option<AtlasQuad>; 6],
}

impl BlockSpec {
    /// Solid opaque cube using one texture on every face
    pub fn cube(id: BlockId, name: impl Into<String>, quad: AtlasQuad) -> Self {
        Self {
            id,
            name: name.into(),
            solid: true,
            transparent: false,
            individual_faces: false,
            textures: [Some(quad); 6],
        }
    }
}

/// A registered block type. Immutable after registration.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub transparent: bool,
    pub individual_faces: bool,
    textures: [Option<AtlasQuad>; 6],
}

impl BlockType {
    pub fn is_air(&self) -> bool {
        self.id == AIR
    }

    /// Atlas quad for one face
    pub fn face(&self, side: BlockSide) -> Result<&AtlasQuad> {
        self.textures[side.index()]
            .as_ref()
            .ok_or(Error::MissingTexture { block: self.id, side })
    }
}

/// Id-indexed table of block types
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    blocks: Vec<Option<BlockType>>,
}

impl BlockRegistry {
    /// Create a registry containing only the reserved air block
    pub fn new() -> Self {
        let air = BlockType {
            id: AIR,
            name: "air".to_string(),
            solid: false,
            transparent: true,
            individual_faces: false,
            textures: [None; 6],
        };
        Self { blocks: vec![Some(air)] }
    }

    /// Register a block type.
    ///
    /// Fails with `DuplicateBlockId` if the id is taken (air included) and with
    /// `MissingTexture` if a solid block lacks any face texture.
    pub fn register(&mut self, spec: BlockSpec) -> Result<&BlockType> {
        let index = spec.id as usize;
        if self.blocks.get(index).is_some_and(|slot| slot.is_some()) {
            return Err(Error::DuplicateBlockId(spec.id));
        }

        if spec.solid {
            if let Some(side) = BlockSide::ALL
                .into_iter()
                .find(|side| spec.textures[side.index()].is_none())
            {
                return Err(Error::MissingTexture { block: spec.id, side });
            }
        }

        if self.blocks.len() <= index {
            self.blocks.resize(index + 1, None);
        }

        log::debug!("Registered block {} '{}'", spec.id, spec.name);

        Ok(self.blocks[index].insert(BlockType {
            id: spec.id,
            name: spec.name,
            solid: spec.solid,
            transparent: spec.transparent,
            individual_faces: spec.individual_faces,
            textures: spec.textures,
        }))
    }

    /// Look up a block type by id
    pub fn get(&self, id: BlockId) -> Result<&BlockType> {
        self.blocks
            .get(id as usize)
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownBlockId(id))
    }

    /// Atlas quad for one face of a block
    pub fn face<'b>(&self, block: &'b BlockType, side: BlockSide) -> Result<&'b AtlasQuad> {
        block.face(side)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.get(id).is_ok()
    }

    /// Look a block up by its definition name
    pub fn by_name(&self, name: &str) -> Option<&BlockType> {
        self.iter().find(|block| block.name == name)
    }

    /// Number of registered block types (air included)
    pub fn len(&self) -> usize {
        self.blocks.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate registered block types in id order
    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.blocks.iter().flatten()
    }

    /// Build a registry from an ordered list of definitions, resolving every
    /// texture name against the atlas.
    pub fn from_definitions(defs: &[BlockDefinition], atlas: &TextureAtlas) -> Result<Self> {
        let mut registry = Self::new();

        for def in defs {
            if def.id == AIR {
                if def.solid {
                    return Err(Error::DuplicateBlockId(AIR));
                }
                log::debug!("Skipping definition '{}': id 0 is reserved for air", def.name);
                continue;
            }

            let mut textures = [None; 6];
            for side in BlockSide::ALL {
                if let Some(name) = def.texture_for(side) {
                    textures[side.index()] = Some(atlas.quad(name)?);
                }
            }

            registry.register(BlockSpec {
                id: def.id,
                name: def.name.clone(),
                solid: def.solid,
                transparent: def.transparent,
                individual_faces: def.individual,
                textures,
            })?;
        }

        log::info!("Block registry ready: {} block types", registry.len());
        Ok(registry)
    }

    /// Registry built from the bundled `assets/blocks.json`
    pub fn builtin() -> Result<Self> {
        let defs = BlockDefinition::builtin()?;
        let atlas = TextureAtlas::for_definitions(&defs);
        Self::from_definitions(&defs, &atlas)
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Bundled default block definitions
pub const BUILTIN_BLOCKS_JSON: &str = include_str!("../../assets/blocks.json");

/// One record of the external block definitions source.
///
/// Directional texture keys fall back to `side`, which falls back to
/// `texture`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: BlockId,
    pub name: String,
    #[serde(default)]
    pub solid: bool,
    #[serde(default)]
    pub transparent: bool,
    #[serde(default)]
    pub individual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
}

impl BlockDefinition {
    /// Texture name for a face after fall-through
    pub fn texture_for(&self, side: BlockSide) -> Option<&str> {
        let direct = match side {
            BlockSide::Top => &self.top,
            BlockSide::Bottom => &self.bottom,
            BlockSide::Left => &self.left,
            BlockSide::Right => &self.right,
            BlockSide::Front => &self.front,
            BlockSide::Back => &self.back,
        };
        direct
            .as_deref()
            .or(self.side.as_deref())
            .or(self.texture.as_deref())
    }

    /// Every texture name this definition mentions, in declaration order
    pub fn texture_names(&self) -> impl Iterator<Item = &str> {
        [
            &self.texture,
            &self.side,
            &self.top,
            &self.bottom,
            &self.left,
            &self.right,
            &self.front,
            &self.back,
        ]
        .into_iter()
        .filter_map(|name| name.as_deref())
    }

    /// Parse a JSON array of definitions
    pub fn parse_list(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON array of definitions from disk
    pub fn load_list(path: &Path) -> Result<Vec<Self>> {
        let json = std::fs::read_to_string(path)?;
        Self::parse_list(&json)
    }

    /// The bundled default definitions
    pub fn builtin() -> Result<Vec<Self>> {
        Self::parse_list(BUILTIN_BLOCKS_JSON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn quad(i: f32) -> AtlasQuad {
        AtlasQuad::new([[i, 0.0], [i + 1.0, 0.0], [i + 1.0, 1.0], [i, 1.0]])
    }

    #[test]
    fn test_new_registry_has_air() {
        let registry = BlockRegistry::new();
        assert_eq!(registry.len(), 1);
        let air = registry.get(AIR).unwrap();
        assert!(air.is_air());
        assert!(!air.solid);
        assert!(air.transparent);
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = BlockRegistry::new();
        registry.register(BlockSpec::cube(3, "stone", quad(1.0))).unwrap();

        let stone = registry.get(3).unwrap();
        assert_eq!(stone.name, "stone");
        assert!(stone.solid);
        assert_eq!(*stone.face(BlockSide::Front).unwrap(), quad(1.0));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(3));
        assert!(!registry.contains(2));
    }

    #[test]
    fn test_unknown_id() {
        let registry = BlockRegistry::new();
        assert!(matches!(registry.get(42), Err(Error::UnknownBlockId(42))));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = BlockRegistry::new();
        registry.register(BlockSpec::cube(1, "stone", quad(0.0))).unwrap();
        let again = registry.register(BlockSpec::cube(1, "dirt", quad(0.0)));
        assert!(matches!(again, Err(Error::DuplicateBlockId(1))));

        let air = registry.register(BlockSpec::cube(AIR, "fake_air", quad(0.0)));
        assert!(matches!(air, Err(Error::DuplicateBlockId(AIR))));
    }

    #[test]
    fn test_registry_face_matches_block_face() {
        let registry = BlockRegistry::builtin().unwrap();
        let grass = registry.by_name("grass").unwrap();
        for side in BlockSide::ALL {
            let quad = registry.face(grass, side).unwrap();
            assert_eq!(quad, grass.face(side).unwrap());
        }
    }

    #[test]
    fn test_solid_block_requires_all_faces() {
        let mut registry = BlockRegistry::new();
        let mut spec = BlockSpec::cube(5, "half_textured", quad(0.0));
        spec.textures[BlockSide::Bottom.index()] = None;

        let result = registry.register(spec);
        assert!(matches!(
            result,
            Err(Error::MissingTexture { block: 5, side: BlockSide::Bottom })
        ));
        assert!(!registry.contains(5));
    }

    #[test]
    fn test_non_solid_block_may_omit_textures() {
        let mut registry = BlockRegistry::new();
        registry
            .register(BlockSpec {
                id: 9,
                name: "void".to_string(),
                solid: false,
                transparent: true,
                individual_faces: false,
                textures: [None; 6],
            })
            .unwrap();

        let block = registry.get(9).unwrap();
        assert!(matches!(
            registry.face(block, BlockSide::Top),
            Err(Error::MissingTexture { block: 9, side: BlockSide::Top })
        ));
    }

    #[test]
    fn test_side_offsets_and_normals_agree() {
        for side in BlockSide::ALL {
            let o = side.offset();
            assert_eq!(side.normal(), [o.x as f32, o.y as f32, o.z as f32]);
            assert_eq!(o.abs().element_sum(), 1);
        }
        assert_eq!(BlockSide::Front.offset(), IVec3::Z);
    }

    #[test]
    fn test_texture_fallthrough() {
        let def = BlockDefinition {
            id: 1,
            name: "grass".to_string(),
            solid: true,
            texture: Some("dirt".to_string()),
            side: Some("grass_side".to_string()),
            top: Some("grass_top".to_string()),
            ..Default::default()
        };

        assert_eq!(def.texture_for(BlockSide::Top), Some("grass_top"));
        assert_eq!(def.texture_for(BlockSide::Front), Some("grass_side"));
        assert_eq!(def.texture_for(BlockSide::Bottom), Some("grass_side"));

        let plain = BlockDefinition {
            id: 2,
            name: "stone".to_string(),
            texture: Some("stone".to_string()),
            ..Default::default()
        };
        for side in BlockSide::ALL {
            assert_eq!(plain.texture_for(side), Some("stone"));
        }
    }

    #[test]
    fn test_from_definitions_resolves_textures() {
        let defs = BlockDefinition::parse_list(
            r#"[
                { "id": 0, "name": "air" },
                { "id": 1, "name": "stone", "solid": true, "texture": "stone" },
                { "id": 2, "name": "grass", "solid": true,
                  "texture": "dirt", "side": "grass_side", "top": "grass_top", "bottom": "dirt" }
            ]"#,
        )
        .unwrap();
        let atlas = TextureAtlas::for_definitions(&defs);
        let registry = BlockRegistry::from_definitions(&defs, &atlas).unwrap();

        assert_eq!(registry.len(), 3);
        let grass = registry.get(2).unwrap();
        assert_eq!(*grass.face(BlockSide::Top).unwrap(), atlas.quad("grass_top").unwrap());
        assert_eq!(*grass.face(BlockSide::Left).unwrap(), atlas.quad("grass_side").unwrap());
        assert_eq!(*grass.face(BlockSide::Bottom).unwrap(), atlas.quad("dirt").unwrap());
        assert_eq!(registry.by_name("stone").map(|b| b.id), Some(1));
    }

    #[test]
    fn test_from_definitions_missing_texture_blocks_startup() {
        let defs = BlockDefinition::parse_list(
            r#"[{ "id": 4, "name": "bare", "solid": true, "top": "stone" }]"#,
        )
        .unwrap();
        let atlas = TextureAtlas::for_definitions(&defs);
        let result = BlockRegistry::from_definitions(&defs, &atlas);
        assert!(matches!(result, Err(Error::MissingTexture { block: 4, .. })));
    }

    #[test]
    fn test_from_definitions_unknown_texture() {
        let defs = BlockDefinition::parse_list(
            r#"[{ "id": 4, "name": "odd", "solid": true, "texture": "nowhere" }]"#,
        )
        .unwrap();
        let atlas = TextureAtlas::pack(["stone"]);
        let result = BlockRegistry::from_definitions(&defs, &atlas);
        assert!(matches!(result, Err(Error::UnknownTexture(name)) if name == "nowhere"));
    }

    #[test]
    fn test_builtin_registry() {
        let registry = BlockRegistry::builtin().unwrap();
        for name in ["stone", "dirt", "grass", "sand", "log", "leaves", "water"] {
            assert!(registry.by_name(name).is_some(), "missing builtin block {}", name);
        }
        let leaves = registry.by_name("leaves").unwrap();
        assert!(leaves.solid && leaves.transparent);
        let tall_grass = registry.by_name("tall_grass").unwrap();
        assert!(tall_grass.individual_faces);
    }

    #[test]
    fn test_load_list_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "id": 7, "name": "brick", "solid": true, "texture": "brick" }}]"#)
            .unwrap();

        let defs = BlockDefinition::load_list(file.path()).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "brick");
        assert!(!defs[0].transparent);
    }
}
