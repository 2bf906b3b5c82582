//! Top-level world configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::streaming::config::StreamingConfig;
use crate::terrain::generator::{TerrainPalette, TerrainParams};

/// Everything needed to stand up a streaming world. Every field has a default,
/// so a config file only needs to name what it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Chunk dimensions, view distance and cache sizing.
    pub streaming: StreamingConfig,
    /// Terrain noise parameters.
    pub terrain: TerrainParams,
    /// Block ids the terrain fill rule writes.
    pub palette: TerrainPalette,
}

impl WorldConfig {
    /// Parse a config from JSON text.
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::parse(&json)
    }
}
