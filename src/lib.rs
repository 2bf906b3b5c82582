//! Blockworld - streaming block-voxel world core

pub mod core;
pub mod math;
pub mod voxel;
pub mod render;
pub mod streaming;
pub mod terrain;
