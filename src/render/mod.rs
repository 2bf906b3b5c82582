//! Rendering interfaces

pub mod backend;

pub use backend::{BackendStats, HeadlessBackend, MeshHandle, MeshKind, RenderBackend};
