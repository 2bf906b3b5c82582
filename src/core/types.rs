//! Core type aliases and re-exports

pub use glam::{IVec3, Vec3};

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Reject positions that would poison floor/cast arithmetic downstream.
pub fn ensure_finite(pos: Vec3) -> Result<Vec3> {
    if pos.is_finite() {
        Ok(pos)
    } else {
        Err(crate::core::error::Error::InvalidPosition(pos))
    }
}
