//! Block picking and collision probing on top of the grid walks

use crate::core::types::{IVec3, Result, Vec3};
use crate::math::ray::{Ray, walk_segment};

/// Solidity lookup for world cells
pub trait BlockQuery {
    /// True when the cell holds a solid block. Unloaded or out-of-range
    /// cells are not solid.
    fn is_solid(&self, cell: IVec3) -> bool;
}

/// Result of a successful pick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockTarget {
    /// First solid cell along the ray
    pub hit: IVec3,
    /// Last free cell before `hit`, where a placed block would go. `None`
    /// when the ray starts inside a solid cell.
    pub place: Option<IVec3>,
}

/// Find the block a viewer is looking at within `reach` blocks
pub fn pick_block<W: BlockQuery + ?Sized>(
    world: &W,
    origin: Vec3,
    direction: Vec3,
    reach: f32,
) -> Result<Option<BlockTarget>> {
    let ray = Ray::new(origin, direction.normalize_or_zero());

    let mut place = None;
    let hit = ray.walk(reach, |cell| {
        if world.is_solid(cell) {
            return true;
        }
        place = Some(cell);
        false
    })?;

    Ok(hit.map(|hit| BlockTarget { hit, place }))
}

/// Outcome of probing a straight move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    /// Nothing solid between the two points
    Clear,
    /// A solid cell was hit. `last_free` is the cell entered just before it,
    /// `None` when the start cell itself is solid.
    Blocked { at: IVec3, last_free: Option<IVec3> },
}

/// Walk the segment `from -> to` and stop at the first solid cell
pub fn probe_movement<W: BlockQuery + ?Sized>(world: &W, from: Vec3, to: Vec3) -> Result<Movement> {
    let mut last_free = None;
    let blocked = walk_segment(from, to, |cell, prev| {
        if world.is_solid(cell) {
            last_free = (cell != prev).then_some(prev);
            return true;
        }
        false
    })?;

    Ok(match blocked {
        Some(at) => Movement::Blocked { at, last_free },
        None => Movement::Clear,
    })
}
