//! Tree placement and canopy shape

use crate::core::types::IVec3;

/// Largest root search radius the biome value can ask for
pub const MAX_SEARCH_RADIUS: i32 = 5;

/// A tree rooted on top of a world column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tree {
    /// World x of the trunk
    pub x: i32,
    /// World z of the trunk
    pub z: i32,
    /// Ground height under the trunk; the trunk starts one above it
    pub ground: i32,
    pub trunk_height: i32,
    pub canopy_radius: i32,
}

impl Tree {
    /// Size a tree from the biome value at its root
    pub fn from_biome(x: i32, z: i32, ground: i32, biome: f64) -> Self {
        Self {
            x,
            z,
            ground,
            trunk_height: trunk_height(biome),
            canopy_radius: canopy_radius(biome),
        }
    }

    /// Highest trunk cell, which is also the canopy centre
    pub fn top(&self) -> i32 {
        self.ground + self.trunk_height
    }

    /// Highest cell the canopy reaches
    pub fn ceiling(&self) -> i32 {
        self.top() + self.canopy_radius
    }

    /// Whether a world cell is part of the trunk
    pub fn is_trunk(&self, x: i32, y: i32, z: i32) -> bool {
        x == self.x && z == self.z && y > self.ground && y <= self.top()
    }

    /// World cells inside the spherical canopy, trunk excluded
    pub fn canopy(&self) -> impl Iterator<Item = IVec3> + '_ {
        let r = self.canopy_radius;
        let center = IVec3::new(self.x, self.top(), self.z);
        (-r..=r).flat_map(move |dy| {
            (-r..=r).flat_map(move |dz| {
                (-r..=r).filter_map(move |dx| {
                    let offset = IVec3::new(dx, dy, dz);
                    let cell = center + offset;
                    let inside = offset.length_squared() <= r * r;
                    (inside && !self.is_trunk(cell.x, cell.y, cell.z)).then_some(cell)
                })
            })
        })
    }
}

/// Root search radius for a biome value in `[0, 1]`
pub fn search_radius(biome: f64) -> i32 {
    2 + (biome * 3.0).round() as i32
}

pub fn trunk_height(biome: f64) -> i32 {
    4 + (biome * 3.0).floor() as i32
}

pub fn canopy_radius(biome: f64) -> i32 {
    2 + biome.round() as i32
}

/// Tree-scale noise samples over a chunk plus a border wide enough for any
/// search radius
pub struct TreeValueGrid {
    min_x: i32,
    min_z: i32,
    size: i32,
    values: Vec<f64>,
}

impl TreeValueGrid {
    /// Sample `value(x, z)` over the square starting at world `(x0, z0)` with
    /// side `width`, padded by [`MAX_SEARCH_RADIUS`] on every side
    pub fn sample<F>(x0: i32, z0: i32, width: i32, value: F) -> Self
    where
        F: Fn(i32, i32) -> f64,
    {
        let min_x = x0 - MAX_SEARCH_RADIUS;
        let min_z = z0 - MAX_SEARCH_RADIUS;
        let size = width + 2 * MAX_SEARCH_RADIUS;

        let mut values = Vec::with_capacity((size * size) as usize);
        for dz in 0..size {
            for dx in 0..size {
                values.push(value(min_x + dx, min_z + dz));
            }
        }

        Self { min_x, min_z, size, values }
    }

    fn get(&self, x: i32, z: i32) -> f64 {
        let dx = x - self.min_x;
        let dz = z - self.min_z;
        debug_assert!(dx >= 0 && dx < self.size && dz >= 0 && dz < self.size);
        self.values[(dz * self.size + dx) as usize]
    }

    /// True if the value at `(x, z)` is strictly greater than every other value
    /// in the square of the given radius around it
    pub fn is_local_max(&self, x: i32, z: i32, radius: i32) -> bool {
        let radius = radius.min(MAX_SEARCH_RADIUS);
        let center = self.get(x, z);

        for dz in -radius..=radius {
            for dx in -radius..=radius {
                if (dx, dz) != (0, 0) && self.get(x + dx, z + dz) >= center {
                    return false;
                }
            }
        }
        true
    }
}
