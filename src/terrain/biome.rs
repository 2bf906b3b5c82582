//! Biome field driving tree density and size

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::generator::TerrainParams;

/// Biome noise, sampled at two scales: a slow one that decides how wooded a
/// region is, and a fast one whose local maxima mark tree roots.
pub struct BiomeMap {
    noise: Fbm<Perlin>,
    biome_scale: f64,
    tree_scale: f64,
}

impl BiomeMap {
    /// Create a biome map decorrelated from the height field by
    /// `biome_seed_offset`
    pub fn new(params: &TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed.wrapping_add(params.biome_seed_offset))
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self {
            noise,
            biome_scale: params.biome_scale as f64,
            tree_scale: params.tree_scale as f64,
        }
    }

    /// Biome value at a world column, mapped to `[0, 1]`
    pub fn biome_at(&self, x: i32, z: i32) -> f64 {
        let n = self
            .noise
            .get([x as f64 / self.biome_scale, z as f64 / self.biome_scale]);
        ((n + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Raw biome noise at tree scale
    pub fn tree_value_at(&self, x: i32, z: i32) -> f64 {
        self.noise
            .get([x as f64 / self.tree_scale, z as f64 / self.tree_scale])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biome_range() {
        let biome_map = BiomeMap::new(&TerrainParams::default());

        for x in [-1000, -17, 0, 5, 1000] {
            for z in [-1000, -3, 0, 64, 1000] {
                let b = biome_map.biome_at(x, z);
                assert!((0.0..=1.0).contains(&b), "biome {} out of range", b);
            }
        }
    }

    #[test]
    fn test_biome_is_deterministic() {
        let a = BiomeMap::new(&TerrainParams::default());
        let b = BiomeMap::new(&TerrainParams::default());

        for (x, z) in [(0, 0), (13, -40), (-200, 77)] {
            assert_eq!(a.biome_at(x, z), b.biome_at(x, z));
            assert_eq!(a.tree_value_at(x, z), b.tree_value_at(x, z));
        }
    }

    #[test]
    fn test_tree_scale_varies_faster() {
        let biome_map = BiomeMap::new(&TerrainParams::default());

        // Neighbouring columns differ noticeably at tree scale but barely at
        // biome scale.
        let mut tree_delta = 0.0;
        let mut biome_delta = 0.0;
        for x in 0..64 {
            tree_delta += (biome_map.tree_value_at(x + 1, 7) - biome_map.tree_value_at(x, 7)).abs();
            biome_delta += (biome_map.biome_at(x + 1, 7) - biome_map.biome_at(x, 7)).abs();
        }
        assert!(tree_delta > biome_delta);
    }
}
