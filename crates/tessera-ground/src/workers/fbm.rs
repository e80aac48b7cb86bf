//! Fractal Brownian motion heights, sampled in world space.

use noise::{NoiseFn, Simplex};

use crate::GroundError;
use crate::worker::{TerrainWorker, TileContext};

/// Configuration of [`FbmTerrainGenerator`].
#[derive(Clone, Debug, PartialEq)]
pub struct FbmParams {
    pub seed: u64,
    /// Octaves at LOD 0. Each finer level adds one, up to `max_octaves`.
    pub octaves: u32,
    pub max_octaves: u32,
    pub lacunarity: f64,
    pub persistence: f64,
    /// Frequency of the first octave, in cycles per world unit.
    pub base_frequency: f64,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            max_octaves: 12,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.001,
        }
    }
}

/// Fills tiles with multi-octave simplex noise normalised to `[0, 1]`.
///
/// Samples depend only on world position and octave count, so tiles of one
/// level match along their edges without any neighbour bookkeeping.
pub struct FbmTerrainGenerator {
    noise: Simplex,
    params: FbmParams,
}

impl FbmTerrainGenerator {
    #[must_use]
    pub fn new(params: FbmParams) -> Self {
        let noise = Simplex::new(params.seed as u32);
        Self { noise, params }
    }

    #[must_use]
    pub fn params(&self) -> &FbmParams {
        &self.params
    }

    /// Octaves used for tiles at `lod`.
    #[must_use]
    pub fn octaves_at(&self, lod: u8) -> u32 {
        (self.params.octaves + u32::from(lod)).min(self.params.max_octaves)
    }

    /// Height in `[0, 1]` at world position `(x, y)` with `octaves` octaves.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64, octaves: u32) -> f64 {
        let mut total = 0.0;
        let mut norm = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = 1.0;

        for _ in 0..octaves {
            total += self.noise.get([x * frequency, y * frequency]) * amplitude;
            norm += amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        if norm == 0.0 {
            return 0.5;
        }
        (0.5 + 0.5 * total / norm).clamp(0.0, 1.0)
    }
}

impl TerrainWorker for FbmTerrainGenerator {
    fn name(&self) -> &str {
        "fbm"
    }

    fn process_tile(&mut self, ctx: &mut TileContext<'_>) -> Result<(), GroundError> {
        let octaves = self.octaves_at(ctx.coords.lod);
        let terrain = &mut ctx.tile.terrain;
        let res = terrain.resolution();
        for y in 0..res {
            for x in 0..res {
                let p = terrain.sample_position(x, y);
                let h = self.sample(p.x, p.y, octaves);
                terrain.set(x, y, h);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism_same_seed_same_coord() {
        let a = FbmTerrainGenerator::new(FbmParams {
            seed: 42,
            ..Default::default()
        });
        let b = FbmTerrainGenerator::new(FbmParams {
            seed: 42,
            ..Default::default()
        });
        assert_eq!(a.sample(100.0, 200.0, 6), b.sample(100.0, 200.0, 6));
    }

    #[test]
    fn test_samples_within_unit_range() {
        let generator = FbmTerrainGenerator::new(FbmParams::default());
        for i in 0..200 {
            let h = generator.sample(i as f64 * 37.0, i as f64 * -11.0, 8);
            assert!((0.0..=1.0).contains(&h), "height {h} out of range");
        }
        assert_eq!(generator.sample(1.0, 1.0, 0), 0.5);
    }

    #[test]
    fn test_octaves_grow_with_lod() {
        let generator = FbmTerrainGenerator::new(FbmParams {
            octaves: 3,
            max_octaves: 5,
            ..Default::default()
        });
        assert_eq!(generator.octaves_at(0), 3);
        assert_eq!(generator.octaves_at(1), 4);
        assert_eq!(generator.octaves_at(7), 5);
    }
}
