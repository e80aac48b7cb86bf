//! Applies relief maps to generated heights.

use tessera_storage::{GridStorage, ReducibleStorage};
use tessera_tiles::TileCoordinates;
use tracing::debug;

use crate::GroundError;
use crate::relief::{ReliefMap, ReliefMapGenerator, ReliefMapParams};
use crate::seed::tile_rng;
use crate::worker::{TerrainWorker, TileContext};

/// Storage domain of relief maps; their keys index map cells, not tiles.
pub const RELIEF_DOMAIN: &str = "relief-maps";

/// Reshapes heights by the relief map covering each sample.
///
/// The world is cut into square cells of `map_size` units, each with its
/// own lazily generated [`ReliefMap`]. A height `h` becomes
/// `elevation + (h - 0.5) * roughness`, clamped to `[0, 1]`, where both
/// fields are read at the sample's world position. The result depends only
/// on position and input height, so it agrees across levels and tile edges.
pub struct ReliefMapModifier {
    seed: u64,
    map_size: f64,
    generator: ReliefMapGenerator,
    maps: GridStorage<ReliefMap>,
}

impl ReliefMapModifier {
    /// # Errors
    ///
    /// Rejects the same relief settings as [`ReliefMapGenerator::new`].
    pub fn new(seed: u64, map_size: f64, params: ReliefMapParams) -> Result<Self, GroundError> {
        Ok(Self {
            seed,
            map_size: map_size.max(f64::MIN_POSITIVE),
            generator: ReliefMapGenerator::new(params)?,
            maps: GridStorage::with_domain(RELIEF_DOMAIN),
        })
    }

    #[must_use]
    pub fn map_size(&self) -> f64 {
        self.map_size
    }

    pub fn generator_mut(&mut self) -> &mut ReliefMapGenerator {
        &mut self.generator
    }

    /// Number of relief maps currently cached.
    #[must_use]
    pub fn cached_maps(&self) -> usize {
        self.maps.size()
    }

    /// Elevation and roughness at world position `(x, y)`, generating the
    /// covering map if needed.
    pub fn relief_at(&mut self, x: f64, y: f64) -> (f64, f64) {
        let mx = (x / self.map_size).floor();
        let my = (y / self.map_size).floor();
        let key = TileCoordinates::new_2d(mx as i32, my as i32, 0);
        let u = x / self.map_size - mx;
        let v = y / self.map_size - my;

        let resolution = self.generator.params().resolution;
        let seed = self.seed;
        let map = self.maps.get_or_create_callback(
            key,
            || ReliefMap::new(resolution),
            |map| {
                let mut rng = tile_rng(seed, "relief-map", &key);
                self.generator.fill(map, &mut rng);
            },
        );
        (
            map.elevation.exact_height_at(u, v),
            map.roughness.exact_height_at(u, v),
        )
    }
}

impl TerrainWorker for ReliefMapModifier {
    fn name(&self) -> &str {
        "relief-map"
    }

    fn process_tile(&mut self, ctx: &mut TileContext<'_>) -> Result<(), GroundError> {
        let terrain = &mut ctx.tile.terrain;
        let res = terrain.resolution();
        for y in 0..res {
            for x in 0..res {
                let p = terrain.sample_position(x, y);
                let (elevation, roughness) = self.relief_at(p.x, p.y);
                let h = terrain.get(x, y);
                terrain.set(x, y, (elevation + (h - 0.5) * roughness).clamp(0.0, 1.0));
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), GroundError> {
        debug!(
            cached = self.maps.size(),
            hit_rate = self.maps.stats().hit_rate(),
            "relief maps after batch"
        );
        Ok(())
    }

    fn storage_mut(&mut self) -> Option<&mut dyn ReducibleStorage> {
        Some(&mut self.maps)
    }
}
