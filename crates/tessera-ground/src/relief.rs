//! Macro relief: elevation and roughness fields interpolated between
//! randomly placed biome seeds.

use glam::DVec2;
use rand::Rng;

use crate::GroundError;
use crate::seed::det_sqrt;
use crate::terrain::Terrain;

/// World units per relief map pixel used to express biome density.
const PIXEL_UNIT: f64 = 10.0;

/// Maps a biome's elevation and a noise value in `[0, 1]` to its roughness.
pub trait DifferentialLaw: Send {
    fn roughness(&self, elevation: f64, noise: f64) -> f64;
}

impl<F> DifferentialLaw for F
where
    F: Fn(f64, f64) -> f64 + Send,
{
    fn roughness(&self, elevation: f64, noise: f64) -> f64 {
        self(elevation, noise)
    }
}

/// High ground tends to be rough, low ground tends to be smooth.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDifferentialLaw;

impl DifferentialLaw for DefaultDifferentialLaw {
    fn roughness(&self, elevation: f64, noise: f64) -> f64 {
        (noise * (0.25 + 0.75 * elevation)).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReliefMapParams {
    /// Samples per side of a generated map.
    pub resolution: usize,
    /// Biomes per `PIXEL_UNIT x PIXEL_UNIT` pixels.
    pub biome_density: f64,
    /// Inverse distance weighting exponent. Higher values give sharper
    /// biome borders.
    pub limit_brightness: u32,
}

impl Default for ReliefMapParams {
    fn default() -> Self {
        Self {
            resolution: 513,
            biome_density: 0.02,
            limit_brightness: 4,
        }
    }
}

/// Two correlated fields over one square domain.
#[derive(Clone, Debug, PartialEq)]
pub struct ReliefMap {
    /// Elevation bias in `[0, 1]`.
    pub elevation: Terrain,
    /// Height difference scale in `[0, 1]`.
    pub roughness: Terrain,
}

impl ReliefMap {
    /// A zeroed map of `resolution x resolution` samples.
    #[must_use]
    pub fn new(resolution: usize) -> Self {
        Self {
            elevation: Terrain::new(resolution),
            roughness: Terrain::new(resolution),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Biome {
    /// Position inside its grid cell.
    local: DVec2,
    position: DVec2,
    elevation: f64,
    roughness: f64,
}

/// Fills [`ReliefMap`]s.
pub struct ReliefMapGenerator {
    params: ReliefMapParams,
    law: Box<dyn DifferentialLaw>,
}

impl ReliefMapGenerator {
    /// # Errors
    ///
    /// [`GroundError::InvalidReliefResolution`] for a zero resolution and
    /// [`GroundError::InvalidBiomeDensity`] for a density that is not finite
    /// and positive.
    pub fn new(params: ReliefMapParams) -> Result<Self, GroundError> {
        if params.resolution == 0 {
            return Err(GroundError::InvalidReliefResolution(params.resolution));
        }
        if !params.biome_density.is_finite() || params.biome_density <= 0.0 {
            return Err(GroundError::InvalidBiomeDensity(params.biome_density));
        }
        Ok(Self {
            params,
            law: Box::new(DefaultDifferentialLaw),
        })
    }

    #[must_use]
    pub fn params(&self) -> &ReliefMapParams {
        &self.params
    }

    pub fn set_differential_law(&mut self, law: impl DifferentialLaw + 'static) {
        self.law = Box::new(law);
    }

    /// Mean distance between biome seeds is about twice this.
    #[must_use]
    pub fn min_distance(&self) -> f64 {
        PIXEL_UNIT / 2.0 / det_sqrt(self.params.biome_density)
    }

    /// Generate a map of the configured resolution.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> ReliefMap {
        let mut map = ReliefMap::new(self.params.resolution);
        self.fill(&mut map, rng);
        map
    }

    /// Overwrite both fields of `map` with a fresh relief.
    ///
    /// Seeds are placed one per grid cell, drawn without replacement, each
    /// inside the part of its cell not yet claimed by placed neighbours. Each
    /// sample then takes the inverse distance weighted mean of all seeds.
    pub fn fill<R: Rng + ?Sized>(&self, map: &mut ReliefMap, rng: &mut R) {
        let biomes = self.place_biomes(map.elevation.resolution(), rng);
        let exponent = self.params.limit_brightness as i32;
        let res = map.elevation.resolution();

        for y in 0..res {
            for x in 0..res {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let (elevation, roughness) = interpolate(&biomes, p, exponent);
                map.elevation.set(x, y, elevation);
                map.roughness.set(x, y, roughness);
            }
        }
    }

    fn place_biomes<R: Rng + ?Sized>(&self, resolution: usize, rng: &mut R) -> Vec<Biome> {
        let size = resolution as f64;
        let density = self.params.biome_density;
        // At most one cell per pixel.
        let slices = ((size / self.min_distance()) as usize).clamp(1, resolution.max(1));
        let slice = size / slices as f64;
        let count = ((density * size * size / (PIXEL_UNIT * PIXEL_UNIT)) as usize)
            .clamp(1, slices * slices);

        let mut cells: Vec<Option<Biome>> = vec![None; slices * slices];
        let mut free: Vec<(usize, usize)> = (0..slices)
            .flat_map(|x| (0..slices).map(move |y| (x, y)))
            .collect();
        let cell = |x: usize, y: usize| x * slices + y;

        for _ in 0..count {
            let (x, y) = free.swap_remove(rng.random_range(0..free.len()));

            let mut low = DVec2::ZERO;
            let mut high = DVec2::splat(slice);
            if x > 0
                && let Some(n) = cells[cell(x - 1, y)]
            {
                low.x = n.local.x;
            }
            if x + 1 < slices
                && let Some(n) = cells[cell(x + 1, y)]
            {
                high.x = n.local.x;
            }
            if y > 0
                && let Some(n) = cells[cell(x, y - 1)]
            {
                low.y = n.local.y;
            }
            if y + 1 < slices
                && let Some(n) = cells[cell(x, y + 1)]
            {
                high.y = n.local.y;
            }

            let r = DVec2::new(rng.random::<f64>(), rng.random::<f64>());
            let local = low + r * (high - low);
            let elevation = rng.random::<f64>();
            let roughness = self.law.roughness(elevation, rng.random::<f64>());
            cells[cell(x, y)] = Some(Biome {
                local,
                position: local + DVec2::new(x as f64, y as f64) * slice,
                elevation,
                roughness,
            });
        }

        cells.into_iter().flatten().collect()
    }
}

fn interpolate(biomes: &[Biome], p: DVec2, exponent: i32) -> (f64, f64) {
    let mut weights = 0.0;
    let mut elevation = 0.0;
    let mut roughness = 0.0;
    for biome in biomes {
        let d = det_sqrt(biome.position.distance_squared(p));
        if d == 0.0 {
            return (biome.elevation, biome.roughness);
        }
        let w = 1.0 / d.powi(exponent);
        weights += w;
        elevation += w * biome.elevation;
        roughness += w * biome.roughness;
    }
    if weights > 0.0 {
        (elevation / weights, roughness / weights)
    } else {
        (0.0, 0.0)
    }
}
