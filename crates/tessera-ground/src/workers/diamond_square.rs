//! Diamond-square height generation with seamless tile edges.
//!
//! LOD-0 tiles start from four random corners and run every subdivision
//! level. Finer tiles copy their parent's samples onto their even grid points
//! and only run the last level. Edges shared with an already generated
//! neighbour of the same level are copied from it first and never
//! recomputed, so adjacent tiles agree on their boundary samples.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tessera_storage::{GridStorage, ReducibleStorage};
use tessera_tiles::TileCoordinates;

use crate::GroundError;
use crate::seed::tile_rng;
use crate::terrain::Terrain;
use crate::worker::{TerrainWorker, TileContext};

const STAGE: &str = "diamond-square";

/// Which edges were copied from neighbours.
#[derive(Clone, Copy, Debug, Default)]
struct Edges {
    left: bool,
    right: bool,
    bottom: bool,
    top: bool,
}

/// Generates tile heights by midpoint displacement.
pub struct DiamondSquareTerrain {
    seed: u64,
    jitter: f64,
    storage: GridStorage<Terrain>,
}

impl DiamondSquareTerrain {
    /// `jitter` in `[0, 1]` scales the random displacement of midpoints; 0
    /// yields plain bilinear refinement.
    #[must_use]
    pub fn new(seed: u64, jitter: f64) -> Self {
        Self {
            seed,
            jitter: jitter.clamp(0.0, 1.0),
            storage: GridStorage::new(),
        }
    }

    #[must_use]
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// The heights generated for `coords`, if still cached.
    #[must_use]
    pub fn terrain(&self, coords: &TileCoordinates) -> Option<&Terrain> {
        self.storage.get(coords)
    }

    /// Run diamond-square on `terrain` for `coords`, using cached neighbours
    /// and `parent` (required above LOD 0).
    ///
    /// # Errors
    ///
    /// [`GroundError::InvalidTerrainResolution`] unless the resolution is
    /// `2^k + 1`; [`GroundError::MissingParent`] if a refined tile has no
    /// parent terrain.
    pub fn generate(
        &self,
        coords: &TileCoordinates,
        parent: Option<&Terrain>,
        terrain: &mut Terrain,
    ) -> Result<(), GroundError> {
        let res = terrain.resolution();
        let levels = subdivision_levels(res).ok_or(GroundError::InvalidTerrainResolution(res))?;
        let mut rng = tile_rng(self.seed, STAGE, coords);

        let first_level = if coords.lod == 0 {
            let last = res - 1;
            for (x, y) in [(0, 0), (last, 0), (0, last), (last, last)] {
                terrain.set(x, y, rng.random::<f64>());
            }
            levels
        } else {
            let parent_coords = TileCoordinates::new(
                coords.x.div_euclid(2),
                coords.y.div_euclid(2),
                coords.z.div_euclid(2),
                coords.lod - 1,
            );
            let parent = self
                .storage
                .get(&parent_coords)
                .or(parent)
                .ok_or(GroundError::MissingParent(parent_coords))?;
            if parent.resolution() != res {
                return Err(GroundError::InvalidTerrainResolution(parent.resolution()));
            }
            copy_from_parent(coords, parent, terrain);
            1
        };

        let edges = self.copy_neighbour_edges(coords, terrain);
        for level in (1..=first_level).rev() {
            self.compute_level(terrain, level, edges, &mut rng);
        }
        Ok(())
    }

    fn copy_neighbour_edges(&self, coords: &TileCoordinates, terrain: &mut Terrain) -> Edges {
        let last = terrain.resolution() - 1;
        let [left, right, bottom, top] = coords.neighbours_2d();
        let mut edges = Edges::default();
        if let Some(n) = self.storage.get(&left) {
            terrain.copy_column(0, n, last);
            edges.left = true;
        }
        if let Some(n) = self.storage.get(&right) {
            terrain.copy_column(last, n, 0);
            edges.right = true;
        }
        if let Some(n) = self.storage.get(&bottom) {
            terrain.copy_row(0, n, last);
            edges.bottom = true;
        }
        if let Some(n) = self.storage.get(&top) {
            terrain.copy_row(last, n, 0);
            edges.top = true;
        }
        edges
    }

    /// Fill the midpoints of every square of side `2^level`.
    fn compute_level(&self, t: &mut Terrain, level: u32, edges: Edges, rng: &mut ChaCha8Rng) {
        let res = t.resolution();
        let n = 1usize << level;
        let hn = n / 2;
        let jitter = self.jitter;
        // One draw per midpoint whether or not it is written, so the sequence
        // does not depend on which neighbours were cached.
        let mut value = |h1: f64, h2: f64| h1 + (h2 - h1) * (0.5 + jitter * (rng.random::<f64>() - 0.5));

        for y in (0..res - 1).step_by(n) {
            for x in (0..res - 1).step_by(n) {
                let h00 = t.get(x, y);
                let h10 = t.get(x + n, y);
                let h01 = t.get(x, y + n);
                let h11 = t.get(x + n, y + n);

                let left = value(h00, h01);
                if x == 0 && !edges.left {
                    t.set(x, y + hn, left);
                }
                let bottom = value(h00, h10);
                if y == 0 && !edges.bottom {
                    t.set(x + hn, y, bottom);
                }
                let right = value(h10, h11);
                if !(x + n == res - 1 && edges.right) {
                    t.set(x + n, y + hn, right);
                }
                let top = value(h01, h11);
                if !(y + n == res - 1 && edges.top) {
                    t.set(x + hn, y + n, top);
                }

                let lm = t.get(x, y + hn);
                let rm = t.get(x + n, y + hn);
                let bm = t.get(x + hn, y);
                let tm = t.get(x + hn, y + n);
                let center = (value(lm, rm) + value(bm, tm)) / 2.0;
                t.set(x + hn, y + hn, center);
            }
        }
    }
}

impl TerrainWorker for DiamondSquareTerrain {
    fn name(&self) -> &str {
        STAGE
    }

    fn process_tile(&mut self, ctx: &mut TileContext<'_>) -> Result<(), GroundError> {
        let mut terrain = ctx.tile.terrain.clone();
        self.generate(&ctx.coords, ctx.parent.map(|p| &p.terrain), &mut terrain)?;
        ctx.tile.terrain.heights_mut().copy_from_slice(terrain.heights());
        self.storage.insert(ctx.coords, terrain);
        Ok(())
    }

    fn storage_mut(&mut self) -> Option<&mut dyn ReducibleStorage> {
        Some(&mut self.storage)
    }
}

/// `k` such that `resolution == 2^k + 1`, for `k >= 1`.
fn subdivision_levels(resolution: usize) -> Option<u32> {
    let cells = resolution.checked_sub(1)?;
    (cells >= 2 && cells.is_power_of_two()).then(|| cells.trailing_zeros())
}

/// Copy the parent's samples covering this child onto the child's even
/// sample positions.
fn copy_from_parent(coords: &TileCoordinates, parent: &Terrain, child: &mut Terrain) {
    let res = child.resolution();
    let half = (res - 1) / 2;
    let ox = coords.x.rem_euclid(2) as usize * half;
    let oy = coords.y.rem_euclid(2) as usize * half;
    for y in (0..res).step_by(2) {
        for x in (0..res).step_by(2) {
            child.set(x, y, parent.get(x / 2 + ox, y / 2 + oy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(ds: &mut DiamondSquareTerrain, coords: TileCoordinates, res: usize) -> Terrain {
        let mut terrain = Terrain::new(res);
        ds.generate(&coords, None, &mut terrain).unwrap();
        ds.storage.insert(coords, terrain.clone());
        terrain
    }

    #[test]
    fn test_rejects_bad_resolution() {
        let ds = DiamondSquareTerrain::new(1, 0.5);
        let mut terrain = Terrain::new(6);
        assert!(matches!(
            ds.generate(&TileCoordinates::new_2d(0, 0, 0), None, &mut terrain),
            Err(GroundError::InvalidTerrainResolution(6))
        ));
        assert_eq!(subdivision_levels(33), Some(5));
        assert_eq!(subdivision_levels(2), None);
    }

    #[test]
    fn test_same_seed_same_heights() {
        let mut a = DiamondSquareTerrain::new(9, 0.8);
        let mut b = DiamondSquareTerrain::new(9, 0.8);
        let coords = TileCoordinates::new_2d(2, -3, 0);
        assert_eq!(generated(&mut a, coords, 17), generated(&mut b, coords, 17));
    }

    #[test]
    fn test_neighbour_edges_shared() {
        let mut ds = DiamondSquareTerrain::new(5, 1.0);
        let center = generated(&mut ds, TileCoordinates::new_2d(0, 0, 0), 17);
        let right = generated(&mut ds, TileCoordinates::new_2d(1, 0, 0), 17);
        let top = generated(&mut ds, TileCoordinates::new_2d(0, 1, 0), 17);
        for i in 0..17 {
            assert_eq!(center.get(16, i), right.get(0, i), "vertical seam at {i}");
            assert_eq!(center.get(i, 16), top.get(i, 0), "horizontal seam at {i}");
        }
    }

    #[test]
    fn test_child_keeps_parent_samples() {
        let mut ds = DiamondSquareTerrain::new(3, 1.0);
        let parent = generated(&mut ds, TileCoordinates::new_2d(0, 0, 0), 9);
        let child = generated(&mut ds, TileCoordinates::new_2d(1, 1, 1), 9);
        for y in (0..9).step_by(2) {
            for x in (0..9).step_by(2) {
                assert_eq!(child.get(x, y), parent.get(x / 2 + 4, y / 2 + 4));
            }
        }
    }

    #[test]
    fn test_zero_jitter_is_bilinear() {
        let mut ds = DiamondSquareTerrain::new(3, 0.0);
        let terrain = generated(&mut ds, TileCoordinates::new_2d(0, 0, 0), 9);
        for (u, v) in [(0.5, 0.5), (0.25, 0.75), (0.125, 0.0)] {
            let corners = [terrain.get(0, 0), terrain.get(8, 0), terrain.get(0, 8), terrain.get(8, 8)];
            let expected = corners[0] * (1.0 - u) * (1.0 - v)
                + corners[1] * u * (1.0 - v)
                + corners[2] * (1.0 - u) * v
                + corners[3] * u * v;
            assert!((terrain.exact_height_at(u, v) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_missing_parent() {
        let ds = DiamondSquareTerrain::new(3, 1.0);
        let mut terrain = Terrain::new(9);
        assert!(matches!(
            ds.generate(&TileCoordinates::new_2d(1, 1, 1), None, &mut terrain),
            Err(GroundError::MissingParent(p)) if p == TileCoordinates::new_2d(0, 0, 0)
        ));
    }
}
