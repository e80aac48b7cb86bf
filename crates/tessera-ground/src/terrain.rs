//! Square height fields.

use glam::DVec3;
use tessera_tiles::BoundingBox;

use crate::GroundError;
use crate::seed::{det_atan, det_sqrt};

/// A square grid of height samples, normalised to `[0, 1]` by convention,
/// placed in the world by a bounding box whose `z` extent maps 0 and 1 to
/// altitudes.
///
/// Sample `(0, 0)` sits at the box's minimum corner and
/// `(resolution - 1, resolution - 1)` at its maximum corner, so neighbouring
/// tiles share their boundary samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    resolution: usize,
    heights: Vec<f64>,
    bounds: BoundingBox,
}

impl Terrain {
    /// A flat terrain of `resolution x resolution` samples at height 0.
    ///
    /// # Panics
    ///
    /// Panics if `resolution` is 0.
    #[must_use]
    pub fn new(resolution: usize) -> Self {
        assert!(resolution > 0, "terrain resolution must be positive");
        Self {
            resolution,
            heights: vec![0.0; resolution * resolution],
            bounds: BoundingBox::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 1.0)),
        }
    }

    /// Build a terrain from rows of samples (`rows[y][x]`).
    ///
    /// # Errors
    ///
    /// [`GroundError::NonSquareTerrain`] if there are no rows or a row's
    /// length differs from the row count.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, GroundError> {
        let size = rows.len();
        if let Some(row) = rows.iter().find(|row| row.len() != size) {
            return Err(GroundError::NonSquareTerrain {
                rows: size,
                columns: row.len(),
            });
        }
        if size == 0 {
            return Err(GroundError::NonSquareTerrain {
                rows: 0,
                columns: 0,
            });
        }
        let mut terrain = Self::new(size);
        for (y, row) in rows.iter().enumerate() {
            for (x, value) in row.iter().enumerate() {
                terrain.set(x, y, *value);
            }
        }
        Ok(terrain)
    }

    #[must_use]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.resolution && y < self.resolution);
        y * self.resolution + x
    }

    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.heights[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        let i = self.index(x, y);
        self.heights[i] = value;
    }

    /// Samples in row-major order (`y * resolution + x`).
    #[must_use]
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn heights_mut(&mut self) -> &mut [f64] {
        &mut self.heights
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: BoundingBox) {
        self.bounds = bounds;
    }

    /// World position of sample `(x, y)`, altitude included.
    #[must_use]
    pub fn sample_position(&self, x: usize, y: usize) -> DVec3 {
        let step = (self.resolution.max(2) - 1) as f64;
        let dims = self.bounds.dimensions();
        DVec3::new(
            self.bounds.min.x + dims.x * x as f64 / step,
            self.bounds.min.y + dims.y * y as f64 / step,
            self.bounds.min.z + dims.z * self.get(x, y),
        )
    }

    /// Bilinear height at normalised coordinates `(u, v)` in `[0, 1]`
    /// (clamped).
    #[must_use]
    pub fn exact_height_at(&self, u: f64, v: f64) -> f64 {
        if self.resolution == 1 {
            return self.heights[0];
        }
        let max = (self.resolution - 1) as f64;
        let fx = u.clamp(0.0, 1.0) * max;
        let fy = v.clamp(0.0, 1.0) * max;
        let x0 = (fx.floor() as usize).min(self.resolution - 2);
        let y0 = (fy.floor() as usize).min(self.resolution - 2);
        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;

        let h00 = self.get(x0, y0);
        let h10 = self.get(x0 + 1, y0);
        let h01 = self.get(x0, y0 + 1);
        let h11 = self.get(x0 + 1, y0 + 1);
        let bottom = h00 + (h10 - h00) * tx;
        let top = h01 + (h11 - h01) * tx;
        bottom + (top - bottom) * ty
    }

    /// Gradient magnitude at `(u, v)`: altitude change per horizontal world
    /// unit, using the bounding box to scale both. Falls back to normalised
    /// units on flat box axes.
    #[must_use]
    pub fn slope_at(&self, u: f64, v: f64) -> f64 {
        if self.resolution < 2 {
            return 0.0;
        }
        let du = 1.0 / (self.resolution - 1) as f64;
        let dims = self.bounds.dimensions();
        let scale = |d: f64| if d > 0.0 { d } else { 1.0 };
        let altitude = scale(dims.z);

        let dx = (self.exact_height_at(u + du, v) - self.exact_height_at(u - du, v)) * altitude
            / (2.0 * du * scale(dims.x));
        let dy = (self.exact_height_at(u, v + du) - self.exact_height_at(u, v - du)) * altitude
            / (2.0 * du * scale(dims.y));
        det_sqrt(dx * dx + dy * dy)
    }

    /// Slope mapped to `[0, 1)`: `atan(slope) * 2 / pi`.
    #[must_use]
    pub fn steepness_at(&self, u: f64, v: f64) -> f64 {
        det_atan(self.slope_at(u, v)) * std::f64::consts::FRAC_2_PI
    }

    // --- Edge access, used to share boundaries between neighbours ---

    /// Copy column `from_x` of `other` into column `to_x` of `self`.
    pub(crate) fn copy_column(&mut self, to_x: usize, other: &Terrain, from_x: usize) {
        for y in 0..self.resolution.min(other.resolution) {
            self.set(to_x, y, other.get(from_x, y));
        }
    }

    /// Copy row `from_y` of `other` into row `to_y` of `self`.
    pub(crate) fn copy_row(&mut self, to_y: usize, other: &Terrain, from_y: usize) {
        for x in 0..self.resolution.min(other.resolution) {
            self.set(x, to_y, other.get(x, from_y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_non_square() {
        let rows = vec![vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]];
        assert!(matches!(
            Terrain::from_rows(&rows),
            Err(GroundError::NonSquareTerrain {
                rows: 2,
                columns: 3
            })
        ));
        assert!(Terrain::from_rows(&[]).is_err());
    }

    #[test]
    fn test_from_rows_layout() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let terrain = Terrain::from_rows(&rows).unwrap();
        assert_eq!(terrain.get(1, 0), 2.0);
        assert_eq!(terrain.get(0, 1), 3.0);
    }

    #[test]
    fn test_bilinear_interpolation() {
        let terrain = Terrain::from_rows(&[vec![0.0, 1.0], vec![1.0, 2.0]]).unwrap();
        assert_eq!(terrain.exact_height_at(0.0, 0.0), 0.0);
        assert_eq!(terrain.exact_height_at(1.0, 1.0), 2.0);
        assert!((terrain.exact_height_at(0.5, 0.5) - 1.0).abs() < 1e-12);
        assert!((terrain.exact_height_at(0.25, 0.0) - 0.25).abs() < 1e-12);
        // Clamped outside the unit square.
        assert_eq!(terrain.exact_height_at(-3.0, 5.0), 1.0);
    }

    #[test]
    fn test_slope_of_ramp() {
        // Height rises by 1 over the tile in x; box is 100 wide and 50 high.
        let mut terrain = Terrain::new(5);
        for y in 0..5 {
            for x in 0..5 {
                terrain.set(x, y, x as f64 / 4.0);
            }
        }
        terrain.set_bounds(BoundingBox::new(DVec3::ZERO, DVec3::new(100.0, 100.0, 50.0)));
        assert!((terrain.slope_at(0.5, 0.5) - 0.5).abs() < 1e-9);
        let flat = Terrain::new(5);
        assert_eq!(flat.slope_at(0.5, 0.5), 0.0);
        assert_eq!(flat.steepness_at(0.5, 0.5), 0.0);
    }

    #[test]
    fn test_sample_position_spans_bounds() {
        let mut terrain = Terrain::new(3);
        terrain.set(2, 2, 1.0);
        terrain.set_bounds(BoundingBox::new(
            DVec3::new(10.0, 20.0, -5.0),
            DVec3::new(30.0, 40.0, 5.0),
        ));
        assert_eq!(terrain.sample_position(0, 0), DVec3::new(10.0, 20.0, -5.0));
        assert_eq!(terrain.sample_position(2, 2), DVec3::new(30.0, 40.0, 5.0));
    }
}
