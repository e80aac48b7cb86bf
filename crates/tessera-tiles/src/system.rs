//! The tile system: world position <-> tile coordinates at every LOD.

use glam::DVec3;

use crate::{BoundingBox, ResolutionModel, TileCoordinates, TileIter};

/// Errors raised when building a [`TileSystem`] or starting a traversal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TileSystemError {
    /// The derived buffer resolution is below one sample per tile.
    #[error(
        "base size {base_size} at base resolution {base_resolution} leaves less than one point per tile"
    )]
    InsufficientResolution {
        base_size: f64,
        base_resolution: f64,
    },

    /// The per-level scale factor must be an integer of at least 2.
    #[error("tile factor must be at least 2, got {0}")]
    InvalidFactor(u32),

    /// Base sizes must be finite and non-negative, with at least one tiled axis.
    #[error("invalid base tile size {0:?}")]
    InvalidBaseSize(DVec3),

    /// Tile indices at `max_lod` would not fit the coordinate range.
    #[error("max lod {max_lod} exceeds the supported maximum {limit}")]
    TooManyLods { max_lod: u8, limit: u8 },

    /// Traversal bounds are infinite along an axis the system tiles.
    #[error("traversal bounds are not finite on a tiled axis: {0:?}")]
    UnboundedRegion(BoundingBox),
}

/// Largest number of tiles per axis allowed at the finest LOD.
const MAX_TILES_PER_AXIS: u64 = 1 << 30;

/// Maps world positions to tile coordinates and back.
///
/// LOD 0 tiles have size `base_size`; every level divides the tile size by
/// `factor` while keeping `buffer_resolution` samples per tile, so the sample
/// density grows by `factor` per level. Axes with a base size of zero are not
/// tiled: their coordinate is always 0.
///
/// A `TileSystem` is immutable after construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSystem {
    max_lod: u8,
    base_size: DVec3,
    buffer_resolution: u32,
    factor: u32,
}

impl TileSystem {
    /// Create a tile system.
    ///
    /// # Errors
    ///
    /// Fails if `factor < 2`, if `base_size` has a negative or non-finite
    /// component or no positive one, if `buffer_resolution` is 0, or if
    /// `factor^max_lod` tiles per axis would overflow the coordinate range.
    pub fn new(
        max_lod: u8,
        base_size: DVec3,
        buffer_resolution: u32,
        factor: u32,
    ) -> Result<Self, TileSystemError> {
        if factor < 2 {
            return Err(TileSystemError::InvalidFactor(factor));
        }
        let valid_axes = base_size.to_array().iter().all(|s| s.is_finite() && *s >= 0.0);
        if !valid_axes || base_size.max_element() <= 0.0 {
            return Err(TileSystemError::InvalidBaseSize(base_size));
        }
        let tiles_per_axis = u64::from(factor).checked_pow(u32::from(max_lod));
        if !tiles_per_axis.is_some_and(|n| n <= MAX_TILES_PER_AXIS) {
            let limit = (MAX_TILES_PER_AXIS as f64).log(f64::from(factor)).floor() as u8;
            return Err(TileSystemError::TooManyLods { max_lod, limit });
        }
        let system = Self {
            max_lod,
            base_size,
            buffer_resolution,
            factor,
        };
        if buffer_resolution == 0 {
            return Err(TileSystemError::InsufficientResolution {
                base_size: system.reference_size(),
                base_resolution: 0.0,
            });
        }
        Ok(system)
    }

    /// Create a cubic tile system from a base tile size and the sample
    /// density (points per world unit) wanted at LOD 1.
    ///
    /// The buffer resolution is `floor(base_resolution * base_size / 2)`, so
    /// LOD 1 tiles sample space at `base_resolution` and LOD 0 at half of it.
    ///
    /// # Errors
    ///
    /// [`TileSystemError::InsufficientResolution`] if that leaves less than
    /// one point per tile, plus the conditions of [`TileSystem::new`].
    pub fn from_base_resolution(
        base_size: f64,
        max_lod: u8,
        base_resolution: f64,
    ) -> Result<Self, TileSystemError> {
        const FACTOR: u32 = 2;
        let buffer = (base_resolution * base_size / f64::from(FACTOR)).floor();
        if !(buffer >= 1.0) {
            return Err(TileSystemError::InsufficientResolution {
                base_size,
                base_resolution,
            });
        }
        Self::new(
            max_lod,
            DVec3::splat(base_size),
            buffer.min(f64::from(u32::MAX)) as u32,
            FACTOR,
        )
    }

    #[must_use]
    pub fn max_lod(&self) -> u8 {
        self.max_lod
    }

    #[must_use]
    pub fn base_size(&self) -> DVec3 {
        self.base_size
    }

    /// Samples per tile along each tiled axis, identical at every LOD.
    #[must_use]
    pub fn buffer_resolution(&self) -> u32 {
        self.buffer_resolution
    }

    #[must_use]
    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Whether `axis` (0 = x, 1 = y, 2 = z) is subdivided into tiles.
    #[must_use]
    pub fn is_tiled_axis(&self, axis: usize) -> bool {
        self.base_size[axis] > 0.0
    }

    /// Smallest positive base size; the axis that limits sample density.
    fn reference_size(&self) -> f64 {
        self.base_size
            .to_array()
            .into_iter()
            .filter(|s| *s > 0.0)
            .fold(f64::INFINITY, f64::min)
    }

    fn scale(&self, lod: u8) -> f64 {
        f64::from(self.factor).powi(i32::from(lod))
    }

    /// World size of a tile at `lod`.
    #[must_use]
    pub fn tile_size(&self, lod: u8) -> DVec3 {
        self.base_size / self.scale(lod)
    }

    /// Sample density (points per world unit) of tiles at `lod`.
    #[must_use]
    pub fn resolution_at(&self, lod: u8) -> f64 {
        f64::from(self.buffer_resolution) * self.scale(lod) / self.reference_size()
    }

    /// The coarsest LOD whose sample density meets `resolution`, clamped to
    /// `[0, max_lod]`. Non-decreasing in `resolution`.
    #[must_use]
    pub fn lod_for(&self, resolution: f64) -> u8 {
        let mut lod = 0;
        while lod < self.max_lod && self.resolution_at(lod) < resolution {
            lod += 1;
        }
        lod
    }

    /// Coordinates of the tile at `lod` containing `position`.
    ///
    /// Uses floor division, so tiles partition space as half-open cells
    /// `[offset, offset + size)` on every tiled axis. Indices saturate at the
    /// `i32` range.
    #[must_use]
    pub fn tile_coordinates(&self, position: DVec3, lod: u8) -> TileCoordinates {
        let size = self.tile_size(lod);
        let index = |axis: usize| -> i32 {
            if size[axis] > 0.0 {
                (position[axis] / size[axis]).floor() as i32
            } else {
                0
            }
        };
        TileCoordinates::new(index(0), index(1), index(2), lod)
    }

    /// World-space minimum corner of a tile.
    #[must_use]
    pub fn tile_offset(&self, coords: &TileCoordinates) -> DVec3 {
        let pos = DVec3::new(
            f64::from(coords.x),
            f64::from(coords.y),
            f64::from(coords.z),
        );
        pos * self.tile_size(coords.lod)
    }

    /// World-space bounds of a tile. Untiled axes have zero thickness.
    #[must_use]
    pub fn tile_bounds(&self, coords: &TileCoordinates) -> BoundingBox {
        BoundingBox::from_min_size(self.tile_offset(coords), self.tile_size(coords.lod))
    }

    /// The tile one level coarser that contains `coords`, or `None` at LOD 0.
    #[must_use]
    pub fn parent_coordinates(&self, coords: &TileCoordinates) -> Option<TileCoordinates> {
        if coords.lod == 0 {
            return None;
        }
        let f = self.factor as i32;
        Some(TileCoordinates::new(
            coords.x.div_euclid(f),
            coords.y.div_euclid(f),
            coords.z.div_euclid(f),
            coords.lod - 1,
        ))
    }

    /// Position of `position` inside its tile at `lod`, normalised to `[0, 1)`
    /// on every tiled axis and 0 on untiled axes.
    #[must_use]
    pub fn local_coordinates(&self, position: DVec3, lod: u8) -> DVec3 {
        let coords = self.tile_coordinates(position, lod);
        let offset = self.tile_offset(&coords);
        let size = self.tile_size(lod);
        let mut local = DVec3::ZERO;
        for axis in 0..3 {
            if size[axis] > 0.0 {
                local[axis] = (position[axis] - offset[axis]) / size[axis];
            }
        }
        local
    }

    /// Start a traversal of the tiles `model` needs over its own bounds.
    ///
    /// # Errors
    ///
    /// [`TileSystemError::UnboundedRegion`] if the bounds are infinite on a
    /// tiled axis.
    pub fn iterate<'a, M>(&'a self, model: &'a M) -> Result<TileIter<'a, M>, TileSystemError>
    where
        M: ResolutionModel + ?Sized,
    {
        self.iterate_within(model, model.bounds())
    }

    /// Start a traversal of the tiles `model` needs inside `bounds`.
    ///
    /// # Errors
    ///
    /// [`TileSystemError::UnboundedRegion`] if `bounds` is infinite on a
    /// tiled axis.
    pub fn iterate_within<'a, M>(
        &'a self,
        model: &'a M,
        bounds: BoundingBox,
    ) -> Result<TileIter<'a, M>, TileSystemError>
    where
        M: ResolutionModel + ?Sized,
    {
        if (0..3).any(|axis| self.is_tiled_axis(axis) && !bounds.is_finite_on(axis)) {
            return Err(TileSystemError::UnboundedRegion(bounds));
        }
        Ok(TileIter::new(self, model, bounds))
    }
}
