//! The per-tile payload owned by the ground cache.

use glam::DVec3;
use tessera_tiles::{BoundingBox, TileCoordinates, TileSystem};

use crate::image::{Image, PixelFormat};
use crate::terrain::Terrain;

/// Height field and texture of one generated tile.
///
/// A fresh tile is flat with a fully transparent texture; workers fill both
/// in place.
#[derive(Clone, Debug)]
pub struct GroundTile {
    coords: TileCoordinates,
    pub terrain: Terrain,
    pub texture: Image,
}

impl GroundTile {
    /// Allocate an empty tile placed by `system`, with heights in `[0, 1]`
    /// mapped to `[min_altitude, max_altitude]`.
    #[must_use]
    pub fn new(
        coords: TileCoordinates,
        system: &TileSystem,
        terrain_resolution: usize,
        texture_resolution: u32,
        min_altitude: f64,
        max_altitude: f64,
    ) -> Self {
        let offset = system.tile_offset(&coords);
        let size = system.tile_size(coords.lod);
        let mut terrain = Terrain::new(terrain_resolution);
        terrain.set_bounds(BoundingBox::new(
            DVec3::new(offset.x, offset.y, min_altitude),
            DVec3::new(offset.x + size.x, offset.y + size.y, max_altitude),
        ));
        Self {
            coords,
            terrain,
            texture: Image::new(texture_resolution, texture_resolution, PixelFormat::Rgba),
        }
    }

    #[must_use]
    pub fn coords(&self) -> TileCoordinates {
        self.coords
    }
}
