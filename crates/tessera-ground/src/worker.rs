//! Pluggable tile generation stages.

use std::any::Any;
use std::fmt;

use tessera_storage::ReducibleStorage;
use tessera_tiles::{TileCoordinates, TileSystem};

use crate::GroundError;
use crate::tile::GroundTile;

/// Handle returned when a worker is added to a ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub(crate) usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inclusive range of levels a worker runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodRange {
    pub min: u8,
    pub max: u8,
}

impl LodRange {
    /// Every level.
    pub const ALL: LodRange = LodRange {
        min: 0,
        max: u8::MAX,
    };

    /// # Errors
    ///
    /// [`GroundError::InvalidLodRange`] if `min > max`.
    pub fn new(min: u8, max: u8) -> Result<Self, GroundError> {
        if min > max {
            return Err(GroundError::InvalidLodRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn contains(&self, lod: u8) -> bool {
        (self.min..=self.max).contains(&lod)
    }
}

impl Default for LodRange {
    fn default() -> Self {
        Self::ALL
    }
}

/// What a worker sees of the tile it processes.
pub struct TileContext<'a> {
    pub coords: TileCoordinates,
    /// The tile being generated. Not visible to other tiles until the whole
    /// batch is done.
    pub tile: &'a mut GroundTile,
    /// The already generated parent, `None` at LOD 0.
    pub parent: Option<&'a GroundTile>,
    pub system: &'a TileSystem,
    pub min_altitude: f64,
    pub max_altitude: f64,
}

/// One stage of the generation pipeline.
///
/// Workers run in insertion order on every tile of their [`LodRange`]; a tile
/// is always processed after its parent. A worker may keep per-tile state in
/// its own storage, which the ground then trims with its tile cache.
pub trait TerrainWorker: Any {
    /// Short name for logs and errors.
    fn name(&self) -> &str;

    /// Fill in `ctx.tile`.
    ///
    /// # Errors
    ///
    /// Any error aborts the collect; tiles of the current batch are discarded.
    fn process_tile(&mut self, ctx: &mut TileContext<'_>) -> Result<(), GroundError>;

    /// Called once after every tile of a batch has been processed.
    ///
    /// # Errors
    ///
    /// As for [`process_tile`](Self::process_tile).
    fn flush(&mut self) -> Result<(), GroundError> {
        Ok(())
    }

    /// Per-tile state the ground should evict along with its tiles.
    fn storage_mut(&mut self) -> Option<&mut dyn ReducibleStorage> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lod_range() {
        let range = LodRange::new(2, 4).unwrap();
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(LodRange::default().contains(u8::MAX));
        assert!(matches!(
            LodRange::new(3, 1),
            Err(GroundError::InvalidLodRange { min: 3, max: 1 })
        ));
    }

    #[test]
    fn test_worker_id_display() {
        assert_eq!(WorkerId(3).to_string(), "#3");
    }
}
