//! Tile addressing for level-of-detail terrain.
//!
//! A [`TileSystem`] maps continuous world positions to integer
//! [`TileCoordinates`] at a given level of detail, and a [`TileIter`] walks the
//! tiles a [`ResolutionModel`] needs, coarse to fine, returning each region of
//! space exactly once at the coarsest level that satisfies the model.

mod bbox;
mod coordinates;
mod iter;
mod resolution;
mod system;

pub use bbox::BoundingBox;
pub use coordinates::TileCoordinates;
pub use iter::TileIter;
pub use resolution::{ConstantResolution, DistanceResolution, OffsetResolution, ResolutionModel};
pub use system::{TileSystem, TileSystemError};
