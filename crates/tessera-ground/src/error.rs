//! Error type of the ground generation pipeline.

use tessera_tiles::{TileCoordinates, TileSystemError};

use crate::image::ImageError;
use crate::worker::WorkerId;

/// Errors raised while configuring or running a [`HeightmapGround`](crate::HeightmapGround).
#[derive(Debug, thiserror::Error)]
pub enum GroundError {
    /// The tile system could not be built or traversed.
    #[error(transparent)]
    TileSystem(#[from] TileSystemError),

    /// An image could not be built or converted.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Height data must have as many samples per row as it has rows.
    #[error("terrain must be square: {rows} rows but a row holds {columns} samples")]
    NonSquareTerrain { rows: usize, columns: usize },

    /// The terrain resolution does not fit the algorithm.
    #[error("terrain resolution {0} is not of the form 2^k + 1")]
    InvalidTerrainResolution(usize),

    /// A relief map needs at least one sample per side.
    #[error("relief map resolution must be positive, got {0}")]
    InvalidReliefResolution(usize),

    /// Biome density must be finite and positive.
    #[error("biome density must be finite and positive, got {0}")]
    InvalidBiomeDensity(f64),

    /// A texturing worker was run without a texture provider.
    #[error("texture provider is not set")]
    MissingTextureProvider,

    /// The texture provider has nothing for a layer.
    #[error("texture provider has no texture for layer {layer} at lod {lod}")]
    MissingLayerTexture { layer: usize, lod: u8 },

    /// A tile was generated before its parent.
    #[error("parent tile {0} has not been generated")]
    MissingParent(TileCoordinates),

    /// A tile expected in the cache is absent.
    #[error("tile {0} has not been generated")]
    TileNotGenerated(TileCoordinates),

    /// Traversal requested more tiles than one collect may generate.
    #[error("traversal yielded more than {limit} tiles")]
    TooManyTiles { limit: usize },

    /// No worker is registered under this id.
    #[error("no worker registered with id {0}")]
    WorkerNotFound(WorkerId),

    /// `min` is greater than `max`.
    #[error("invalid lod range {min}..={max}")]
    InvalidLodRange { min: u8, max: u8 },

    /// A worker failed for its own reasons.
    #[error("worker {worker} failed: {message}")]
    Worker { worker: String, message: String },
}
