//! Procedural LOD heightmap ground.
//!
//! A [`HeightmapGround`] turns a [`ResolutionModel`](tessera_tiles::ResolutionModel)
//! into terrain tiles: it walks the tiles the model needs, generates the
//! missing ones (and their ancestors) through a pipeline of
//! [`TerrainWorker`]s, emits height fields, textures and meshes into a
//! [`Collector`], and trims its caches to a budget.

mod collector;
mod context;
mod error;
mod ground;
mod image;
mod mesh;
mod relief;
mod terrain;
mod tile;
mod worker;

pub mod seed;
pub mod workers;


pub use collector::{Channel, Collector, ItemKey};
pub use context::ExplorationContext;
pub use error::GroundError;
pub use ground::{CollectReport, DefaultWorkerOptions, GroundParams, HeightSource, HeightmapGround};
pub use self::image::{Image, ImageError, PixelFormat, from_float, to_float};
pub use mesh::{Neighbourhood, TerrainMesh};
pub use relief::{
    DefaultDifferentialLaw, DifferentialLaw, ReliefMap, ReliefMapGenerator, ReliefMapParams,
};
pub use terrain::Terrain;
pub use tile::GroundTile;
pub use worker::{LodRange, TerrainWorker, TileContext, WorkerId};
