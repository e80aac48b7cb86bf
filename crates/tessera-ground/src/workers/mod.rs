//! Stock terrain workers.

mod diamond_square;
mod fbm;
mod multilayer;
mod relief_modifier;

pub use diamond_square::DiamondSquareTerrain;
pub use fbm::{FbmParams, FbmTerrainGenerator};
pub use multilayer::{
    ColorTextureProvider, LayerDistributions, LayerParams, MultilayerGroundTexture, Ramp,
    TextureProvider,
};
pub use relief_modifier::{RELIEF_DOMAIN, ReliefMapModifier};
