//! Configuration for the Tessera ground generator.
//!
//! Settings persist to disk as a RON file, can be overridden from the
//! command line, and tolerate missing or unknown fields so older and newer
//! files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DemoConfig, DiamondSquareConfig, FbmConfig, GroundConfig,
    HeightGenerator, ReliefConfig, TextureConfig, default_config_dir,
};
pub use error::ConfigError;
