//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, HeightGenerator};

/// Tessera command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "tessera", about = "Explore a procedurally generated LOD ground")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Finest level of detail.
    #[arg(long)]
    pub max_lod: Option<u8>,

    /// Cached entries kept after each collect.
    #[arg(long)]
    pub cache_budget: Option<usize>,

    /// Use fractal noise instead of diamond-square for heights.
    #[arg(long)]
    pub fbm: bool,

    /// Radius around the eye within which detail is requested.
    #[arg(long)]
    pub extent: Option<f64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the LOD-0 texture under the eye to this PNG file.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.ground.seed = seed;
        }
        if let Some(lod) = args.max_lod {
            self.ground.max_lod = lod;
        }
        if let Some(budget) = args.cache_budget {
            self.ground.cache_budget = budget;
        }
        if args.fbm {
            self.ground.generator = HeightGenerator::Fbm;
        }
        if let Some(extent) = args.extent {
            self.demo.extent = extent;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
