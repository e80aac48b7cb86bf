//! Demo binary that explores a generated ground from a first-person eye.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p tessera-demo` for a default exploration.
//! Run with `cargo run -p tessera-demo -- --seed 7 --output ground.png` to
//! also save the coarse texture under the eye.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use glam::DVec3;
use tessera_config::{CliArgs, Config, HeightGenerator, default_config_dir};
use tessera_ground::workers::FbmParams;
use tessera_ground::{
    Collector, DefaultWorkerOptions, ExplorationContext, GroundError, GroundParams, HeightSource,
    HeightmapGround, Image, ItemKey, LodRange, ReliefMapParams, Terrain, TerrainMesh,
};
use tessera_tiles::DistanceResolution;
use tracing::{info, warn};

/// Closest distance at which the eye asks for more detail.
const NEAR: f64 = 1.0;

fn ground_params(config: &Config) -> GroundParams {
    let ground = &config.ground;
    GroundParams {
        seed: ground.seed,
        unit_size: ground.unit_size,
        max_lod: ground.max_lod,
        terrain_resolution: ground.terrain_resolution,
        texture_resolution: ground.texture_resolution,
        min_altitude: ground.min_altitude,
        max_altitude: ground.max_altitude,
        cache_budget: ground.cache_budget,
        max_tiles_per_collect: ground.max_tiles_per_collect,
    }
}

fn worker_options(config: &Config) -> Result<DefaultWorkerOptions, GroundError> {
    let heights = match config.ground.generator {
        HeightGenerator::DiamondSquare => HeightSource::DiamondSquare {
            jitter: config.diamond_square.jitter,
        },
        HeightGenerator::Fbm => HeightSource::Fbm(FbmParams {
            seed: config.ground.seed,
            octaves: config.fbm.octaves,
            max_octaves: config.fbm.max_octaves,
            lacunarity: config.fbm.lacunarity,
            persistence: config.fbm.persistence,
            base_frequency: config.fbm.base_frequency,
        }),
    };
    let relief = &config.relief;
    Ok(DefaultWorkerOptions {
        heights,
        height_lods: LodRange::new(config.diamond_square.lod_min, config.diamond_square.lod_max)?,
        relief_map_size: relief.map_size,
        relief: ReliefMapParams {
            resolution: relief.map_resolution,
            biome_density: relief.biome_density,
            limit_brightness: relief.limit_brightness,
        },
        relief_lods: LodRange::new(relief.lod_min, relief.lod_max)?,
        texture_threshold: config.texture.threshold,
        texture_noise: config.texture.noise_amplitude,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);
    config.validate()?;

    let log_dir = config_dir.join("logs");
    tessera_log::init_logging(Some(&log_dir), config.debug.log_to_file, Some(&config));

    let mut ground = HeightmapGround::new(ground_params(&config))?;
    ground.set_default_worker_set(&worker_options(&config)?)?;

    let eye = DVec3::new(0.0, 0.0, config.demo.eye_height);
    let model = DistanceResolution::new(eye, config.demo.angular_resolution, NEAR, config.demo.extent);
    let ctx = ExplorationContext::new().with_prefix("ground");

    let mut collector = Collector::new();
    collector
        .add_channel::<Terrain>()
        .add_channel::<Image>()
        .add_channel::<TerrainMesh>();

    let report = ground.collect(&mut collector, &model, &ctx)?;
    let triangles: usize = collector
        .channel::<TerrainMesh>()
        .map(|meshes| meshes.iter().map(|(_, mesh)| mesh.triangle_count()).sum())
        .unwrap_or(0);
    for (lod, count) in &report.per_lod {
        info!(lod, tiles = count, "tiles collected at level");
    }
    info!(
        tiles = report.collected,
        generated = report.generated,
        evicted = report.evicted,
        triangles,
        "exploration done"
    );

    let altitude = ground.observe_altitude_at(
        eye.x,
        eye.y,
        model.resolution_at_distance(config.demo.eye_height),
    )?;
    info!(
        altitude,
        clearance = eye.z - altitude,
        "ground under the eye"
    );

    if let Some(path) = &args.output {
        let coords = ground.tile_system().tile_coordinates(eye - ctx.offset(), 0);
        let key = ctx.mutate_key(&ItemKey::from_tile(&coords));
        match collector.channel::<Image>().and_then(|images| images.get(&key)) {
            Some(texture) => {
                texture.save(path)?;
                info!(tile = %key, path = %path.display(), "saved texture");
            }
            None => warn!(tile = %key, "no texture collected under the eye"),
        }
    }

    let stats = ground.reducer_stats();
    info!(
        cached = ground.cached_tile_count(),
        reductions = stats.reductions,
        evicted = stats.evicted,
        "cache state"
    );
    Ok(())
}
