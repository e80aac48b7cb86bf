//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration.
const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Tile system shape, altitudes and cache budgets.
    pub ground: GroundConfig,
    /// Fractal noise heights.
    pub fbm: FbmConfig,
    /// Diamond-square heights.
    pub diamond_square: DiamondSquareConfig,
    /// Relief map modifier.
    pub relief: ReliefConfig,
    /// Multilayer texturing.
    pub texture: TextureConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Settings of the demo exploration.
    pub demo: DemoConfig,
}

/// Which worker produces tile heights.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum HeightGenerator {
    /// Diamond-square subdivision of the parent tile.
    #[default]
    DiamondSquare,
    /// Multi-octave simplex noise sampled in world space.
    Fbm,
}

/// Ground configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GroundConfig {
    /// World seed every generator derives from.
    pub seed: u64,
    /// World size of a LOD-0 tile.
    pub unit_size: f64,
    /// Finest level of detail.
    pub max_lod: u8,
    /// Height samples per tile side (2^n + 1 for diamond-square).
    pub terrain_resolution: usize,
    /// Texture pixels per tile side.
    pub texture_resolution: u32,
    /// Altitude of normalised height 0.
    pub min_altitude: f64,
    /// Altitude of normalised height 1.
    pub max_altitude: f64,
    /// Cached entries kept after each collect.
    pub cache_budget: usize,
    /// Tiles a single collect may request.
    pub max_tiles_per_collect: usize,
    /// Height worker.
    pub generator: HeightGenerator,
}

/// Fractal noise configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FbmConfig {
    /// Octaves at LOD 0.
    pub octaves: u32,
    /// Octave cap at fine levels.
    pub max_octaves: u32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Frequency of the first octave, in cycles per world unit.
    pub base_frequency: f64,
}

/// Diamond-square configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiamondSquareConfig {
    /// Random displacement scale of each subdivision.
    pub jitter: f64,
    /// Coarsest level the height worker runs at.
    pub lod_min: u8,
    /// Finest level the height worker runs at.
    pub lod_max: u8,
}

/// Relief map configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReliefConfig {
    /// World size covered by one relief map.
    pub map_size: f64,
    /// Samples per relief map side.
    pub map_resolution: usize,
    /// Biomes per 10 x 10 map pixels.
    pub biome_density: f64,
    /// Inverse distance weighting exponent.
    pub limit_brightness: u32,
    /// Coarsest level the modifier runs at.
    pub lod_min: u8,
    /// Finest level the modifier runs at.
    pub lod_max: u8,
}

/// Texture configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextureConfig {
    /// Half-width of the smooth step turning ramp values into layer masks.
    pub threshold: f64,
    /// Amplitude of the noise added to layer masks.
    pub noise_amplitude: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write JSON logs next to the config file.
    pub log_to_file: bool,
}

/// Demo exploration configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Radius around the eye within which detail is requested.
    pub extent: f64,
    /// Eye height above altitude 0.
    pub eye_height: f64,
    /// Samples per world unit at distance 1 from the eye.
    pub angular_resolution: f64,
}

// --- Default implementations ---

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            unit_size: 6000.0,
            max_lod: 5,
            terrain_resolution: 33,
            texture_resolution: 32,
            min_altitude: -2000.0,
            max_altitude: 4000.0,
            cache_budget: 500,
            max_tiles_per_collect: 4096,
            generator: HeightGenerator::default(),
        }
    }
}

impl Default for FbmConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            max_octaves: 12,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.001,
        }
    }
}

impl Default for DiamondSquareConfig {
    fn default() -> Self {
        Self {
            jitter: 0.5,
            lod_min: 0,
            lod_max: u8::MAX,
        }
    }
}

impl Default for ReliefConfig {
    fn default() -> Self {
        Self {
            map_size: 10_000.0,
            map_resolution: 513,
            biome_density: 0.02,
            limit_brightness: 4,
            lod_min: 0,
            lod_max: u8::MAX,
        }
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            noise_amplitude: 0.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            extent: 20_000.0,
            eye_height: 1500.0,
            angular_resolution: 2.0,
        }
    }
}

/// Platform config directory for Tessera, if the platform has one.
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tessera"))
}

// --- Validation ---

impl Config {
    /// Reject settings no generator can work with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidLodRange`] for a worker range with
    /// `lod_min > lod_max`, [`ConfigError::InvalidValue`] for a relief map
    /// without samples or a biome density that is not finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relief.map_resolution == 0 {
            return Err(ConfigError::InvalidValue {
                field: "relief.map_resolution",
                reason: "must be positive",
            });
        }
        let density = self.relief.biome_density;
        if !density.is_finite() || density <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "relief.biome_density",
                reason: "must be finite and positive",
            });
        }

        let ranges = [
            ("diamond_square", self.diamond_square.lod_min, self.diamond_square.lod_max),
            ("relief", self.relief.lod_min, self.relief.lod_max),
        ];
        for (section, min, max) in ranges {
            if min > max {
                return Err(ConfigError::InvalidLodRange { section, min, max });
            }
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Re-read the file: returns `Some(new_config)` if it changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("max_lod: 5"));
        assert!(ron_str.contains("map_resolution: 513"));
        assert!(ron_str.contains("generator: DiamondSquare"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.ground.generator = HeightGenerator::Fbm;
        config.relief.lod_max = 3;
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(ground: (seed: 42), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.ground.seed, 42);
        assert_eq!(config.ground.max_lod, 5);
        assert_eq!(config.relief, ReliefConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.ground.seed = 1234;
        config.texture.noise_amplitude = 0.25;
        config.debug.log_level = "debug".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tessera");
        let config = Config::load_or_create(&nested).unwrap();
        assert_eq!(config, Config::default());
        assert!(nested.join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());

        let mut modified = config.clone();
        modified.demo.extent = 500.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.map(|c| c.demo.extent), Some(500.0));
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_relief_map() {
        let mut config = Config::default();
        config.relief.map_resolution = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "relief.map_resolution",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_biome_density() {
        for density in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let mut config = Config::default();
            config.relief.biome_density = density;
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::InvalidValue {
                        field: "relief.biome_density",
                        ..
                    })
                ),
                "density {density} accepted"
            );
        }
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.relief.lod_min = 4;
        config.relief.lod_max = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLodRange {
                section: "relief",
                min: 4,
                max: 2
            })
        ));
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// ground settings\n(\n  // nothing overridden\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
