use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub terrain: TerrainSettings,
    pub road: RoadSettings,
    pub scatter: ScatterSettings,
    pub vehicle: VehicleSettings,
    pub logging: LoggingSettings,
}

/// Spatial mapping and noise parameters shared by every terrain consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// World-space extent along X
    pub width: f32,
    /// World-space extent along Z
    pub depth: f32,
    /// Samples per side (the grid is resolution × resolution)
    pub resolution: usize,
    /// Height of a sample whose noise value is +1
    pub height_scale: f32,
    /// Noise-space step between neighbouring samples
    pub noise_scale: f32,
    pub seed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadSettings {
    /// Planned centerline segments (points = segments + 1)
    pub segments: usize,
    /// Sweep steps along the curve, must exceed `segments`
    pub divisions: usize,
    pub width: f32,
    pub radial_segments: usize,
    /// Times the road texture repeats over the full length
    pub texture_repeat: f32,
    /// Lift above the terrain surface
    pub clearance: f32,
    pub wiggle_amplitude: f32,
    pub wiggle_frequency: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterSettings {
    pub count: usize,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Fraction of the terrain extents that samples are drawn from
    pub margin: f32,
    pub exclusion_half_width: f32,
    pub exclusion_half_length: f32,
    pub model: String,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSettings {
    pub acceleration: f32,
    pub brake_deceleration: f32,
    pub drag: f32,
    pub max_speed: f32,
    pub max_reverse_speed: f32,
    pub turn_rate: f32,
    pub ride_height: f32,
    pub camera_distance: f32,
    pub camera_height: f32,
    pub camera_stiffness: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            width: 400.0,
            depth: 800.0,
            resolution: 128,
            height_scale: 30.0,
            noise_scale: 0.05,
            seed: 42,
        }
    }
}

impl Default for RoadSettings {
    fn default() -> Self {
        Self {
            segments: 50,
            divisions: 200,
            width: 10.0,
            radial_segments: 8,
            texture_repeat: 40.0,
            clearance: 0.5,
            wiggle_amplitude: 10.0,
            wiggle_frequency: 0.01,
        }
    }
}

impl Default for ScatterSettings {
    fn default() -> Self {
        Self {
            count: 500,
            min_scale: 2.0,
            max_scale: 4.0,
            margin: 0.9,
            exclusion_half_width: 18.0,
            exclusion_half_length: 400.0,
            model: "tree".to_string(),
            seed: 7,
        }
    }
}

impl Default for VehicleSettings {
    fn default() -> Self {
        Self {
            acceleration: 20.0,
            brake_deceleration: 40.0,
            drag: 0.5,
            max_speed: 40.0,
            max_reverse_speed: 10.0,
            turn_rate: 1.5,
            ride_height: 1.0,
            camera_distance: 12.0,
            camera_height: 5.0,
            camera_stiffness: 4.0,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "world.toml";

impl WorldConfig {
    /// Loads a config file, picking TOML, YAML or JSON from the extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("toml");
        Self::from_str_with_format(&contents, ext)
    }

    pub fn from_str_with_format(contents: &str, format: &str) -> Result<Self, ConfigError> {
        match format {
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| ConfigError::Parse(format!("YAML parse error: {}", e))),
            "json" => serde_json::from_str(contents)
                .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e))),
            _ => toml::from_str(contents)
                .map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e))),
        }
    }

    /// Resolves the config the binary runs with. An explicit path must load;
    /// without one, `DEFAULT_CONFIG_PATH` is used if present, else defaults.
    /// Returns the file the config came from, if any.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !fallback.exists() {
                    return Ok((Self::default(), None));
                }
                fallback
            }
        };
        let config = Self::load(&path)?;
        Ok((config, Some(path)))
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}, using defaults", e);
            Self::default()
        })
    }

    /// Rejects configurations the generators would turn into degenerate or
    /// non-terminating output. The generators themselves never re-check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check_finite()?;

        let t = &self.terrain;
        if t.resolution < 2 {
            return Err(ConfigError::Invalid(format!(
                "terrain.resolution must be at least 2, got {}",
                t.resolution
            )));
        }
        if t.width <= 0.0 || t.depth <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "terrain extents must be positive, got {}x{}",
                t.width, t.depth
            )));
        }
        if t.height_scale < 0.0 {
            return Err(ConfigError::Invalid("terrain.height_scale must not be negative".to_string()));
        }

        let r = &self.road;
        if r.segments < 1 {
            return Err(ConfigError::Invalid("road.segments must be at least 1".to_string()));
        }
        if r.divisions <= r.segments {
            return Err(ConfigError::Invalid(format!(
                "road.divisions ({}) must exceed road.segments ({})",
                r.divisions, r.segments
            )));
        }
        if r.radial_segments < 3 {
            return Err(ConfigError::Invalid("road.radial_segments must be at least 3".to_string()));
        }
        if r.width <= 0.0 {
            return Err(ConfigError::Invalid("road.width must be positive".to_string()));
        }

        let s = &self.scatter;
        if s.min_scale > s.max_scale {
            return Err(ConfigError::Invalid(format!(
                "scatter.min_scale ({}) exceeds scatter.max_scale ({})",
                s.min_scale, s.max_scale
            )));
        }
        if s.margin <= 0.0 || s.margin > 1.0 {
            return Err(ConfigError::Invalid("scatter.margin must be in (0, 1]".to_string()));
        }
        let sample_half_width = t.width / 2.0 * s.margin;
        let sample_half_depth = t.depth / 2.0 * s.margin;
        if s.count > 0
            && s.exclusion_half_width >= sample_half_width
            && s.exclusion_half_length >= sample_half_depth
        {
            return Err(ConfigError::Invalid(
                "scatter exclusion band covers the whole sampling region".to_string(),
            ));
        }

        Ok(())
    }

    /// NaN slips through every ordered comparison below, and infinite extents
    /// poison the height query, so non-finite values are rejected up front.
    fn check_finite(&self) -> Result<(), ConfigError> {
        let (t, r, s, v) = (&self.terrain, &self.road, &self.scatter, &self.vehicle);
        let fields = [
            ("terrain.width", t.width),
            ("terrain.depth", t.depth),
            ("terrain.height_scale", t.height_scale),
            ("terrain.noise_scale", t.noise_scale),
            ("road.width", r.width),
            ("road.texture_repeat", r.texture_repeat),
            ("road.clearance", r.clearance),
            ("road.wiggle_amplitude", r.wiggle_amplitude),
            ("road.wiggle_frequency", r.wiggle_frequency),
            ("scatter.min_scale", s.min_scale),
            ("scatter.max_scale", s.max_scale),
            ("scatter.margin", s.margin),
            ("scatter.exclusion_half_width", s.exclusion_half_width),
            ("scatter.exclusion_half_length", s.exclusion_half_length),
            ("vehicle.acceleration", v.acceleration),
            ("vehicle.brake_deceleration", v.brake_deceleration),
            ("vehicle.drag", v.drag),
            ("vehicle.max_speed", v.max_speed),
            ("vehicle.max_reverse_speed", v.max_reverse_speed),
            ("vehicle.turn_rate", v.turn_rate),
            ("vehicle.ride_height", v.ride_height),
            ("vehicle.camera_distance", v.camera_distance),
            ("vehicle.camera_height", v.camera_height),
            ("vehicle.camera_stiffness", v.camera_stiffness),
        ];

        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some((name, value)) => Err(ConfigError::Invalid(format!(
                "{} must be finite, got {}",
                name, value
            ))),
            None => Ok(()),
        }
    }
}
