//! Session configuration supplied by the caller before a game starts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::escalator::ObstacleParams;
use crate::motion::GravityMode;

/// Upper bound for every configured delay or interval, in seconds.
pub const MAX_DELAY_SECS: f32 = 3600.0;

/// Configuration errors. All of them are fatal at session start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("target list is empty")]
    EmptyTargetList,
    #[error("target name at index {0} is empty")]
    EmptyTargetName(usize),
    #[error("{name} must be between 0 and {MAX_DELAY_SECS} seconds, got {value}")]
    InvalidDuration { name: &'static str, value: f32 },
    #[error("motion sample interval must be positive and at most {MAX_DELAY_SECS} seconds, got {0}")]
    InvalidSampleInterval(f32),
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// Delays of the deferred continuations, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between session start and the first target prompt.
    pub start_delay_secs: f32,
    /// Delay between a correct tap and advancing to the next target.
    pub advance_delay_secs: f32,
    /// How long feedback text stays up before it is cleared.
    pub feedback_duration_secs: f32,
    /// Duration of the push transition on label changes.
    pub transition_secs: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_delay_secs: 1.0,
            advance_delay_secs: 1.0,
            feedback_duration_secs: 0.5,
            transition_secs: 0.5,
        }
    }
}

impl TimingConfig {
    pub fn start_delay(&self) -> Duration {
        Duration::from_secs_f32(self.start_delay_secs)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_secs_f32(self.advance_delay_secs)
    }

    pub fn feedback_duration(&self) -> Duration {
        Duration::from_secs_f32(self.feedback_duration_secs)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_secs_f32(self.transition_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("start_delay_secs", self.start_delay_secs),
            ("advance_delay_secs", self.advance_delay_secs),
            ("feedback_duration_secs", self.feedback_duration_secs),
            ("transition_secs", self.transition_secs),
        ] {
            if !(0.0..=MAX_DELAY_SECS).contains(&value) {
                return Err(ConfigError::InvalidDuration { name, value });
            }
        }
        Ok(())
    }
}

/// Device-motion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Interval between motion samples (30 Hz by default).
    pub sample_interval_secs: f32,
    /// Scale applied to the unit-g device gravity vector.
    pub gravity_magnitude: f32,
    pub gravity_mode: GravityMode,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 1.0 / 30.0,
            gravity_magnitude: 9.8,
            gravity_mode: GravityMode::default(),
        }
    }
}

impl MotionConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs_f32(self.sample_interval_secs)
    }
}

/// Names of the nodes the scene loader looks up in the room asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SceneNodeNames {
    /// Group holding the room geometry. Required.
    pub root_group: String,
    /// Camera node. Required.
    pub camera: String,
    /// Lighting group. Optional.
    pub lighting: String,
    /// Surface that receives the caller-supplied image. Optional.
    pub texture_surface: String,
}

impl Default for SceneNodeNames {
    fn default() -> Self {
        Self {
            root_group: "SketchUp".to_string(),
            camera: "camera".to_string(),
            lighting: "Lighting".to_string(),
            texture_surface: "screen".to_string(),
        }
    }
}

/// Complete game configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Identifier of the image shown on the texture surface.
    pub image_to_show: String,
    /// Ordered list of object names the player must find.
    pub objects_to_find: Vec<String>,
    pub timing: TimingConfig,
    pub motion: MotionConfig,
    pub obstacle: ObstacleParams,
    pub nodes: SceneNodeNames,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            image_to_show: "texture".to_string(),
            objects_to_find: ["Candles", "Table", "Couch", "Rug", "TV", "Fireplace"]
                .into_iter()
                .map(String::from)
                .collect(),
            timing: TimingConfig::default(),
            motion: MotionConfig::default(),
            obstacle: ObstacleParams::default(),
            nodes: SceneNodeNames::default(),
        }
    }
}

impl GameConfig {
    /// Creates the default configuration with a different target list.
    pub fn with_targets<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            objects_to_find: targets.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Checks the invariants a playable session relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.objects_to_find.is_empty() {
            return Err(ConfigError::EmptyTargetList);
        }
        if let Some(index) = self.objects_to_find.iter().position(String::is_empty) {
            return Err(ConfigError::EmptyTargetName(index));
        }
        self.timing.validate()?;
        let interval = self.motion.sample_interval_secs;
        if interval <= 0.0 || !(0.0..=MAX_DELAY_SECS).contains(&interval) {
            return Err(ConfigError::InvalidSampleInterval(interval));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.objects_to_find.len(), 6);
        assert_eq!(config.objects_to_find[0], "Candles");
        assert_eq!(config.nodes.camera, "camera");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "image_to_show": "poster",
            "objects_to_find": ["Candles", "Table"],
            "timing": { "advance_delay_secs": 2.0 }
        }"#;

        let config = GameConfig::from_json(json).expect("Failed to parse JSON");

        assert_eq!(config.image_to_show, "poster");
        assert_eq!(config.objects_to_find, vec!["Candles", "Table"]);
        assert_eq!(config.timing.advance_delay_secs, 2.0);
        assert_eq!(config.timing.feedback_duration_secs, 0.5);
        assert_eq!(config.motion.gravity_mode, GravityMode::PinnedVertical);
    }

    #[test]
    fn test_empty_targets_rejected() {
        let config = GameConfig::with_targets(Vec::<String>::new());
        assert!(matches!(config.validate(), Err(ConfigError::EmptyTargetList)));

        let config = GameConfig::with_targets(["Table", ""]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyTargetName(1))
        ));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let mut config = GameConfig::default();
        config.timing.advance_delay_secs = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                name: "advance_delay_secs",
                ..
            })
        ));
    }

    #[test]
    fn test_oversized_delay_rejected() {
        let mut config = GameConfig::default();
        config.timing.start_delay_secs = 1e30;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                name: "start_delay_secs",
                ..
            })
        ));

        let mut config = GameConfig::default();
        config.timing.transition_secs = f32::INFINITY;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.timing.feedback_duration_secs = MAX_DELAY_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_interval_bounds() {
        let mut config = GameConfig::default();
        config.motion.sample_interval_secs = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSampleInterval(_))
        ));

        config.motion.sample_interval_secs = 1e30;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSampleInterval(_))
        ));

        config.motion.sample_interval_secs = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_targets() {
        let config = GameConfig::with_targets(["Rug"]);
        let json = config.to_json().unwrap();
        let parsed = GameConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
