//! Data-Driven Behavior Tuning
//!
//! Pool, heal and presentation numbers live in `assets/config/behaviors.ron`
//! so balance changes don't require recompilation.
//!
//! ## Usage
//! ```ignore
//! fn my_system(settings: Res<BehaviorSettings>) {
//!     println!("Pool radius: {}", settings.poison_pool.params.radius);
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::constants::*;
use super::death_trigger::ZoneTemplate;
use super::heal_cycle::HealCycleConfig;
use super::tags::{Tag, TagFilter};
use super::world::Cue;
use super::zone::{ZoneKind, ZoneParams};
use crate::error::ConfigError;

/// Default location of the behavior tuning file
pub const DEFAULT_SETTINGS_PATH: &str = "assets/config/behaviors.ron";

fn default_corpse_linger() -> f32 {
    CORPSE_LINGER_SECS
}

/// Behavior tuning loaded from RON
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSettings {
    /// Zone dropped by pool spawners when they die
    pub poison_pool: ZoneTemplate,
    pub support_heal: HealCycleConfig,
    /// Clip lengths in seconds, keyed by cue
    #[serde(default)]
    pub clips: HashMap<Cue, f32>,
    /// Seconds a dead unit lingers before despawning
    #[serde(default = "default_corpse_linger")]
    pub corpse_linger_secs: f32,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            poison_pool: ZoneTemplate {
                params: ZoneParams {
                    kind: ZoneKind::Damage,
                    per_tick: POISON_POOL_DAMAGE_PER_TICK,
                    tick_interval: POISON_POOL_TICK_INTERVAL,
                    lifetime: POISON_POOL_LIFETIME,
                    radius: POISON_POOL_RADIUS,
                    filter: TagFilter::any_of([Tag::Player, Tag::Summon]),
                },
                animated: true,
            },
            support_heal: HealCycleConfig::default(),
            clips: HashMap::new(),
            corpse_linger_secs: CORPSE_LINGER_SECS,
        }
    }
}

impl BehaviorSettings {
    /// Load and validate settings from a RON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = Self::from_ron(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        info!("Loaded behavior settings from {:?}", path);
        Ok(settings)
    }

    /// Parse and validate settings from a RON string
    pub fn from_ron(contents: &str) -> Result<Self, ConfigError> {
        let settings: BehaviorSettings = ron::from_str(contents).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from `path`, falling back to defaults (with a warning) on any error
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No behavior settings at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}; using default behavior settings", e);
                Self::default()
            }
        }
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.poison_pool
            .params
            .validate()
            .map_err(|e| ConfigError::invalid(format!("poison_pool: {}", e)))?;

        self.support_heal
            .validate()
            .map_err(|e| ConfigError::invalid(format!("support_heal: {}", e)))?;

        for (cue, duration) in &self.clips {
            if *duration < 0.0 {
                return Err(ConfigError::invalid(format!(
                    "clip {} has negative duration {}",
                    cue.name(),
                    duration
                )));
            }
        }

        if self.corpse_linger_secs < 0.0 {
            return Err(ConfigError::invalid("corpse_linger_secs must not be negative"));
        }

        Ok(())
    }
}

/// Clip lengths looked up by the ECS presenter
#[derive(Resource, Debug, Clone, Default)]
pub struct ClipLibrary {
    durations: HashMap<Cue, f32>,
}

impl ClipLibrary {
    pub fn new(durations: HashMap<Cue, f32>) -> Self {
        Self { durations }
    }

    pub fn duration(&self, cue: Cue) -> Option<f32> {
        self.durations.get(&cue).copied()
    }
}

/// Loads `BehaviorSettings` at startup unless one was already inserted
pub struct BehaviorConfigPlugin {
    pub path: PathBuf,
}

impl Default for BehaviorConfigPlugin {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SETTINGS_PATH),
        }
    }
}

impl Plugin for BehaviorConfigPlugin {
    fn build(&self, app: &mut App) {
        if app.world().contains_resource::<BehaviorSettings>() {
            return;
        }
        app.insert_resource(BehaviorSettings::load_or_default(&self.path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(BehaviorSettings::default().validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip_preserves_settings() {
        let mut settings = BehaviorSettings::default();
        settings.clips.insert(Cue::ZoneClose, 0.75);

        let text = settings.to_ron().unwrap();
        let parsed = BehaviorSettings::from_ron(&text).unwrap();

        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_invalid_pool_interval_is_rejected() {
        let mut settings = BehaviorSettings::default();
        settings.poison_pool.params.tick_interval = 0.0;

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("poison_pool"), "{}", err);
    }

    #[test]
    fn test_negative_clip_duration_is_rejected() {
        let mut settings = BehaviorSettings::default();
        settings.clips.insert(Cue::ZoneOpen, -1.0);

        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_ron_is_a_parse_error() {
        let result = BehaviorSettings::from_ron("(poison_pool: oops");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = BehaviorSettings::load_or_default(Path::new("does/not/exist.ron"));
        assert_eq!(settings, BehaviorSettings::default());
    }

    #[test]
    fn test_clip_library_lookup() {
        let mut durations = HashMap::new();
        durations.insert(Cue::ZoneClose, 0.6);
        let library = ClipLibrary::new(durations);

        assert_eq!(library.duration(Cue::ZoneClose), Some(0.6));
        assert_eq!(library.duration(Cue::ZoneOpen), None);
    }
}
