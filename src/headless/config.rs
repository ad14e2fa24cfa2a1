//! JSON configuration parsing for headless mode
//!
//! A scenario lists the units to place, scripted kills and support commands,
//! and how long to run.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::behaviors::components::{SupportAction, UnitArchetype};
use crate::error::ConfigError;

/// Headless scenario configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessScenarioConfig {
    /// Scenario name, used in the summary
    #[serde(default = "default_name")]
    pub name: String,
    /// Units to spawn, in order. Scripted events refer to them by index.
    pub units: Vec<UnitSpawnConfig>,
    /// Units to kill outright at a given time
    #[serde(default)]
    pub kills: Vec<ScriptedKill>,
    /// Commands sent to support healers at a given time
    #[serde(default)]
    pub support_commands: Vec<ScriptedSupportCommand>,
    /// Simulated duration in seconds (default: 20)
    #[serde(default = "default_duration")]
    pub duration_secs: f32,
    /// Random seed for the spawn position jitter
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Maximum random offset applied to each spawn coordinate
    #[serde(default)]
    pub position_jitter: f32,
    /// Where to write the combat log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSpawnConfig {
    pub archetype: UnitArchetype,
    pub position: [f32; 2],
    /// Display name (default: archetype name plus index)
    #[serde(default)]
    pub label: Option<String>,
    /// Starting health (default: max health)
    #[serde(default)]
    pub health: Option<f32>,
    /// Max health (default: archetype default)
    #[serde(default)]
    pub max_health: Option<f32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScriptedKill {
    pub at_secs: f32,
    /// Index into `units`
    pub unit: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScriptedSupportCommand {
    pub at_secs: f32,
    /// Index into `units`; must be a Mender
    pub unit: usize,
    pub action: ScriptedAction,
}

/// Serializable form of `SupportAction`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScriptedAction {
    Activate,
    Deactivate,
    RunOnce,
    Reconfigure {
        heal_amount: f32,
        interval: f32,
        search_radius: f32,
    },
}

impl From<ScriptedAction> for SupportAction {
    fn from(action: ScriptedAction) -> Self {
        match action {
            ScriptedAction::Activate => SupportAction::SetActive(true),
            ScriptedAction::Deactivate => SupportAction::SetActive(false),
            ScriptedAction::RunOnce => SupportAction::RunOnce,
            ScriptedAction::Reconfigure {
                heal_amount,
                interval,
                search_radius,
            } => SupportAction::Reconfigure {
                heal_amount,
                interval,
                search_radius,
            },
        }
    }
}

fn default_name() -> String {
    "unnamed scenario".to_string()
}

fn default_duration() -> f32 {
    20.0
}

impl UnitSpawnConfig {
    pub fn max_health(&self) -> f32 {
        self.max_health
            .unwrap_or_else(|| self.archetype.default_max_health())
    }

    pub fn label(&self, index: usize) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("{} #{}", self.archetype.name(), index + 1))
    }
}

impl HeadlessScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: HeadlessScenarioConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.units.is_empty() {
            return Err(ConfigError::invalid("scenario must spawn at least one unit"));
        }

        for (i, unit) in self.units.iter().enumerate() {
            let max = unit.max_health();
            if max <= 0.0 {
                return Err(ConfigError::invalid(format!(
                    "unit {} max_health must be positive, got {}",
                    i, max
                )));
            }
            if let Some(health) = unit.health {
                if health <= 0.0 || health > max {
                    return Err(ConfigError::invalid(format!(
                        "unit {} health {} must be in (0, {}]",
                        i, health, max
                    )));
                }
            }
        }

        for kill in &self.kills {
            if kill.unit >= self.units.len() {
                return Err(ConfigError::invalid(format!(
                    "kill target {} is out of range ({} units)",
                    kill.unit,
                    self.units.len()
                )));
            }
            if kill.at_secs < 0.0 {
                return Err(ConfigError::invalid("kill at_secs must not be negative"));
            }
        }

        for command in &self.support_commands {
            match self.units.get(command.unit) {
                Some(unit) if unit.archetype == UnitArchetype::Mender => {}
                Some(unit) => {
                    return Err(ConfigError::invalid(format!(
                        "support command target {} is a {:?}, not a Mender",
                        command.unit, unit.archetype
                    )));
                }
                None => {
                    return Err(ConfigError::invalid(format!(
                        "support command target {} is out of range ({} units)",
                        command.unit,
                        self.units.len()
                    )));
                }
            }
            if let ScriptedAction::Reconfigure { interval, .. } = command.action {
                if interval <= 0.0 {
                    return Err(ConfigError::invalid("reconfigure interval must be positive"));
                }
            }
        }

        if self.duration_secs <= 0.0 {
            return Err(ConfigError::invalid("duration_secs must be positive"));
        }
        if self.position_jitter < 0.0 {
            return Err(ConfigError::invalid("position_jitter must not be negative"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMBUSH: &str = r#"{
        "name": "ambush",
        "units": [
            { "archetype": "Player", "position": [0.0, 0.0] },
            { "archetype": "Bloater", "position": [1.0, 0.0] },
            { "archetype": "Mender", "position": [4.0, 0.0] }
        ],
        "kills": [ { "at_secs": 1.5, "unit": 1 } ],
        "support_commands": [ { "at_secs": 3.0, "unit": 2, "action": "RunOnce" } ],
        "duration_secs": 8.0
    }"#;

    #[test]
    fn test_parse_and_validate() {
        let config: HeadlessScenarioConfig = serde_json::from_str(AMBUSH).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.units.len(), 3);
        assert_eq!(config.units[1].label(1), "Bloater #2");
        assert_eq!(config.units[0].max_health(), 100.0);
        assert!(config.random_seed.is_none());
    }

    #[test]
    fn test_kill_out_of_range_is_rejected() {
        let mut config: HeadlessScenarioConfig = serde_json::from_str(AMBUSH).unwrap();
        config.kills.push(ScriptedKill { at_secs: 1.0, unit: 9 });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_support_command_must_target_mender() {
        let mut config: HeadlessScenarioConfig = serde_json::from_str(AMBUSH).unwrap();
        config.support_commands[0].unit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not a Mender"), "{}", err);
    }

    #[test]
    fn test_starting_health_above_max_is_rejected() {
        let mut config: HeadlessScenarioConfig = serde_json::from_str(AMBUSH).unwrap();
        config.units[0].health = Some(150.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scripted_action_conversion() {
        assert_eq!(
            SupportAction::from(ScriptedAction::Deactivate),
            SupportAction::SetActive(false)
        );
    }
}
