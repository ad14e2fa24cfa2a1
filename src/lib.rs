//! Blightmire - Swamp Enemy Behaviors
//!
//! Poison pools, support healers and death-spawned hazards for a 2D action
//! game, built on Bevy ECS with a headless scenario runner.
//!
//! This library exposes the behavior and combat modules for testing and reuse.

pub mod behaviors;
pub mod cli;
pub mod combat;
pub mod error;
pub mod headless;

// Re-export commonly used types
pub use behaviors::config::BehaviorSettings;
pub use behaviors::BehaviorsPlugin;
pub use combat::log::{CombatLog, CombatLogEventType};
pub use error::ConfigError;
pub use headless::HeadlessScenarioConfig;
