//! Enemy behaviors
//!
//! Timer-driven behaviors for swamp enemies:
//! - `zone`: ticking damage/heal zones with a lifetime and a closing phase
//! - `heal_cycle`: support units that periodically heal injured allies
//! - `death_trigger`: units that leave a zone where they die
//!
//! The cores are plain structs driven through the `world` traits. The
//! `systems` module adapts them to the ECS.
//!
//! ## System Phases
//!
//! Each frame runs three ordered phases:
//!
//! 1. **Timers** - log clock, buff countdowns
//! 2. **Behaviors** - support commands, zone pulses, heal cycles (emit events)
//! 3. **Resolution** - apply damage/healing/buffs, deaths, despawns

use bevy::prelude::*;

pub mod components;
pub mod config;
pub mod constants;
pub mod death_trigger;
pub mod heal_cycle;
pub mod systems;
pub mod tags;
pub mod world;
pub mod zone;

#[cfg(test)]
pub(crate) mod testing;

use crate::combat::CombatPlugin;
use components::{SceneTeardown, SupportCommand};
use config::{BehaviorConfigPlugin, BehaviorSettings, ClipLibrary};
use systems::*;

/// System set labels for behavior ordering
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BehaviorPhase {
    /// Phase 1: clocks and countdowns
    Timers,
    /// Phase 2: behaviors decide and emit events
    Behaviors,
    /// Phase 3: events are applied, deaths and despawns resolved
    Resolution,
}

/// Configures the ordering between behavior phases.
pub fn configure_behavior_phases(app: &mut App) {
    app.configure_sets(
        Update,
        (
            BehaviorPhase::Timers,
            BehaviorPhase::Behaviors,
            BehaviorPhase::Resolution,
        )
            .chain(),
    );
}

/// Plugin for the enemy behaviors. Adds `CombatPlugin` and loads default
/// settings if they weren't set up already.
pub struct BehaviorsPlugin;

impl Plugin for BehaviorsPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<CombatPlugin>() {
            app.add_plugins(CombatPlugin);
        }
        if !app.world().contains_resource::<BehaviorSettings>() {
            app.add_plugins(BehaviorConfigPlugin::default());
        }

        let clips = app
            .world()
            .get_resource::<BehaviorSettings>()
            .map(|settings| settings.clips.clone())
            .unwrap_or_default();

        app.insert_resource(ClipLibrary::new(clips))
            .init_resource::<SceneTeardown>()
            .add_event::<SupportCommand>()
            .add_observer(spawn_pool_on_death)
            .add_observer(release_glows_on_healer_removed)
            .add_systems(
                Update,
                (tick_zone_effects, tick_support_healers)
                    .chain()
                    .in_set(BehaviorPhase::Behaviors),
            );
    }
}
