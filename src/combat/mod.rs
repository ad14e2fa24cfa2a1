//! Combat system
//!
//! Applies what the behaviors decide:
//! - Health, tags and status markers
//! - Damage, healing and defense buff events
//! - Death detection and corpse despawn
//! - Combat logging

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod log;
pub mod systems;

use crate::behaviors::{configure_behavior_phases, BehaviorPhase};
use events::*;
use systems::*;

/// Plugin for the combat system
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        configure_behavior_phases(app);

        app
            // Combat events
            .add_event::<DamageEvent>()
            .add_event::<HealingEvent>()
            .add_event::<DefenseBuffEvent>()
            .add_event::<CombatantDeathEvent>()
            .add_event::<PresentationEvent>()
            // Resources
            .init_resource::<log::CombatLog>()
            // Systems
            .add_systems(
                Update,
                (advance_combat_log_clock, tick_defense_buffs).in_set(BehaviorPhase::Timers),
            )
            .add_systems(
                Update,
                (
                    process_damage_events,
                    process_healing_events,
                    apply_defense_buffs,
                    check_combatant_deaths,
                    tick_despawn_timers,
                )
                    .chain()
                    .in_set(BehaviorPhase::Resolution),
            );
    }
}
