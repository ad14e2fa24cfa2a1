//! Combat events
//!
//! Behaviors don't mutate health directly; they emit these events and the
//! combat systems apply them later in the frame.

use bevy::prelude::*;

use crate::behaviors::world::Cue;

/// Event fired when a behavior deals damage
#[derive(Event, Debug, Clone)]
pub struct DamageEvent {
    /// Entity dealing the damage (the zone)
    pub source: Entity,
    /// Entity receiving the damage
    pub target: Entity,
    /// Amount of damage before mitigation
    pub amount: f32,
    /// Name of the effect, for the combat log
    pub ability_name: String,
}

/// Event fired when a behavior heals
#[derive(Event, Debug, Clone)]
pub struct HealingEvent {
    /// Entity doing the healing
    pub source: Entity,
    /// Entity receiving the healing
    pub target: Entity,
    /// Amount before clamping to max health
    pub amount: f32,
    /// Name of the healing effect
    pub ability_name: String,
}

/// Event fired when a support heal grants a defense buff
#[derive(Event, Debug, Clone)]
pub struct DefenseBuffEvent {
    pub source: Entity,
    pub target: Entity,
    pub amount: f32,
    pub duration: f32,
}

/// Event fired when a unit's health reaches zero
#[derive(Event, Debug, Clone)]
pub struct CombatantDeathEvent {
    /// Entity that died
    pub victim: Entity,
    /// Last entity to damage it, if known
    pub killer: Option<Entity>,
}

/// Animation/audio cue for whatever renders the simulation
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PresentationEvent {
    /// Entity the cue belongs to
    pub owner: Entity,
    pub cue: Cue,
    pub position: Vec2,
}
