//! Collaborator Contracts
//!
//! The behavior cores never touch ECS queries directly. They talk to the host
//! through these traits, which keeps zone ticking, heal selection and the
//! death trigger testable against a plain in-memory world.
//!
//! ## Contracts
//! - `SpatialQuery`: "who matching this filter is within radius", plus positions
//! - `Vitality`: health snapshots and the damage/heal/buff mutators
//! - `Presentation`: animation/audio cues and clip duration lookup
//! - `TransientSpawner`: short-lived visual effects that must be released

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::tags::TagFilter;

/// Synchronous radius query over the world.
///
/// Results are a snapshot; order is implementation-defined.
pub trait SpatialQuery {
    type Handle: Copy + Eq + Debug;

    fn query_in_radius(&self, center: Vec2, radius: f32, filter: &TagFilter) -> Vec<Self::Handle>;

    fn position(&self, target: Self::Handle) -> Option<Vec2>;
}

/// Health-carrying targets.
///
/// Mutators may be deferred by the host (e.g. sent as events); callers must
/// not assume a `vitals` read reflects a mutation issued in the same frame.
pub trait Vitality: SpatialQuery {
    fn vitals(&self, target: Self::Handle) -> Option<Vitals>;

    fn take_damage(&mut self, target: Self::Handle, amount: f32);

    /// The target clamps to its own maximum
    fn receive_heal(&mut self, target: Self::Handle, amount: f32);

    fn apply_defense_buff(&mut self, target: Self::Handle, amount: f32, duration: f32);
}

/// Point-in-time view of a target's health state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub current_health: f32,
    pub max_health: f32,
    /// False for targets flagged as excluded from healing
    pub heal_eligible: bool,
    /// True once the target has entered its death sequence
    pub dying: bool,
}

impl Vitals {
    /// Health as a fraction (0.0 to 1.0)
    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.current_health / self.max_health
        } else {
            0.0
        }
    }

    pub fn is_injured(&self) -> bool {
        self.current_health < self.max_health
    }
}

/// Presentation cues the behaviors can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// Zone opening animation
    ZoneOpen,
    /// Zone closing transition; its clip length drives the despawn delay
    ZoneClose,
    /// One-shot audio played once per heal cycle that healed anyone
    HealChime,
}

impl Cue {
    pub fn name(&self) -> &'static str {
        match self {
            Cue::ZoneOpen => "ZoneOpen",
            Cue::ZoneClose => "ZoneClose",
            Cue::HealChime => "HealChime",
        }
    }
}

/// Animation, audio and clip lookup
pub trait Presentation {
    fn play(&mut self, cue: Cue, at: Vec2);

    /// Length of the clip backing `cue`, if the host knows it
    fn clip_duration(&self, cue: Cue) -> Option<f32>;
}

/// Kinds of transient visual effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransientKind {
    /// Glow shown on a unit that was just healed
    HealGlow,
}

/// Spawns and releases short-lived visuals owned by a behavior
pub trait TransientSpawner {
    type Handle: Copy + Eq + Debug;

    fn spawn_transient(&mut self, kind: TransientKind, at: Vec2) -> Self::Handle;

    fn release_transient(&mut self, handle: Self::Handle);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(current: f32, max: f32) -> Vitals {
        Vitals {
            current_health: current,
            max_health: max,
            heal_eligible: true,
            dying: false,
        }
    }

    #[test]
    fn test_health_fraction() {
        assert_eq!(vitals(25.0, 100.0).health_fraction(), 0.25);
        assert_eq!(vitals(10.0, 0.0).health_fraction(), 0.0);
    }

    #[test]
    fn test_is_injured_is_strict() {
        assert!(vitals(99.0, 100.0).is_injured());
        assert!(!vitals(100.0, 100.0).is_injured());
    }
}
