//! Combat components
//!
//! Health and the status markers the behaviors read when choosing targets.

use bevy::prelude::*;

use crate::behaviors::tags::{Tag, TagSet};

/// Hit points of a unit. Owns its own clamping.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn with_current(current: f32, max: f32) -> Self {
        Self {
            current: current.clamp(0.0, max),
            max,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Health as a fraction (0.0 to 1.0)
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Returns the damage actually removed
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let applied = amount.max(0.0).min(self.current);
        self.current -= applied;
        applied
    }

    /// Returns the healing actually applied (overheal is discarded)
    pub fn receive_heal(&mut self, amount: f32) -> f32 {
        let applied = amount.max(0.0).min(self.max - self.current).max(0.0);
        self.current += applied;
        applied
    }
}

/// Capability tags used by zone and heal filters
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Tags(pub TagSet);

impl Tags {
    pub fn one(tag: Tag) -> Self {
        Self(TagSet::from([tag]))
    }
}

/// Excludes a unit from all healing (bosses, shielded objectives)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct HealExcluded;

/// Marker: unit is in its death sequence and will be despawned
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dying;

/// Flat damage reduction granted by support heals
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DefenseBuff {
    pub amount: f32,
    pub remaining: f32,
}

/// Last entity to deal damage, used to credit kills
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct LastHitBy(pub Entity);

/// Despawns the entity once `remaining` reaches zero
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DespawnAfter {
    pub remaining: f32,
}

impl DespawnAfter {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }
}
