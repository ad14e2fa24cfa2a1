//! In-memory world and presenter for unit tests of the behavior cores.

use bevy::prelude::*;
use std::collections::HashMap;

use super::tags::{Tag, TagFilter, TagSet};
use super::world::{Cue, Presentation, SpatialQuery, TransientKind, TransientSpawner, Vitality, Vitals};

#[derive(Debug, Clone)]
pub struct MockUnit {
    pub position: Vec2,
    pub tags: TagSet,
    pub health: f32,
    pub max_health: f32,
    pub heal_eligible: bool,
    pub dying: bool,
}

impl MockUnit {
    pub fn new(x: f32, y: f32, tag: Tag, health: f32, max_health: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            tags: TagSet::from([tag]),
            health,
            max_health,
            heal_eligible: true,
            dying: false,
        }
    }
}

/// Units are addressed by their index in `units`
#[derive(Debug, Default)]
pub struct MockArena {
    pub units: Vec<MockUnit>,
    pub damage_taken: Vec<(usize, f32)>,
    pub heals: Vec<(usize, f32)>,
    pub buffs: Vec<(usize, f32, f32)>,
}

impl MockArena {
    pub fn with_units(units: Vec<MockUnit>) -> Self {
        Self {
            units,
            ..default()
        }
    }

    pub fn total_damage_to(&self, unit: usize) -> f32 {
        self.damage_taken
            .iter()
            .filter(|(target, _)| *target == unit)
            .map(|(_, amount)| amount)
            .sum()
    }

    pub fn healed_units(&self) -> Vec<usize> {
        self.heals.iter().map(|(target, _)| *target).collect()
    }
}

impl SpatialQuery for MockArena {
    type Handle = usize;

    fn query_in_radius(&self, center: Vec2, radius: f32, filter: &TagFilter) -> Vec<usize> {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, unit)| filter.matches(&unit.tags))
            .filter(|(_, unit)| unit.position.distance(center) <= radius)
            .map(|(index, _)| index)
            .collect()
    }

    fn position(&self, target: usize) -> Option<Vec2> {
        self.units.get(target).map(|unit| unit.position)
    }
}

impl Vitality for MockArena {
    fn vitals(&self, target: usize) -> Option<Vitals> {
        self.units.get(target).map(|unit| Vitals {
            current_health: unit.health,
            max_health: unit.max_health,
            heal_eligible: unit.heal_eligible,
            dying: unit.dying,
        })
    }

    fn take_damage(&mut self, target: usize, amount: f32) {
        if let Some(unit) = self.units.get_mut(target) {
            unit.health = (unit.health - amount).max(0.0);
        }
        self.damage_taken.push((target, amount));
    }

    fn receive_heal(&mut self, target: usize, amount: f32) {
        if let Some(unit) = self.units.get_mut(target) {
            unit.health = (unit.health + amount).min(unit.max_health);
        }
        self.heals.push((target, amount));
    }

    fn apply_defense_buff(&mut self, target: usize, amount: f32, duration: f32) {
        self.buffs.push((target, amount, duration));
    }
}

/// Records cues and hands out sequential transient ids
#[derive(Debug, Default)]
pub struct MockPresenter {
    pub played: Vec<Cue>,
    pub clips: HashMap<Cue, f32>,
    pub spawned: Vec<(u32, TransientKind, Vec2)>,
    pub released: Vec<u32>,
    next_id: u32,
}

impl MockPresenter {
    pub fn with_clip(cue: Cue, duration: f32) -> Self {
        let mut presenter = Self::default();
        presenter.clips.insert(cue, duration);
        presenter
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.played.iter().filter(|c| **c == cue).count()
    }

    pub fn live_transients(&self) -> usize {
        self.spawned.len() - self.released.len()
    }
}

impl Presentation for MockPresenter {
    fn play(&mut self, cue: Cue, _at: Vec2) {
        self.played.push(cue);
    }

    fn clip_duration(&self, cue: Cue) -> Option<f32> {
        self.clips.get(&cue).copied()
    }
}

impl TransientSpawner for MockPresenter {
    type Handle = u32;

    fn spawn_transient(&mut self, kind: TransientKind, at: Vec2) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.spawned.push((id, kind, at));
        id
    }

    fn release_transient(&mut self, handle: u32) {
        self.released.push(handle);
    }
}
