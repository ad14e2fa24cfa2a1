//! Behavior components
//!
//! ECS wrappers around the behavior cores plus the helpers that spawn the
//! unit archetypes used by scenarios.

use bevy::prelude::*;

use super::config::BehaviorSettings;
use super::death_trigger::{DeathTrigger, ZoneTemplate};
use super::heal_cycle::{HealCycle, HealCycleConfig};
use super::tags::Tag;
use super::zone::{TimedZoneEffect, ZoneKind};
use crate::combat::components::{HealExcluded, Health, Tags};

/// A live zone entity
#[derive(Component, Debug, Clone)]
pub struct ZoneEffect {
    pub zone: TimedZoneEffect,
}

impl ZoneEffect {
    pub fn new(zone: TimedZoneEffect) -> Self {
        Self { zone }
    }

    /// Name used for the zone entity and in log lines
    pub fn display_name(kind: ZoneKind) -> &'static str {
        match kind {
            ZoneKind::Damage => "Poison Pool",
            ZoneKind::Heal => "Healing Spring",
        }
    }

    /// Ability name reported in combat events
    pub fn ability_name(kind: ZoneKind) -> &'static str {
        match kind {
            ZoneKind::Damage => "Caustic Pulse",
            ZoneKind::Heal => "Renewing Pulse",
        }
    }
}

/// Marker: the zone has open/close presentation attached.
/// Zones without it are destroyed the moment they close.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ZoneVisuals;

/// Support unit running a heal cycle.
///
/// The cycle is created on the first tick so its clock starts at the time the
/// healer first runs, not when it was queued for spawning.
#[derive(Component, Debug, Clone)]
pub struct SupportHealer {
    config: HealCycleConfig,
    cycle: Option<HealCycle<Entity>>,
}

impl SupportHealer {
    pub fn new(config: HealCycleConfig) -> Self {
        Self {
            config,
            cycle: None,
        }
    }

    /// The running cycle, created at `now` on first use
    pub fn cycle_mut(&mut self, now: f32) -> &mut HealCycle<Entity> {
        let config = &self.config;
        self.cycle
            .get_or_insert_with(|| HealCycle::new(config.clone(), now))
    }

    /// The cycle if it has run at least once
    pub fn started_cycle_mut(&mut self) -> Option<&mut HealCycle<Entity>> {
        self.cycle.as_mut()
    }

    pub fn cycle(&self) -> Option<&HealCycle<Entity>> {
        self.cycle.as_ref()
    }

    /// Current config, including any hot-swapped parameters
    pub fn config(&self) -> &HealCycleConfig {
        self.cycle
            .as_ref()
            .map(|cycle| cycle.config())
            .unwrap_or(&self.config)
    }
}

/// Transient glow spawned on a healed unit
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct HealGlow {
    /// Healer that owns (and will release) this glow
    pub owner: Entity,
}

/// Drops a zone where the unit dies
#[derive(Component, Debug, Clone)]
pub struct SpawnPoolOnDeath {
    pub trigger: DeathTrigger,
}

impl SpawnPoolOnDeath {
    pub fn new(template: Option<ZoneTemplate>) -> Self {
        Self {
            trigger: DeathTrigger::new(template),
        }
    }
}

/// Set while the scene is being unloaded. Death triggers don't fire during teardown.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneTeardown(pub bool);

/// Runtime control of a support healer
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SupportCommand {
    pub healer: Entity,
    pub action: SupportAction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SupportAction {
    SetActive(bool),
    /// Heal now, ignoring the schedule (still requires the healer to be active)
    RunOnce,
    /// Hot-swap heal parameters; the pending deadline is kept
    Reconfigure {
        heal_amount: f32,
        interval: f32,
        search_radius: f32,
    },
}

/// Unit archetypes a scenario can place
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnitArchetype {
    /// The player character
    Player,
    /// Player-owned summon
    Summon,
    /// Plain enemy
    Grunt,
    /// Enemy that leaves a poison pool when it dies
    Bloater,
    /// Enemy running the support heal cycle
    Mender,
    /// Boss; never healed by support units
    Boss,
}

impl UnitArchetype {
    pub fn name(&self) -> &'static str {
        match self {
            UnitArchetype::Player => "Player",
            UnitArchetype::Summon => "Summon",
            UnitArchetype::Grunt => "Bog Grunt",
            UnitArchetype::Bloater => "Bloater",
            UnitArchetype::Mender => "Bog Mender",
            UnitArchetype::Boss => "Mire Queen",
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            UnitArchetype::Player => Tag::Player,
            UnitArchetype::Summon => Tag::Summon,
            UnitArchetype::Grunt | UnitArchetype::Bloater | UnitArchetype::Mender => Tag::Enemy,
            UnitArchetype::Boss => Tag::Boss,
        }
    }

    pub fn default_max_health(&self) -> f32 {
        match self {
            UnitArchetype::Player => 100.0,
            UnitArchetype::Summon => 40.0,
            UnitArchetype::Grunt => 60.0,
            UnitArchetype::Bloater => 30.0,
            UnitArchetype::Mender => 50.0,
            UnitArchetype::Boss => 300.0,
        }
    }
}

/// Spawn a unit of `archetype` at `position` with the given health.
pub fn spawn_unit(
    commands: &mut Commands,
    settings: &BehaviorSettings,
    archetype: UnitArchetype,
    label: String,
    position: Vec2,
    health: Health,
) -> Entity {
    let mut unit = commands.spawn((
        Name::new(label),
        Transform::from_xyz(position.x, position.y, 0.0),
        health,
        Tags::one(archetype.tag()),
    ));

    match archetype {
        UnitArchetype::Bloater => {
            unit.insert(SpawnPoolOnDeath::new(Some(settings.poison_pool.clone())));
        }
        UnitArchetype::Mender => {
            unit.insert(SupportHealer::new(settings.support_heal.clone()));
        }
        UnitArchetype::Boss => {
            unit.insert(HealExcluded);
        }
        UnitArchetype::Player | UnitArchetype::Summon | UnitArchetype::Grunt => {}
    }

    unit.id()
}
