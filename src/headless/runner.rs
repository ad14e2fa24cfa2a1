//! Headless scenario execution
//!
//! Runs a scenario in a windowless app with a fixed frame step, suitable for
//! automated testing and balance checks.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;

use crate::behaviors::components::{
    spawn_unit, SupportAction, SupportCommand, UnitArchetype, ZoneEffect,
};
use crate::behaviors::config::BehaviorSettings;
use crate::behaviors::systems::begin_scene_teardown;
use crate::behaviors::BehaviorsPlugin;
use crate::combat::components::{Dying, Health};
use crate::combat::log::{CombatLog, CombatLogEventType, StructuredEventData};
use crate::error::ConfigError;

use super::config::{HeadlessScenarioConfig, ScriptedKill, ScriptedSupportCommand};

/// Simulation step in seconds
pub const FRAME_SECS: f32 = 1.0 / 60.0;

/// Result of a completed headless scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: String,
    /// Simulated seconds
    pub elapsed_secs: f32,
    pub units: Vec<UnitResult>,
    /// Zones opened during the run
    pub zones_opened: usize,
    /// Zones still open when the result was taken
    pub zones_active: usize,
    pub total_damage: f32,
    pub total_healing: f32,
    pub deaths: usize,
    pub random_seed: Option<u64>,
}

/// Statistics for a single unit after the run
#[derive(Debug, Clone, Serialize)]
pub struct UnitResult {
    pub label: String,
    pub archetype: UnitArchetype,
    pub max_health: f32,
    /// Health remaining (0 if despawned)
    pub final_health: f32,
    pub survived: bool,
    pub damage_taken: f32,
    pub healing_received: f32,
}

struct SpawnedUnit {
    entity: Entity,
    label: String,
    archetype: UnitArchetype,
    max_health: f32,
}

/// Drives one scenario frame by frame
pub struct ScenarioRunner {
    app: App,
    config: HeadlessScenarioConfig,
    units: Vec<SpawnedUnit>,
    kills: Vec<ScriptedKill>,
    commands: Vec<ScriptedSupportCommand>,
    elapsed: f32,
}

impl ScenarioRunner {
    /// Build the app and spawn the scenario's units
    pub fn new(config: HeadlessScenarioConfig, settings: BehaviorSettings) -> Self {
        Self::build(config, settings, false)
    }

    fn build(config: HeadlessScenarioConfig, settings: BehaviorSettings, with_logging: bool) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        if with_logging {
            app.add_plugins(LogPlugin::default());
        }
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            FRAME_SECS,
        )))
        .insert_resource(settings.clone())
        .add_plugins(BehaviorsPlugin);

        let mut rng = match config.random_seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        let mut units = Vec::with_capacity(config.units.len());
        {
            let mut commands = app.world_mut().commands();
            for (i, spawn) in config.units.iter().enumerate() {
                let mut position = Vec2::from(spawn.position);
                if config.position_jitter > 0.0 {
                    let jitter = config.position_jitter;
                    position += Vec2::new(
                        rng.gen_range(-jitter..=jitter),
                        rng.gen_range(-jitter..=jitter),
                    );
                }

                let max_health = spawn.max_health();
                let health = Health::with_current(spawn.health.unwrap_or(max_health), max_health);
                let label = spawn.label(i);
                let entity = spawn_unit(
                    &mut commands,
                    &settings,
                    spawn.archetype,
                    label.clone(),
                    position,
                    health,
                );
                units.push(SpawnedUnit {
                    entity,
                    label,
                    archetype: spawn.archetype,
                    max_health,
                });
            }
        }
        app.world_mut().flush();

        app.world_mut().resource_mut::<CombatLog>().log(
            CombatLogEventType::MatchEvent,
            format!("Scenario '{}' started with {} units", config.name, units.len()),
        );

        let mut kills = config.kills.clone();
        kills.sort_by(|a, b| b.at_secs.total_cmp(&a.at_secs));
        let mut commands = config.support_commands.clone();
        commands.sort_by(|a, b| b.at_secs.total_cmp(&a.at_secs));

        // The first update only initializes the clock (zero delta)
        app.update();

        Self {
            app,
            config,
            units,
            kills,
            commands,
            elapsed: 0.0,
        }
    }

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Entity spawned for the unit at `index`
    pub fn unit(&self, index: usize) -> Option<Entity> {
        self.units.get(index).map(|u| u.entity)
    }

    pub fn combat_log(&self) -> &CombatLog {
        self.app.world().resource::<CombatLog>()
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.config.duration_secs
    }

    /// Set a unit's health to zero; it dies on the next frame
    pub fn kill(&mut self, index: usize) {
        let Some(entity) = self.unit(index) else {
            return;
        };
        match self.app.world_mut().get_mut::<Health>(entity) {
            Some(mut health) => health.current = 0.0,
            None => warn!("Scripted kill of unit {} skipped: already gone", index),
        }
    }

    pub fn send_support_command(&mut self, index: usize, action: impl Into<SupportAction>) {
        let Some(healer) = self.unit(index) else {
            return;
        };
        self.app.world_mut().send_event(SupportCommand {
            healer,
            action: action.into(),
        });
    }

    /// Apply due scripted events and run one frame
    pub fn step(&mut self) {
        while self.kills.last().is_some_and(|k| k.at_secs <= self.elapsed) {
            if let Some(kill) = self.kills.pop() {
                self.kill(kill.unit);
            }
        }
        while self.commands.last().is_some_and(|c| c.at_secs <= self.elapsed) {
            if let Some(command) = self.commands.pop() {
                self.send_support_command(command.unit, command.action);
            }
        }

        self.app.update();
        self.elapsed += FRAME_SECS;
    }

    /// Run whole frames covering `secs`
    pub fn advance_secs(&mut self, secs: f32) {
        let frames = (secs / FRAME_SECS).round() as usize;
        for _ in 0..frames {
            self.step();
        }
    }

    /// Step until the configured duration has elapsed
    pub fn run_to_end(&mut self) -> ScenarioResult {
        while !self.is_finished() {
            self.step();
        }
        self.result()
    }

    /// Unload the scene. Returns the number of entities despawned.
    pub fn teardown(&mut self) -> usize {
        let despawned = begin_scene_teardown(self.app.world_mut());
        self.app.world_mut().resource_mut::<CombatLog>().log(
            CombatLogEventType::MatchEvent,
            format!("Scenario '{}' unloaded", self.config.name),
        );
        self.app.update();
        despawned
    }

    /// Snapshot of the run so far
    pub fn result(&mut self) -> ScenarioResult {
        let world = self.app.world_mut();
        let mut zones = world.query_filtered::<Entity, With<ZoneEffect>>();
        let zones_active = zones.iter(world).count();

        let world = self.app.world();
        let log = world.resource::<CombatLog>();

        let units = self
            .units
            .iter()
            .map(|unit| {
                let final_health = world
                    .get::<Health>(unit.entity)
                    .map(|h| h.current)
                    .unwrap_or(0.0);
                let survived = final_health > 0.0 && world.get::<Dying>(unit.entity).is_none();

                UnitResult {
                    label: unit.label.clone(),
                    archetype: unit.archetype,
                    max_health: unit.max_health,
                    final_health,
                    survived,
                    damage_taken: log.damage_taken_by(&unit.label),
                    healing_received: log.healing_received_by(&unit.label),
                }
            })
            .collect();

        ScenarioResult {
            scenario: self.config.name.clone(),
            elapsed_secs: self.elapsed,
            units,
            zones_opened: log.count(CombatLogEventType::ZoneOpened),
            zones_active,
            total_damage: sum_amounts(log, CombatLogEventType::Damage),
            total_healing: sum_amounts(log, CombatLogEventType::Healing),
            deaths: log.count(CombatLogEventType::Death),
            random_seed: self.config.random_seed,
        }
    }
}

fn sum_amounts(log: &CombatLog, event_type: CombatLogEventType) -> f32 {
    log.filter_by_type(event_type)
        .into_iter()
        .filter_map(|entry| match &entry.data {
            Some(StructuredEventData::Damage { amount, .. })
            | Some(StructuredEventData::Healing { amount, .. }) => Some(*amount),
            _ => None,
        })
        .sum()
}

/// Run a headless scenario with the given configuration
pub fn run_headless_scenario(
    config: HeadlessScenarioConfig,
    settings: BehaviorSettings,
) -> Result<ScenarioResult, ConfigError> {
    config.validate()?;
    settings.validate()?;

    println!("Starting headless scenario '{}'...", config.name);
    println!("  Units: {}", config.units.len());
    println!("  Duration: {:.1}s", config.duration_secs);

    let output_path = config.output_path.clone();
    let mut runner = ScenarioRunner::build(config, settings, true);
    let result = runner.run_to_end();
    runner.teardown();

    println!(
        "Scenario complete after {:.1}s: {} death(s), {} zone(s), {:.0} damage, {:.0} healing",
        result.elapsed_secs,
        result.deaths,
        result.zones_opened,
        result.total_damage,
        result.total_healing
    );
    for unit in &result.units {
        println!(
            "  {:<16} {:>6.1}/{:<6.1} {}",
            unit.label,
            unit.final_health,
            unit.max_health,
            if unit.survived { "alive" } else { "dead" }
        );
    }

    if let Some(path) = output_path {
        let written = runner.combat_log().save_to_file(&path)?;
        println!("Combat log saved to: {}", written);
    }

    Ok(result)
}
