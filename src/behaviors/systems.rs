//! Behavior systems
//!
//! Bridges the behavior cores to the ECS. `EcsArena` answers radius queries
//! from unit components and queues the core's mutations; they are sent as
//! combat events after the core returns, so health only changes in
//! `BehaviorPhase::Resolution`. `EcsPresenter` turns cues into
//! `PresentationEvent`s and transients into `HealGlow` entities.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::components::*;
use super::config::ClipLibrary;
use super::death_trigger::{DeathOutcome, DestroyNotice, ZoneSpawn};
use super::tags::TagFilter;
use super::world::{
    Cue, Presentation, SpatialQuery, TransientKind, TransientSpawner, Vitality, Vitals,
};
use crate::combat::components::{DespawnAfter, Dying, HealExcluded, Health, Tags};
use crate::combat::events::{DamageEvent, DefenseBuffEvent, HealingEvent, PresentationEvent};
use crate::combat::log::{CombatLog, CombatLogEventType};

/// Ability name the support heal reports in combat events
pub const SUPPORT_HEAL_ABILITY: &str = "Mending Pulse";

/// Read-only view of a unit used by the arena adapter
pub type UnitView = (
    Entity,
    &'static Transform,
    &'static Health,
    &'static Tags,
    Has<HealExcluded>,
    Has<Dying>,
);

#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingEffect {
    Damage { target: Entity, amount: f32 },
    Heal { target: Entity, amount: f32 },
    DefenseBuff { target: Entity, amount: f32, duration: f32 },
}

/// Writers for the events behaviors emit
#[derive(SystemParam)]
pub struct EffectWriters<'w> {
    damage: EventWriter<'w, DamageEvent>,
    healing: EventWriter<'w, HealingEvent>,
    buffs: EventWriter<'w, DefenseBuffEvent>,
}

/// `Vitality` over the unit query. Mutations are queued until `flush`.
pub struct EcsArena<'a, 'w, 's> {
    units: &'a Query<'w, 's, UnitView>,
    pending: Vec<PendingEffect>,
}

impl<'a, 'w, 's> EcsArena<'a, 'w, 's> {
    pub fn new(units: &'a Query<'w, 's, UnitView>) -> Self {
        Self {
            units,
            pending: Vec::new(),
        }
    }

    /// Send queued mutations as combat events attributed to `source`
    pub fn flush(self, source: Entity, ability_name: &str, writers: &mut EffectWriters) {
        for effect in self.pending {
            match effect {
                PendingEffect::Damage { target, amount } => {
                    writers.damage.send(DamageEvent {
                        source,
                        target,
                        amount,
                        ability_name: ability_name.to_string(),
                    });
                }
                PendingEffect::Heal { target, amount } => {
                    writers.healing.send(HealingEvent {
                        source,
                        target,
                        amount,
                        ability_name: ability_name.to_string(),
                    });
                }
                PendingEffect::DefenseBuff {
                    target,
                    amount,
                    duration,
                } => {
                    writers.buffs.send(DefenseBuffEvent {
                        source,
                        target,
                        amount,
                        duration,
                    });
                }
            }
        }
    }
}

impl SpatialQuery for EcsArena<'_, '_, '_> {
    type Handle = Entity;

    fn query_in_radius(&self, center: Vec2, radius: f32, filter: &TagFilter) -> Vec<Entity> {
        let radius_sq = radius * radius;
        self.units
            .iter()
            .filter(|(_, transform, _, tags, _, _)| {
                filter.matches(&tags.0)
                    && transform.translation.truncate().distance_squared(center) <= radius_sq
            })
            .map(|(entity, ..)| entity)
            .collect()
    }

    fn position(&self, target: Entity) -> Option<Vec2> {
        self.units
            .get(target)
            .ok()
            .map(|(_, transform, ..)| transform.translation.truncate())
    }
}

impl Vitality for EcsArena<'_, '_, '_> {
    fn vitals(&self, target: Entity) -> Option<Vitals> {
        let (_, _, health, _, excluded, dying) = self.units.get(target).ok()?;
        Some(Vitals {
            current_health: health.current,
            max_health: health.max,
            heal_eligible: !excluded,
            dying: dying || !health.is_alive(),
        })
    }

    fn take_damage(&mut self, target: Entity, amount: f32) {
        self.pending.push(PendingEffect::Damage { target, amount });
    }

    fn receive_heal(&mut self, target: Entity, amount: f32) {
        self.pending.push(PendingEffect::Heal { target, amount });
    }

    fn apply_defense_buff(&mut self, target: Entity, amount: f32, duration: f32) {
        self.pending.push(PendingEffect::DefenseBuff {
            target,
            amount,
            duration,
        });
    }
}

/// `Presentation` and `TransientSpawner` for one owner entity
pub struct EcsPresenter<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    clips: &'a ClipLibrary,
    owner: Entity,
    cues: Vec<PresentationEvent>,
}

impl<'a, 'w, 's> EcsPresenter<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>, clips: &'a ClipLibrary, owner: Entity) -> Self {
        Self {
            commands,
            clips,
            owner,
            cues: Vec::new(),
        }
    }

    /// Cues played since creation
    pub fn into_cues(self) -> Vec<PresentationEvent> {
        self.cues
    }
}

impl Presentation for EcsPresenter<'_, '_, '_> {
    fn play(&mut self, cue: Cue, at: Vec2) {
        self.cues.push(PresentationEvent {
            owner: self.owner,
            cue,
            position: at,
        });
    }

    fn clip_duration(&self, cue: Cue) -> Option<f32> {
        self.clips.duration(cue)
    }
}

impl TransientSpawner for EcsPresenter<'_, '_, '_> {
    type Handle = Entity;

    fn spawn_transient(&mut self, kind: TransientKind, at: Vec2) -> Entity {
        match kind {
            TransientKind::HealGlow => self
                .commands
                .spawn((
                    Name::new("Heal Glow"),
                    HealGlow { owner: self.owner },
                    Transform::from_xyz(at.x, at.y, 0.0),
                ))
                .id(),
        }
    }

    fn release_transient(&mut self, handle: Entity) {
        if let Some(mut glow) = self.commands.get_entity(handle) {
            glow.despawn();
        }
    }
}

/// Spawn a zone entity for `spawn`. Animated templates get `ZoneVisuals` and
/// play their opening cue.
pub fn spawn_zone(
    commands: &mut Commands,
    clips: &ClipLibrary,
    spawn: &ZoneSpawn,
    cues: &mut EventWriter<PresentationEvent>,
    combat_log: &mut CombatLog,
) -> Entity {
    let params = &spawn.template.params;
    let name = ZoneEffect::display_name(params.kind);
    let entity = commands
        .spawn((
            Name::new(name),
            Transform::from_xyz(spawn.position.x, spawn.position.y, 0.0),
        ))
        .id();

    let zone = if spawn.template.animated {
        let mut presenter = EcsPresenter::new(commands, clips, entity);
        let zone = spawn.instantiate(Some(&mut presenter as &mut dyn Presentation));
        for cue in presenter.into_cues() {
            cues.send(cue);
        }
        commands.entity(entity).insert(ZoneVisuals);
        zone
    } else {
        spawn.instantiate(None)
    };

    combat_log.log(
        CombatLogEventType::ZoneOpened,
        format!(
            "{} opens at ({:.1}, {:.1}) for {:.1}s, radius {:.1}",
            name, spawn.position.x, spawn.position.y, params.lifetime, params.radius
        ),
    );

    commands.entity(entity).insert(ZoneEffect::new(zone));
    entity
}

/// Pulse every zone and close the ones that reached their lifetime
pub fn tick_zone_effects(
    mut commands: Commands,
    time: Res<Time>,
    clips: Res<ClipLibrary>,
    mut zones: Query<(Entity, &Name, &mut ZoneEffect, Has<ZoneVisuals>)>,
    units: Query<UnitView>,
    mut writers: EffectWriters,
    mut cues: EventWriter<PresentationEvent>,
    mut combat_log: ResMut<CombatLog>,
) {
    let dt = time.delta_secs();

    for (entity, name, mut effect, has_visuals) in zones.iter_mut() {
        if effect.zone.is_closing() {
            continue;
        }

        let mut arena = EcsArena::new(&units);
        let mut presenter = EcsPresenter::new(&mut commands, &clips, entity);
        let step = if has_visuals {
            effect
                .zone
                .advance(dt, &mut arena, Some(&mut presenter as &mut dyn Presentation))
        } else {
            effect.zone.advance(dt, &mut arena, None)
        };
        for cue in presenter.into_cues() {
            cues.send(cue);
        }
        let ability = ZoneEffect::ability_name(effect.zone.params().kind);
        arena.flush(entity, ability, &mut writers);

        if step.pulses > 0 {
            debug!(
                "{} pulsed {} time(s), {} hit(s)",
                name.as_str(),
                step.pulses,
                step.hits
            );
        }

        let Some(delay) = step.despawn_after else {
            continue;
        };

        combat_log.log(
            CombatLogEventType::ZoneClosed,
            format!(
                "{} closes after {} pulse(s)",
                name.as_str(),
                effect.zone.pulses()
            ),
        );

        if delay <= 0.0 {
            commands.entity(entity).despawn();
        } else {
            commands
                .entity(entity)
                .insert(DespawnAfter::new(delay));
        }
    }
}

/// Apply queued `SupportCommand`s, then advance every live healer
pub fn tick_support_healers(
    mut commands: Commands,
    time: Res<Time>,
    clips: Res<ClipLibrary>,
    mut support_commands: EventReader<SupportCommand>,
    mut healers: Query<(Entity, &Transform, &mut SupportHealer), Without<Dying>>,
    units: Query<UnitView>,
    mut writers: EffectWriters,
    mut cues: EventWriter<PresentationEvent>,
) {
    let now = time.elapsed_secs();

    for command in support_commands.read() {
        let Ok((entity, transform, mut healer)) = healers.get_mut(command.healer) else {
            warn!("Support command for missing healer {:?}", command.healer);
            continue;
        };
        let cycle = healer.cycle_mut(now);

        match command.action {
            SupportAction::SetActive(active) => cycle.set_active(active, now),
            SupportAction::Reconfigure {
                heal_amount,
                interval,
                search_radius,
            } => cycle.reconfigure(heal_amount, interval, search_radius),
            SupportAction::RunOnce => {
                let mut arena = EcsArena::new(&units);
                let mut presenter = EcsPresenter::new(&mut commands, &clips, entity);
                let center = transform.translation.truncate();
                let report = cycle.run_once(now, entity, center, &mut arena, &mut presenter);
                if report.is_none() {
                    debug!("Ignoring run-once for inactive healer {:?}", entity);
                }
                for cue in presenter.into_cues() {
                    cues.send(cue);
                }
                arena.flush(entity, SUPPORT_HEAL_ABILITY, &mut writers);
            }
        }
    }

    for (entity, transform, mut healer) in healers.iter_mut() {
        let mut arena = EcsArena::new(&units);
        let mut presenter = EcsPresenter::new(&mut commands, &clips, entity);
        let center = transform.translation.truncate();

        if let Some(report) =
            healer
                .cycle_mut(now)
                .advance(now, entity, center, &mut arena, &mut presenter)
        {
            debug!(
                "{:?} healed {} of {} eligible allies",
                entity,
                report.healed.len(),
                report.eligible
            );
        }

        for cue in presenter.into_cues() {
            cues.send(cue);
        }
        arena.flush(entity, SUPPORT_HEAL_ABILITY, &mut writers);
    }
}

/// Observer: a pool spawner was removed (despawned). Delivers the destroy
/// notice to its trigger and spawns the zone if it fires.
pub fn spawn_pool_on_death(
    trigger: Trigger<OnRemove, SpawnPoolOnDeath>,
    mut commands: Commands,
    mut spawners: Query<(&mut SpawnPoolOnDeath, &Transform, Option<&Health>)>,
    teardown: Res<SceneTeardown>,
    clips: Res<ClipLibrary>,
    mut cues: EventWriter<PresentationEvent>,
    mut combat_log: ResMut<CombatLog>,
) {
    let entity = trigger.entity();
    let Ok((mut spawner, transform, health)) = spawners.get_mut(entity) else {
        return;
    };

    let notice = DestroyNotice {
        // Units without health can't die, only be removed
        health: health.map(|h| h.current).unwrap_or(f32::INFINITY),
        position: transform.translation.truncate(),
        scene_tearing_down: teardown.0,
    };

    match spawner.trigger.on_destroy(&notice) {
        DeathOutcome::Spawn(spawn) => {
            let zone = spawn_zone(&mut commands, &clips, &spawn, &mut cues, &mut combat_log);
            debug!("{:?} dropped zone {:?}", entity, zone);
        }
        DeathOutcome::MissingTemplate => {
            combat_log.log(
                CombatLogEventType::ConfigError,
                format!("{:?} died without a zone template", entity),
            );
        }
        DeathOutcome::Survived | DeathOutcome::AlreadyFired | DeathOutcome::SceneTeardown => {}
    }
}

/// Observer: a support healer was removed. Its outstanding glows go with it.
pub fn release_glows_on_healer_removed(
    trigger: Trigger<OnRemove, SupportHealer>,
    mut commands: Commands,
    clips: Res<ClipLibrary>,
    mut healers: Query<&mut SupportHealer>,
) {
    let entity = trigger.entity();
    let Ok(mut healer) = healers.get_mut(entity) else {
        return;
    };

    let mut presenter = EcsPresenter::new(&mut commands, &clips, entity);
    if let Some(cycle) = healer.started_cycle_mut() {
        let released = cycle.teardown(&mut presenter);
        if released > 0 {
            debug!("Released {} heal glow(s) from {:?}", released, entity);
        }
    }
}

/// Unload the scene: set the teardown flag, then despawn every unit and zone.
/// Death triggers see the flag and stay silent. Returns the number despawned.
pub fn begin_scene_teardown(world: &mut World) -> usize {
    world.insert_resource(SceneTeardown(true));

    let mut scene = world.query_filtered::<Entity, Or<(With<Health>, With<ZoneEffect>)>>();
    let entities: Vec<Entity> = scene.iter(world).collect();

    let mut despawned = 0;
    for entity in entities {
        if world.despawn(entity) {
            despawned += 1;
        }
    }

    info!("Scene teardown despawned {} entities", despawned);
    despawned
}
