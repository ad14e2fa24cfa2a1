//! Combat systems
//!
//! Apply the damage, healing and buff events emitted by behaviors, detect
//! deaths and run the despawn timers. Every applied change is recorded in the
//! `CombatLog`.

use bevy::prelude::*;

use super::components::*;
use super::events::*;
use super::log::{CombatLog, CombatLogEventType};
use crate::behaviors::config::BehaviorSettings;
use crate::behaviors::constants::CORPSE_LINGER_SECS;

fn display_name(names: &Query<&Name>, entity: Entity) -> String {
    names
        .get(entity)
        .map(|name| name.as_str().to_string())
        .unwrap_or_else(|_| format!("Unknown ({:?})", entity))
}

/// Advance the combat log clock
pub fn advance_combat_log_clock(time: Res<Time>, mut combat_log: ResMut<CombatLog>) {
    combat_log.match_time += time.delta_secs();
}

/// Apply damage events. Active defense buffs reduce each hit by a flat amount.
pub fn process_damage_events(
    mut commands: Commands,
    mut damage_events: EventReader<DamageEvent>,
    mut targets: Query<(&mut Health, Option<&DefenseBuff>), Without<Dying>>,
    names: Query<&Name>,
    mut combat_log: ResMut<CombatLog>,
) {
    for event in damage_events.read() {
        let Ok((mut health, buff)) = targets.get_mut(event.target) else {
            continue;
        };
        if !health.is_alive() {
            continue;
        }

        let reduction = buff.map(|b| b.amount).unwrap_or(0.0);
        let applied = health.take_damage((event.amount - reduction).max(0.0));
        let is_killing_blow = !health.is_alive();

        if let Some(mut target) = commands.get_entity(event.target) {
            target.insert(LastHitBy(event.source));
        }

        let source_name = display_name(&names, event.source);
        let target_name = display_name(&names, event.target);
        let message = if reduction > 0.0 {
            format!(
                "{}'s {} hits {} for {:.0} ({:.0} absorbed)",
                source_name,
                event.ability_name,
                target_name,
                applied,
                event.amount - applied
            )
        } else {
            format!(
                "{}'s {} hits {} for {:.0}",
                source_name, event.ability_name, target_name, applied
            )
        };

        combat_log.log_damage(
            source_name,
            target_name,
            event.ability_name.clone(),
            applied,
            is_killing_blow,
            message,
        );
    }
}

/// Apply healing events. Dying and heal-excluded units are skipped.
pub fn process_healing_events(
    mut healing_events: EventReader<HealingEvent>,
    mut targets: Query<&mut Health, (Without<Dying>, Without<HealExcluded>)>,
    names: Query<&Name>,
    mut combat_log: ResMut<CombatLog>,
) {
    for event in healing_events.read() {
        let Ok(mut health) = targets.get_mut(event.target) else {
            continue;
        };
        if !health.is_alive() {
            continue;
        }

        let applied = health.receive_heal(event.amount);
        let source_name = display_name(&names, event.source);
        let target_name = display_name(&names, event.target);
        let message = format!(
            "{}'s {} heals {} for {:.0}",
            source_name, event.ability_name, target_name, applied
        );

        combat_log.log_healing(
            source_name,
            target_name,
            event.ability_name.clone(),
            applied,
            message,
        );
    }
}

/// Apply defense buffs. A new buff replaces the old one and refreshes its duration.
pub fn apply_defense_buffs(
    mut commands: Commands,
    mut buff_events: EventReader<DefenseBuffEvent>,
    targets: Query<(), (With<Health>, Without<Dying>)>,
    names: Query<&Name>,
    mut combat_log: ResMut<CombatLog>,
) {
    for event in buff_events.read() {
        if targets.get(event.target).is_err() {
            continue;
        }
        let Some(mut target) = commands.get_entity(event.target) else {
            continue;
        };

        target.insert(DefenseBuff {
            amount: event.amount,
            remaining: event.duration,
        });

        let message = format!(
            "{} gains {:.0} defense for {:.1}s from {}",
            display_name(&names, event.target),
            event.amount,
            event.duration,
            display_name(&names, event.source)
        );
        combat_log.log(CombatLogEventType::Buff, message);
    }
}

/// Count down defense buffs and remove expired ones
pub fn tick_defense_buffs(
    mut commands: Commands,
    time: Res<Time>,
    mut buffs: Query<(Entity, &mut DefenseBuff)>,
) {
    let dt = time.delta_secs();
    for (entity, mut buff) in buffs.iter_mut() {
        buff.remaining -= dt;
        if buff.remaining <= 0.0 {
            commands.entity(entity).remove::<DefenseBuff>();
        }
    }
}

/// Mark units at zero health as dying and schedule their despawn
pub fn check_combatant_deaths(
    mut commands: Commands,
    settings: Option<Res<BehaviorSettings>>,
    units: Query<(Entity, &Health, Option<&LastHitBy>), Without<Dying>>,
    names: Query<&Name>,
    mut death_events: EventWriter<CombatantDeathEvent>,
    mut combat_log: ResMut<CombatLog>,
) {
    let linger = settings
        .map(|s| s.corpse_linger_secs)
        .unwrap_or(CORPSE_LINGER_SECS);

    for (entity, health, last_hit) in units.iter() {
        if health.is_alive() {
            continue;
        }

        let killer = last_hit.map(|hit| hit.0);
        commands
            .entity(entity)
            .insert((Dying, DespawnAfter::new(linger)))
            .remove::<DefenseBuff>();

        let victim_name = display_name(&names, entity);
        let killer_name = killer.map(|k| display_name(&names, k));
        let message = match &killer_name {
            Some(killer_name) => format!("{} has been slain by {}", victim_name, killer_name),
            None => format!("{} has died", victim_name),
        };
        info!("{}", message);
        combat_log.log_death(victim_name, killer_name, message);

        death_events.send(CombatantDeathEvent {
            victim: entity,
            killer,
        });
    }
}

/// Despawn entities whose linger timer ran out
pub fn tick_despawn_timers(
    mut commands: Commands,
    time: Res<Time>,
    mut timers: Query<(Entity, &mut DespawnAfter)>,
) {
    let dt = time.delta_secs();
    for (entity, mut timer) in timers.iter_mut() {
        timer.remaining -= dt;
        if timer.remaining <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}
