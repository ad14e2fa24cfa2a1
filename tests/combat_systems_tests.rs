//! Integration tests for the combat systems
//!
//! Drive a bare app with hand-sent events to check mitigation, heal
//! clamping, death handling and kill credit.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use blightmire::behaviors::config::BehaviorSettings;
use blightmire::behaviors::BehaviorsPlugin;
use blightmire::combat::components::{DefenseBuff, Dying, HealExcluded, Health};
use blightmire::combat::events::{DamageEvent, DefenseBuffEvent, HealingEvent};
use blightmire::combat::log::{CombatLog, CombatLogEventType, StructuredEventData};

fn create_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(10)))
        .insert_resource(BehaviorSettings::default())
        .add_plugins(BehaviorsPlugin);
    app.update();
    app
}

fn spawn(app: &mut App, name: &str, health: Health) -> Entity {
    app.world_mut().spawn((Name::new(name.to_string()), health)).id()
}

fn damage(app: &mut App, source: Entity, target: Entity, amount: f32) {
    app.world_mut().send_event(DamageEvent {
        source,
        target,
        amount,
        ability_name: "Caustic Pulse".to_string(),
    });
}

#[test]
fn test_defense_buff_reduces_damage_flat() {
    let mut app = create_app();
    let pool = spawn(&mut app, "Poison Pool", Health::new(1.0));
    let player = spawn(&mut app, "Player", Health::new(100.0));
    app.world_mut().entity_mut(player).insert(DefenseBuff {
        amount: 2.0,
        remaining: 10.0,
    });

    damage(&mut app, pool, player, 5.0);
    app.update();

    assert_eq!(app.world().get::<Health>(player).unwrap().current, 97.0);
}

#[test]
fn test_buff_larger_than_hit_absorbs_it() {
    let mut app = create_app();
    let pool = spawn(&mut app, "Poison Pool", Health::new(1.0));
    let player = spawn(&mut app, "Player", Health::new(100.0));
    app.world_mut().send_event(DefenseBuffEvent {
        source: pool,
        target: player,
        amount: 10.0,
        duration: 5.0,
    });
    app.update();

    damage(&mut app, pool, player, 5.0);
    app.update();

    assert_eq!(app.world().get::<Health>(player).unwrap().current, 100.0);
    assert_eq!(
        app.world().resource::<CombatLog>().count(CombatLogEventType::Buff),
        1
    );
}

#[test]
fn test_defense_buff_expires() {
    let mut app = create_app();
    let player = spawn(&mut app, "Player", Health::new(100.0));
    app.world_mut().entity_mut(player).insert(DefenseBuff {
        amount: 2.0,
        remaining: 0.05,
    });

    for _ in 0..10 {
        app.update();
    }

    assert!(app.world().get::<DefenseBuff>(player).is_none());
}

#[test]
fn test_healing_clamps_and_skips_excluded() {
    let mut app = create_app();
    let mender = spawn(&mut app, "Mender", Health::new(50.0));
    let grunt = spawn(&mut app, "Grunt", Health::with_current(55.0, 60.0));
    let boss = spawn(&mut app, "Boss", Health::with_current(100.0, 300.0));
    app.world_mut().entity_mut(boss).insert(HealExcluded);

    for target in [grunt, boss] {
        app.world_mut().send_event(HealingEvent {
            source: mender,
            target,
            amount: 15.0,
            ability_name: "Mending Pulse".to_string(),
        });
    }
    app.update();

    assert_eq!(app.world().get::<Health>(grunt).unwrap().current, 60.0);
    assert_eq!(app.world().get::<Health>(boss).unwrap().current, 100.0);
    // Only the applied amount is logged
    assert_eq!(
        app.world().resource::<CombatLog>().healing_received_by("Grunt"),
        5.0
    );
}

#[test]
fn test_killing_blow_credits_source_and_despawns_corpse() {
    let mut app = create_app();
    let pool = spawn(&mut app, "Poison Pool", Health::new(1.0));
    let summon = spawn(&mut app, "Summon", Health::with_current(4.0, 40.0));

    damage(&mut app, pool, summon, 5.0);
    app.update();

    assert!(app.world().get::<Dying>(summon).is_some());
    let log = app.world().resource::<CombatLog>();
    assert_eq!(log.killing_blows("Poison Pool"), 1);
    let deaths = log.filter_by_type(CombatLogEventType::Death);
    assert_eq!(
        deaths[0].data,
        Some(StructuredEventData::Death {
            victim: "Summon".to_string(),
            killer: Some("Poison Pool".to_string()),
        })
    );

    // Corpse linger is 0.25s at 10ms per frame
    for _ in 0..30 {
        app.update();
    }
    assert!(app.world().get::<Health>(summon).is_none());
}

#[test]
fn test_dying_units_take_no_further_damage() {
    let mut app = create_app();
    let pool = spawn(&mut app, "Poison Pool", Health::new(1.0));
    let summon = spawn(&mut app, "Summon", Health::with_current(4.0, 40.0));

    damage(&mut app, pool, summon, 5.0);
    app.update();
    damage(&mut app, pool, summon, 5.0);
    app.update();

    let log = app.world().resource::<CombatLog>();
    assert_eq!(log.count(CombatLogEventType::Damage), 1);
    assert_eq!(log.count(CombatLogEventType::Death), 1);
    assert_eq!(log.damage_taken_by("Summon"), 4.0);
}
