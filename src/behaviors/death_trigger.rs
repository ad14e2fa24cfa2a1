//! Death-Triggered Zone Spawner
//!
//! Units carrying a `DeathTrigger` leave a zone (usually a poison pool) where
//! they die. The trigger is armed at creation and consumed by the first
//! destroy notification that qualifies:
//! - the unit's health is at or below zero
//! - the trigger hasn't fired yet
//! - the scene isn't being torn down
//!
//! A trigger without a template is a configuration error: it is logged, the
//! spawn is skipped and the trigger is consumed so the error is reported once.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::world::Presentation;
use super::zone::{TimedZoneEffect, ZoneParams};

/// Zone parameters plus whether the spawned zone gets a presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTemplate {
    pub params: ZoneParams,
    /// Spawn with opening/closing animations. Zones without them vanish on close.
    #[serde(default = "default_animated")]
    pub animated: bool,
}

fn default_animated() -> bool {
    true
}

/// Destroy notification delivered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestroyNotice {
    /// Tracked health of the owner at destruction time
    pub health: f32,
    pub position: Vec2,
    /// True while the surrounding scene is unloading
    pub scene_tearing_down: bool,
}

/// A zone to place at a death location
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSpawn {
    pub template: ZoneTemplate,
    pub position: Vec2,
}

impl ZoneSpawn {
    pub fn instantiate(&self, presentation: Option<&mut dyn Presentation>) -> TimedZoneEffect {
        TimedZoneEffect::initialize(self.template.params.clone(), self.position, presentation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeathOutcome {
    Spawn(ZoneSpawn),
    /// Owner was destroyed while still alive (despawned, not killed)
    Survived,
    AlreadyFired,
    SceneTeardown,
    MissingTemplate,
}

#[derive(Debug, Clone)]
pub struct DeathTrigger {
    template: Option<ZoneTemplate>,
    fired: bool,
}

impl DeathTrigger {
    pub fn new(template: Option<ZoneTemplate>) -> Self {
        Self {
            template,
            fired: false,
        }
    }

    pub fn template(&self) -> Option<&ZoneTemplate> {
        self.template.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        !self.fired
    }

    pub fn on_destroy(&mut self, notice: &DestroyNotice) -> DeathOutcome {
        if self.fired {
            return DeathOutcome::AlreadyFired;
        }
        if notice.scene_tearing_down {
            return DeathOutcome::SceneTeardown;
        }
        if notice.health > 0.0 {
            return DeathOutcome::Survived;
        }

        self.fired = true;

        let Some(template) = self.template.clone() else {
            error!(
                "Death trigger at ({:.1}, {:.1}) has no zone template; skipping spawn",
                notice.position.x, notice.position.y
            );
            return DeathOutcome::MissingTemplate;
        };

        DeathOutcome::Spawn(ZoneSpawn {
            template,
            position: notice.position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::tags::{Tag, TagFilter};
    use crate::behaviors::testing::MockPresenter;
    use crate::behaviors::world::Cue;
    use crate::behaviors::zone::ZoneKind;

    fn template() -> ZoneTemplate {
        ZoneTemplate {
            params: ZoneParams {
                kind: ZoneKind::Damage,
                per_tick: 4.0,
                tick_interval: 0.5,
                lifetime: 3.0,
                radius: 2.0,
                filter: TagFilter::only(Tag::Player),
            },
            animated: true,
        }
    }

    fn killed_at(x: f32, y: f32) -> DestroyNotice {
        DestroyNotice {
            health: 0.0,
            position: Vec2::new(x, y),
            scene_tearing_down: false,
        }
    }

    #[test]
    fn test_fires_once_on_death() {
        let mut trigger = DeathTrigger::new(Some(template()));

        let first = trigger.on_destroy(&killed_at(4.0, 2.0));
        let second = trigger.on_destroy(&killed_at(4.0, 2.0));

        assert_eq!(
            first,
            DeathOutcome::Spawn(ZoneSpawn {
                template: template(),
                position: Vec2::new(4.0, 2.0),
            })
        );
        assert_eq!(second, DeathOutcome::AlreadyFired);
        assert!(!trigger.is_armed());
    }

    #[test]
    fn test_negative_health_counts_as_dead() {
        let mut trigger = DeathTrigger::new(Some(template()));
        let notice = DestroyNotice {
            health: -12.0,
            ..killed_at(0.0, 0.0)
        };

        assert!(matches!(trigger.on_destroy(&notice), DeathOutcome::Spawn(_)));
    }

    #[test]
    fn test_alive_owner_does_not_fire_and_stays_armed() {
        let mut trigger = DeathTrigger::new(Some(template()));
        let notice = DestroyNotice {
            health: 30.0,
            ..killed_at(0.0, 0.0)
        };

        assert_eq!(trigger.on_destroy(&notice), DeathOutcome::Survived);
        assert!(trigger.is_armed());
    }

    #[test]
    fn test_scene_teardown_suppresses_spawn() {
        let mut trigger = DeathTrigger::new(Some(template()));
        let notice = DestroyNotice {
            scene_tearing_down: true,
            ..killed_at(0.0, 0.0)
        };

        assert_eq!(trigger.on_destroy(&notice), DeathOutcome::SceneTeardown);
    }

    #[test]
    fn test_second_notice_during_unload_after_death_spawns_nothing() {
        let mut trigger = DeathTrigger::new(Some(template()));
        assert!(matches!(trigger.on_destroy(&killed_at(1.0, 1.0)), DeathOutcome::Spawn(_)));

        let unload = DestroyNotice {
            scene_tearing_down: true,
            ..killed_at(1.0, 1.0)
        };
        assert_eq!(trigger.on_destroy(&unload), DeathOutcome::AlreadyFired);
    }

    #[test]
    fn test_missing_template_is_reported_once_without_panicking() {
        let mut trigger = DeathTrigger::new(None);

        assert_eq!(trigger.on_destroy(&killed_at(0.0, 0.0)), DeathOutcome::MissingTemplate);
        assert_eq!(trigger.on_destroy(&killed_at(0.0, 0.0)), DeathOutcome::AlreadyFired);
    }

    #[test]
    fn test_spawn_instantiates_zone_with_template_params() {
        let mut trigger = DeathTrigger::new(Some(template()));
        let DeathOutcome::Spawn(spawn) = trigger.on_destroy(&killed_at(3.0, -1.0)) else {
            panic!("expected a spawn");
        };

        let mut presenter = MockPresenter::default();
        let zone = spawn.instantiate(Some(&mut presenter));

        assert_eq!(zone.center(), Vec2::new(3.0, -1.0));
        assert_eq!(zone.params(), &template().params);
        assert_eq!(presenter.played, vec![Cue::ZoneOpen]);
    }
}
