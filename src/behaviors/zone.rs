//! Timed Zone Effects
//!
//! A circular zone (poison pool, healing spring) that pulses its effect on
//! everything matching its filter every `tick_interval`, lives for `lifetime`
//! seconds, then closes.
//!
//! ## Tick timing
//!
//! Pulses land at `t, 2t, 3t, ...` of zone age, up to and including the
//! lifetime: a zone that has existed for `E` seconds has pulsed
//! `floor(min(E, lifetime) / t)` times. A large frame delta pulses several
//! times in one `advance` call so the count doesn't depend on frame rate.
//!
//! ## Closing
//!
//! Once closing starts, `advance` is a no-op. The caller receives the despawn
//! delay exactly once: the close clip's length, `DEFAULT_CLOSE_DELAY` if the
//! clip is unknown, or zero when no presentation is attached.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_CLOSE_DELAY, TIMER_EPSILON};
use super::tags::TagFilter;
use super::world::{Cue, Presentation, Vitality};

/// What a zone does to the targets it pulses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Damage,
    Heal,
}

/// Parameters fixed at spawn time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneParams {
    pub kind: ZoneKind,
    /// Damage or healing applied to each target per pulse
    pub per_tick: f32,
    pub tick_interval: f32,
    pub lifetime: f32,
    pub radius: f32,
    pub filter: TagFilter,
}

impl ZoneParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.tick_interval > 0.0) {
            return Err(format!("tick_interval must be positive, got {}", self.tick_interval));
        }
        if !(self.lifetime > 0.0) {
            return Err(format!("lifetime must be positive, got {}", self.lifetime));
        }
        if self.radius < 0.0 {
            return Err(format!("radius must not be negative, got {}", self.radius));
        }
        if self.per_tick < 0.0 {
            return Err(format!("per_tick must not be negative, got {}", self.per_tick));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZonePhase {
    Active,
    Closing,
}

/// Outcome of one `advance` call
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoneStep {
    /// Pulses fired this call
    pub pulses: u32,
    /// Target applications across all pulses
    pub hits: usize,
    /// Set on the call that started closing: seconds until the zone should be destroyed
    pub despawn_after: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct TimedZoneEffect {
    params: ZoneParams,
    center: Vec2,
    time_alive: f32,
    pulses: u32,
    phase: ZonePhase,
}

impl TimedZoneEffect {
    /// Create the zone and start its opening presentation.
    pub fn initialize(
        params: ZoneParams,
        center: Vec2,
        presentation: Option<&mut dyn Presentation>,
    ) -> Self {
        if let Some(presentation) = presentation {
            presentation.play(Cue::ZoneOpen, center);
        }

        Self {
            params,
            center,
            time_alive: 0.0,
            pulses: 0,
            phase: ZonePhase::Active,
        }
    }

    pub fn params(&self) -> &ZoneParams {
        &self.params
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn time_alive(&self) -> f32 {
        self.time_alive
    }

    /// Total pulses fired since spawn
    pub fn pulses(&self) -> u32 {
        self.pulses
    }

    pub fn phase(&self) -> ZonePhase {
        self.phase
    }

    pub fn is_closing(&self) -> bool {
        self.phase == ZonePhase::Closing
    }

    /// Advance the zone by one frame.
    pub fn advance<W: Vitality>(
        &mut self,
        dt: f32,
        world: &mut W,
        presentation: Option<&mut dyn Presentation>,
    ) -> ZoneStep {
        let mut step = ZoneStep::default();

        if self.is_closing() {
            return step;
        }

        if dt < 0.0 {
            debug!("Ignoring negative zone delta {}", dt);
        }
        self.time_alive += dt.max(0.0);

        // Pulses owed are derived from zone age alone
        let reached_end = self.time_alive + TIMER_EPSILON >= self.params.lifetime;
        if self.params.tick_interval > 0.0 {
            let counted = self.time_alive.min(self.params.lifetime) + TIMER_EPSILON;
            let due = (counted / self.params.tick_interval).floor() as u32;
            while self.pulses < due {
                step.hits += self.pulse(world);
                step.pulses += 1;
            }
        }

        if reached_end {
            step.despawn_after = self.begin_closing(presentation);
        }

        step
    }

    /// Enter the closing phase. Returns the despawn delay, or `None` if the
    /// zone was already closing.
    pub fn begin_closing(&mut self, presentation: Option<&mut dyn Presentation>) -> Option<f32> {
        if self.is_closing() {
            return None;
        }
        self.phase = ZonePhase::Closing;

        let Some(presentation) = presentation else {
            return Some(0.0);
        };

        presentation.play(Cue::ZoneClose, self.center);
        let delay = presentation
            .clip_duration(Cue::ZoneClose)
            .unwrap_or(DEFAULT_CLOSE_DELAY);

        debug!(
            "Zone at ({:.1}, {:.1}) closing after {} pulses, despawn in {:.2}s",
            self.center.x, self.center.y, self.pulses, delay
        );

        Some(delay)
    }

    /// Apply one pulse to every target in range. Returns the number of targets hit.
    fn pulse<W: Vitality>(&mut self, world: &mut W) -> usize {
        self.pulses += 1;

        let targets = world.query_in_radius(self.center, self.params.radius, &self.params.filter);
        for target in targets.iter().copied() {
            match self.params.kind {
                ZoneKind::Damage => world.take_damage(target, self.params.per_tick),
                ZoneKind::Heal => world.receive_heal(target, self.params.per_tick),
            }
        }

        targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::tags::Tag;
    use crate::behaviors::testing::{MockArena, MockPresenter, MockUnit};

    fn pool(tick_interval: f32, lifetime: f32) -> ZoneParams {
        ZoneParams {
            kind: ZoneKind::Damage,
            per_tick: 5.0,
            tick_interval,
            lifetime,
            radius: 3.0,
            filter: TagFilter::only(Tag::Player),
        }
    }

    fn arena_with_player_at(x: f32) -> MockArena {
        MockArena::with_units(vec![MockUnit::new(x, 0.0, Tag::Player, 100.0, 100.0)])
    }

    #[test]
    fn test_one_second_ticks_over_five_second_lifetime() {
        let mut arena = arena_with_player_at(1.0);
        let mut presenter = MockPresenter::default();
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 5.0), Vec2::ZERO, Some(&mut presenter));

        let mut closing_at = None;
        for second in 1..=5 {
            let step = zone.advance(1.0, &mut arena, Some(&mut presenter));
            assert_eq!(step.pulses, 1, "one pulse per second at t={}", second);
            if step.despawn_after.is_some() {
                closing_at = Some(second);
            }
        }

        // Inclusive boundary: the pulse at t == lifetime counts
        assert_eq!(zone.pulses(), 5);
        assert_eq!(arena.damage_taken.len(), 5);
        assert_eq!(arena.units[0].health, 75.0);
        assert_eq!(closing_at, Some(5));
        assert!(zone.is_closing());
    }

    #[test]
    fn test_sixty_fps_frames_still_pulse_at_lifetime() {
        let mut arena = arena_with_player_at(1.0);
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 5.0), Vec2::ZERO, None);
        let frame = std::time::Duration::from_secs_f32(1.0 / 60.0).as_secs_f32();

        let mut frames = 0;
        while !zone.is_closing() && frames < 400 {
            zone.advance(frame, &mut arena, None);
            frames += 1;
        }

        assert!(zone.is_closing());
        assert!((299..=301).contains(&frames), "closed after {} frames", frames);
        assert_eq!(zone.pulses(), 5);
        assert_eq!(arena.units[0].health, 75.0);
    }

    #[test]
    fn test_negative_delta_does_not_rewind() {
        let mut arena = arena_with_player_at(0.0);
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 5.0), Vec2::ZERO, None);

        zone.advance(0.5, &mut arena, None);
        zone.advance(-1.0, &mut arena, None);

        assert_eq!(zone.time_alive(), 0.5);
        assert_eq!(zone.pulses(), 0);
    }

    #[test]
    fn test_pulse_count_follows_floor_rule() {
        // 0.25s frames, 0.75s interval: floor(E / 0.75) pulses
        let mut arena = arena_with_player_at(0.0);
        let mut zone = TimedZoneEffect::initialize(pool(0.75, 10.0), Vec2::ZERO, None);

        for frame in 1..=16 {
            zone.advance(0.25, &mut arena, None);
            let elapsed = frame as f32 * 0.25;
            assert_eq!(zone.pulses(), (elapsed / 0.75).floor() as u32, "elapsed {}", elapsed);
        }
    }

    #[test]
    fn test_large_delta_catches_up_but_stops_at_lifetime() {
        let mut arena = arena_with_player_at(0.0);
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 5.0), Vec2::ZERO, None);

        let step = zone.advance(10.0, &mut arena, None);

        assert_eq!(step.pulses, 5);
        assert_eq!(zone.pulses(), 5);
        assert!(step.despawn_after.is_some());
    }

    #[test]
    fn test_no_pulses_after_closing() {
        let mut arena = arena_with_player_at(0.0);
        let mut presenter = MockPresenter::default();
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 2.0), Vec2::ZERO, Some(&mut presenter));

        zone.advance(2.0, &mut arena, Some(&mut presenter));
        assert_eq!(zone.pulses(), 2);

        for _ in 0..10 {
            let step = zone.advance(1.0, &mut arena, Some(&mut presenter));
            assert_eq!(step, ZoneStep::default());
        }
        assert_eq!(zone.pulses(), 2);
        assert_eq!(arena.damage_taken.len(), 2);
        // Closing is a no-op for the timers too
        assert_eq!(zone.time_alive(), 2.0);
    }

    #[test]
    fn test_closing_is_idempotent() {
        let mut presenter = MockPresenter::with_clip(Cue::ZoneClose, 0.8);
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 5.0), Vec2::ZERO, Some(&mut presenter));

        let first = zone.begin_closing(Some(&mut presenter));
        let second = zone.begin_closing(Some(&mut presenter));

        assert_eq!(first, Some(0.8));
        assert_eq!(second, None);
        assert_eq!(presenter.count(Cue::ZoneClose), 1);
    }

    #[test]
    fn test_close_delay_falls_back_to_default_on_clip_miss() {
        let mut arena = MockArena::default();
        let mut presenter = MockPresenter::default();
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 1.0), Vec2::ZERO, Some(&mut presenter));

        let step = zone.advance(1.0, &mut arena, Some(&mut presenter));

        assert_eq!(step.despawn_after, Some(DEFAULT_CLOSE_DELAY));
    }

    #[test]
    fn test_close_without_presentation_is_immediate() {
        let mut arena = MockArena::default();
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 1.0), Vec2::ZERO, None);

        let step = zone.advance(1.5, &mut arena, None);

        assert_eq!(step.despawn_after, Some(0.0));
    }

    #[test]
    fn test_initialize_plays_opening_cue() {
        let mut presenter = MockPresenter::default();
        let _zone = TimedZoneEffect::initialize(pool(1.0, 5.0), Vec2::ZERO, Some(&mut presenter));

        assert_eq!(presenter.played, vec![Cue::ZoneOpen]);
    }

    #[test]
    fn test_pulse_respects_radius_and_filter() {
        let mut arena = MockArena::with_units(vec![
            MockUnit::new(1.0, 0.0, Tag::Player, 100.0, 100.0),
            MockUnit::new(10.0, 0.0, Tag::Player, 100.0, 100.0),
            MockUnit::new(0.5, 0.0, Tag::Enemy, 100.0, 100.0),
        ]);
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 5.0), Vec2::ZERO, None);

        let step = zone.advance(1.0, &mut arena, None);

        assert_eq!(step.hits, 1);
        assert_eq!(arena.total_damage_to(0), 5.0);
        assert_eq!(arena.total_damage_to(1), 0.0);
        assert_eq!(arena.total_damage_to(2), 0.0);
    }

    #[test]
    fn test_empty_zone_pulses_silently() {
        let mut arena = MockArena::default();
        let mut zone = TimedZoneEffect::initialize(pool(1.0, 5.0), Vec2::ZERO, None);

        let step = zone.advance(1.0, &mut arena, None);

        assert_eq!(step.pulses, 1);
        assert_eq!(step.hits, 0);
    }

    #[test]
    fn test_heal_zone_heals_instead_of_damaging() {
        let mut arena = MockArena::with_units(vec![MockUnit::new(0.0, 0.0, Tag::Enemy, 50.0, 100.0)]);
        let params = ZoneParams {
            kind: ZoneKind::Heal,
            per_tick: 10.0,
            tick_interval: 1.0,
            lifetime: 3.0,
            radius: 2.0,
            filter: TagFilter::only(Tag::Enemy),
        };
        let mut zone = TimedZoneEffect::initialize(params, Vec2::ZERO, None);

        zone.advance(1.0, &mut arena, None);

        assert!(arena.damage_taken.is_empty());
        assert_eq!(arena.units[0].health, 60.0);
    }

    #[test]
    fn test_validate_rejects_non_positive_interval() {
        let mut params = pool(0.0, 5.0);
        assert!(params.validate().is_err());

        params.tick_interval = 1.0;
        params.lifetime = -1.0;
        assert!(params.validate().is_err());

        params.lifetime = 5.0;
        assert!(params.validate().is_ok());
    }
}
