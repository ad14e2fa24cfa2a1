//! Support Heal Cycle
//!
//! Periodic area heal used by support enemies. Every `interval` seconds the
//! healer looks for injured allies around it, ranks them and heals up to
//! `max_targets` of them.
//!
//! ## Cycle
//! 1. Query allies in `search_radius`
//! 2. Keep candidates that are not the healer, heal-eligible, not dying and
//!    below max health
//! 3. Optionally stable-sort by health fraction, lowest first
//! 4. Heal the first `max_targets`, optionally buff their defense, and put a
//!    glow on each that releases itself after `glow_duration`
//! 5. Play the heal chime once if anyone was healed
//!
//! ## Scheduling
//! The next deadline is recomputed whenever a cycle runs or the healer is
//! switched back on, so re-activation never fires immediately and never
//! catches up on cycles missed while inactive. `reconfigure` leaves the
//! deadline alone.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::constants::*;
use super::tags::{Tag, TagFilter};
use super::world::{Cue, Presentation, TransientKind, TransientSpawner, Vitality, Vitals};

/// How cycles are triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CycleMode {
    /// Cycle every `interval` seconds while active
    #[default]
    Continuous,
    /// Only cycle when `run_once` is called
    Manual,
}

/// Defense buff applied alongside each heal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenseBuffSpec {
    pub amount: f32,
    pub duration: f32,
}

fn default_true() -> bool {
    true
}

fn default_glow_duration() -> f32 {
    HEAL_GLOW_DURATION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealCycleConfig {
    pub heal_amount: f32,
    pub interval: f32,
    pub search_radius: f32,
    pub max_targets: usize,
    #[serde(default = "default_true")]
    pub prioritize_lowest_health: bool,
    #[serde(default)]
    pub defense_buff: Option<DefenseBuffSpec>,
    pub ally_filter: TagFilter,
    #[serde(default)]
    pub mode: CycleMode,
    #[serde(default = "default_true")]
    pub start_active: bool,
    /// Seconds after creation during which the healer stays dormant
    #[serde(default)]
    pub start_delay: Option<f32>,
    #[serde(default = "default_glow_duration")]
    pub glow_duration: f32,
}

impl Default for HealCycleConfig {
    fn default() -> Self {
        Self {
            heal_amount: SUPPORT_HEAL_AMOUNT,
            interval: SUPPORT_HEAL_INTERVAL,
            search_radius: SUPPORT_SEARCH_RADIUS,
            max_targets: SUPPORT_MAX_TARGETS,
            prioritize_lowest_health: true,
            defense_buff: Some(DefenseBuffSpec {
                amount: SUPPORT_DEFENSE_BUFF_AMOUNT,
                duration: SUPPORT_DEFENSE_BUFF_DURATION,
            }),
            ally_filter: TagFilter::any_of([Tag::Enemy, Tag::Boss]),
            mode: CycleMode::Continuous,
            start_active: true,
            start_delay: Some(SUPPORT_START_DELAY),
            glow_duration: HEAL_GLOW_DURATION,
        }
    }
}

impl HealCycleConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.interval > 0.0) {
            return Err(format!("interval must be positive, got {}", self.interval));
        }
        if self.heal_amount < 0.0 {
            return Err(format!("heal_amount must not be negative, got {}", self.heal_amount));
        }
        if self.search_radius < 0.0 {
            return Err(format!("search_radius must not be negative, got {}", self.search_radius));
        }
        if self.max_targets == 0 {
            return Err("max_targets must be at least 1".to_string());
        }
        if self.glow_duration < 0.0 {
            return Err(format!("glow_duration must not be negative, got {}", self.glow_duration));
        }
        if let Some(delay) = self.start_delay {
            if delay < 0.0 {
                return Err(format!("start_delay must not be negative, got {}", delay));
            }
        }
        if let Some(buff) = self.defense_buff {
            if buff.duration <= 0.0 {
                return Err(format!("defense_buff duration must be positive, got {}", buff.duration));
            }
        }
        Ok(())
    }
}

/// A heal-target candidate looked up for the current cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<H> {
    pub target: H,
    pub vitals: Vitals,
}

impl<H> Candidate<H> {
    pub fn health_fraction(&self) -> f32 {
        self.vitals.health_fraction()
    }

    fn is_eligible(&self) -> bool {
        self.vitals.heal_eligible && !self.vitals.dying && self.vitals.is_injured()
    }
}

/// Pick the targets for one heal cycle.
///
/// Filters out `owner` and anyone not eligible, optionally orders by health
/// fraction (stable, so ties keep query order), and keeps at most `max_targets`.
pub fn select_heal_targets<H: Copy + Eq>(
    candidates: Vec<Candidate<H>>,
    owner: H,
    max_targets: usize,
    prioritize_lowest_health: bool,
) -> Vec<Candidate<H>> {
    let mut eligible: Vec<Candidate<H>> = candidates
        .into_iter()
        .filter(|c| c.target != owner && c.is_eligible())
        .collect();

    if prioritize_lowest_health {
        eligible.sort_by(|a, b| {
            a.health_fraction()
                .partial_cmp(&b.health_fraction())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    eligible.truncate(max_targets);
    eligible
}

/// What a cycle did
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport<H> {
    /// Healed targets, in application order
    pub healed: Vec<H>,
    /// Eligible candidates found before truncation to `max_targets`
    pub eligible: usize,
}

#[derive(Debug, Clone, Copy)]
struct Glow<T> {
    handle: T,
    expires_at: f32,
}

/// Heal scheduling state for one support unit.
///
/// `T` is the host's handle for transient visuals.
#[derive(Debug, Clone)]
pub struct HealCycle<T> {
    config: HealCycleConfig,
    active: bool,
    next_deadline: f32,
    dormant_until: Option<f32>,
    glows: Vec<Glow<T>>,
}

impl<T: Copy + Eq> HealCycle<T> {
    pub fn new(config: HealCycleConfig, now: f32) -> Self {
        let dormant_until = config
            .start_delay
            .filter(|delay| *delay > 0.0)
            .map(|delay| now + delay);

        Self {
            active: config.start_active,
            next_deadline: now + config.interval,
            dormant_until,
            glows: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &HealCycleConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while the start delay is still suppressing cycles
    pub fn is_dormant(&self) -> bool {
        self.dormant_until.is_some()
    }

    pub fn next_deadline(&self) -> f32 {
        self.next_deadline
    }

    /// Glows spawned by this healer that haven't been released yet
    pub fn outstanding_glows(&self) -> usize {
        self.glows.len()
    }

    /// Switch the healer on or off. Switching on schedules the next cycle one
    /// full interval from `now`.
    pub fn set_active(&mut self, active: bool, now: f32) {
        if active && !self.active {
            self.next_deadline = now + self.config.interval;
        }
        self.active = active;
    }

    /// Hot-swap heal parameters. The pending deadline is kept.
    ///
    /// A non-positive interval is rejected and the current one kept; negative
    /// amounts and radii are floored at zero.
    pub fn reconfigure(&mut self, heal_amount: f32, interval: f32, search_radius: f32) {
        if interval > 0.0 {
            self.config.interval = interval;
        } else {
            warn!(
                "Rejected heal interval {}, keeping {}",
                interval, self.config.interval
            );
        }
        if heal_amount < 0.0 || search_radius < 0.0 {
            warn!(
                "Negative heal parameters (amount {}, radius {}) floored at zero",
                heal_amount, search_radius
            );
        }
        self.config.heal_amount = heal_amount.max(0.0);
        self.config.search_radius = search_radius.max(0.0);
    }

    /// Per-frame update. Returns a report when a cycle ran.
    pub fn advance<W, P>(
        &mut self,
        now: f32,
        owner: W::Handle,
        center: Vec2,
        world: &mut W,
        presenter: &mut P,
    ) -> Option<CycleReport<W::Handle>>
    where
        W: Vitality,
        P: Presentation + TransientSpawner<Handle = T>,
    {
        self.release_expired_glows(now, presenter);

        if !self.active {
            return None;
        }

        if let Some(until) = self.dormant_until {
            if now < until {
                return None;
            }
            self.dormant_until = None;
            self.next_deadline = now + self.config.interval;
            return None;
        }

        if self.config.mode != CycleMode::Continuous || now < self.next_deadline {
            return None;
        }

        Some(self.run_cycle(now, owner, center, world, presenter))
    }

    /// Run a cycle right now, bypassing the deadline. Does nothing while inactive.
    pub fn run_once<W, P>(
        &mut self,
        now: f32,
        owner: W::Handle,
        center: Vec2,
        world: &mut W,
        presenter: &mut P,
    ) -> Option<CycleReport<W::Handle>>
    where
        W: Vitality,
        P: Presentation + TransientSpawner<Handle = T>,
    {
        if !self.active {
            return None;
        }
        Some(self.run_cycle(now, owner, center, world, presenter))
    }

    /// Force-release every outstanding glow. Call when the healer is destroyed.
    pub fn teardown<P: TransientSpawner<Handle = T>>(&mut self, presenter: &mut P) -> usize {
        let released = self.glows.len();
        for glow in self.glows.drain(..) {
            presenter.release_transient(glow.handle);
        }
        released
    }

    fn release_expired_glows<P: TransientSpawner<Handle = T>>(&mut self, now: f32, presenter: &mut P) {
        self.glows.retain(|glow| {
            if now >= glow.expires_at {
                presenter.release_transient(glow.handle);
                false
            } else {
                true
            }
        });
    }

    fn run_cycle<W, P>(
        &mut self,
        now: f32,
        owner: W::Handle,
        center: Vec2,
        world: &mut W,
        presenter: &mut P,
    ) -> CycleReport<W::Handle>
    where
        W: Vitality,
        P: Presentation + TransientSpawner<Handle = T>,
    {
        self.next_deadline = now + self.config.interval;

        let candidates: Vec<Candidate<W::Handle>> = world
            .query_in_radius(center, self.config.search_radius, &self.config.ally_filter)
            .into_iter()
            .filter_map(|target| world.vitals(target).map(|vitals| Candidate { target, vitals }))
            .collect();

        let eligible = candidates
            .iter()
            .filter(|c| c.target != owner && c.is_eligible())
            .count();

        let selected = select_heal_targets(
            candidates,
            owner,
            self.config.max_targets,
            self.config.prioritize_lowest_health,
        );

        let mut healed = Vec::with_capacity(selected.len());
        for candidate in selected {
            world.receive_heal(candidate.target, self.config.heal_amount);

            if let Some(buff) = self.config.defense_buff {
                world.apply_defense_buff(candidate.target, buff.amount, buff.duration);
            }

            let at = world.position(candidate.target).unwrap_or(center);
            let handle = presenter.spawn_transient(TransientKind::HealGlow, at);
            self.glows.push(Glow {
                handle,
                expires_at: now + self.config.glow_duration,
            });

            healed.push(candidate.target);
        }

        if !healed.is_empty() {
            presenter.play(Cue::HealChime, center);
        }

        CycleReport { healed, eligible }
    }
}
