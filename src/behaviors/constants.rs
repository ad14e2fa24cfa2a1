//! Behavior Constants
//!
//! Defaults used when configuration or the host leaves a value unspecified.

// ============================================================================
// Zones
// ============================================================================

/// Despawn delay after a zone starts closing when the close clip can't be found.
pub const DEFAULT_CLOSE_DELAY: f32 = 0.5;

/// Slack for comparing accumulated frame time against tick and lifetime
/// boundaries. Summing f32 frame deltas drifts by a few microseconds.
pub const TIMER_EPSILON: f32 = 1e-4;

/// Poison pool defaults (a single pool is roughly one character-width wide).
pub const POISON_POOL_DAMAGE_PER_TICK: f32 = 5.0;
pub const POISON_POOL_TICK_INTERVAL: f32 = 1.0;
pub const POISON_POOL_LIFETIME: f32 = 5.0;
pub const POISON_POOL_RADIUS: f32 = 3.0;

// ============================================================================
// Support Healing
// ============================================================================

pub const SUPPORT_HEAL_AMOUNT: f32 = 15.0;
pub const SUPPORT_HEAL_INTERVAL: f32 = 4.0;
pub const SUPPORT_SEARCH_RADIUS: f32 = 6.0;
pub const SUPPORT_MAX_TARGETS: usize = 3;

/// Delay after a support unit appears before its first heal deadline is armed.
pub const SUPPORT_START_DELAY: f32 = 1.0;

/// How long the heal glow stays on a healed unit.
pub const HEAL_GLOW_DURATION: f32 = 1.0;

pub const SUPPORT_DEFENSE_BUFF_AMOUNT: f32 = 2.0;
pub const SUPPORT_DEFENSE_BUFF_DURATION: f32 = 3.0;

// ============================================================================
// Deaths
// ============================================================================

/// How long a dead unit lingers before it is despawned.
pub const CORPSE_LINGER_SECS: f32 = 0.25;
