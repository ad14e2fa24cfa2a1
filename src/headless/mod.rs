//! Headless mode for scenario testing
//!
//! Runs behavior scenarios without any graphical output, suitable for
//! automated testing and balance checks.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --scenario assets/scenarios/swamp_ambush.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "name": "swamp ambush",
//!   "units": [
//!     { "archetype": "Player", "position": [0.0, 0.0] },
//!     { "archetype": "Bloater", "position": [1.5, 0.0] }
//!   ],
//!   "kills": [ { "at_secs": 2.0, "unit": 1 } ],
//!   "duration_secs": 12
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{HeadlessScenarioConfig, ScriptedAction, ScriptedKill, UnitSpawnConfig};
pub use runner::{run_headless_scenario, ScenarioResult, ScenarioRunner, UnitResult};
