//! Command-line interface for the headless scenario runner

use clap::Parser;
use std::path::PathBuf;

use crate::behaviors::config::DEFAULT_SETTINGS_PATH;

/// Swamp enemy behavior simulator
#[derive(Parser, Debug)]
#[command(name = "blightmire")]
#[command(about = "Run swamp enemy behavior scenarios headlessly")]
#[command(version)]
pub struct Args {
    /// Scenario JSON file to run
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub scenario: PathBuf,

    /// Behavior tuning RON file
    #[arg(long, value_name = "SETTINGS_FILE", default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: PathBuf,

    /// Output path for the combat log (overrides the scenario's)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Simulated duration in seconds (overrides the scenario's)
    #[arg(long)]
    pub duration: Option<f32>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
