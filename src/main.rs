//! Blightmire - headless scenario runner

use std::process::ExitCode;

use blightmire::behaviors::config::BehaviorSettings;
use blightmire::cli;
use blightmire::headless::{run_headless_scenario, HeadlessScenarioConfig};

fn main() -> ExitCode {
    let args = cli::parse_args();

    let mut config = match HeadlessScenarioConfig::load_from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().to_string());
    }
    if let Some(duration) = args.duration {
        config.duration_secs = duration;
    }

    let settings = BehaviorSettings::load_or_default(&args.settings);

    match run_headless_scenario(config, settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
