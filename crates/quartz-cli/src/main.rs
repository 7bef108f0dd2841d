//! The `quartz-admin` binary.
//!
//! Loads project settings (`quartz.toml` by default, overridable through
//! `QUARTZ_SETTINGS`), sets up logging, and dispatches to the selected
//! management command.

use std::process::ExitCode;

use quartz_cli::execute_from_command_line;
use quartz_core::{logging::setup_logging, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    let settings_path =
        std::env::var("QUARTZ_SETTINGS").unwrap_or_else(|_| "quartz.toml".to_string());
    let settings = match Settings::from_file(&settings_path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Cannot load settings from '{settings_path}': {err}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&settings);

    match execute_from_command_line(std::env::args(), &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
