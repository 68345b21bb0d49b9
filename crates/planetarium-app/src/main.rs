//! The `planetarium` binary.

use std::process::ExitCode;

use clap::Parser;
use planetarium_app::platform::PlatformDirs;
use planetarium_config::{CliArgs, Config};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = match PlatformDirs::resolve_and_create() {
        Ok(dirs) => Some(dirs),
        Err(e) => {
            eprintln!("Failed to initialize platform directories: {e}");
            None
        }
    };
    let config_dir = args
        .config
        .clone()
        .or_else(|| dirs.as_ref().map(|d| d.config_dir.clone()));

    let (mut config, load_error) = match config_dir.as_deref().map(Config::load_or_create) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (Config::default(), Some(e.to_string())),
        None => (Config::default(), None),
    };
    config.apply_cli_overrides(&args);

    planetarium_log::init_logging(
        dirs.as_ref().map(|d| d.log_dir.as_path()),
        cfg!(debug_assertions),
        Some(&config),
    );
    if let Some(e) = load_error {
        warn!("Falling back to default config: {e}");
    }
    if let Some(dir) = &config_dir {
        info!("Config directory: {}", dir.display());
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    match planetarium_app::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Event loop failed: {e}");
            ExitCode::FAILURE
        }
    }
}
