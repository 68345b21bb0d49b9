//! Structured logging for the planetarium viewer.
//!
//! Console output goes through `tracing-subscriber` with uptime timestamps and
//! module paths. Debug builds additionally write JSON lines to
//! `planetarium.log` for post-mortem analysis. `RUST_LOG` always wins over
//! the configured level.

use planetarium_config::Config;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Targets that are far too chatty at `info`.
const QUIET_TARGETS: &str = "wgpu=warn,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "planetarium.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `config` - supplies `debug.log_level` when `RUST_LOG` is unset
///
/// ```no_run
/// use planetarium_log::init_logging;
/// use planetarium_config::Config;
///
/// let config = Config::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let level = config.map(|c| c.debug.log_level.as_str()).unwrap_or("");
    let filter_str = filter_directives(level);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(path) = log_dir.map(log_file_path)
        && let Some(parent) = path.parent()
        && std::fs::create_dir_all(parent).is_ok()
        && let Ok(log_file) = std::fs::File::create(&path)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        tracing::info!(path = %path.display(), "writing JSON log file");
        return;
    }

    subscriber.init();
}

/// Build the filter directive string for a configured level.
///
/// A bare level (`"debug"`) gets the GPU stack quieted; anything containing
/// explicit directives is passed through untouched.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        format!("info,{QUIET_TARGETS}")
    } else if level.contains(',') || level.contains('=') {
        level.to_string()
    } else {
        format!("{level},{QUIET_TARGETS}")
    }
}

/// Path of the JSON log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}
