//! Structured logging and tracing for Tessera.
//!
//! Library crates emit `tracing` events and spans (a `collect` span per
//! exploration, a `lod_batch` span per generated level). This crate installs
//! the subscriber: human-readable console output, an optional JSON log file
//! for post-mortem analysis, and filtering from `RUST_LOG` or the config's
//! `log_level`.

use std::fs::File;
use std::path::Path;

use tessera_config::Config;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config sets one.
const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file inside the log directory.
pub const LOG_FILE_NAME: &str = "tessera.log";

/// Initialize the global tracing subscriber.
///
/// Sets up:
/// - Console output with uptime timestamps, targets and levels
/// - JSON file logging into `log_dir` when `to_file` is set
/// - Environment-based filtering (`RUST_LOG` wins over the config)
///
/// File logging is skipped silently if the directory or file cannot be
/// created.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use tessera_config::Config;
/// use tessera_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, to_file: bool, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if to_file
        && let Some(log_dir) = log_dir
        && let Some(log_file) = open_log_file(log_dir)
    {
        subscriber.with(json_layer(log_file)).init();
        return;
    }

    subscriber.init();
}

/// Create an `EnvFilter` with the default filter string.
#[must_use]
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// Filter directives taken from the config's `log_level`, or the default.
#[must_use]
pub fn filter_directives(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.trim().to_string()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create `log_dir` and a fresh log file inside it.
fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

/// One JSON object per event, without ANSI escapes.
fn json_layer<S>(file: File) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::uptime())
        .json()
}
