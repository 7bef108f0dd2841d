//! Logging integration for quartz.
//!
//! Provides a helper for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings).

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` (e.g. "debug", "info",
/// "warn", "error"). In debug mode a pretty, human-readable format is used;
/// otherwise a structured JSON format is used. Calling this twice is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let level = if settings.log_level.is_empty() {
        "info"
    } else {
        settings.log_level.as_str()
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}
