//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem at `level` (error, warn, info, debug, trace).
///
/// Log output goes to stderr; stdout is reserved for label records.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(level));

    if json_format {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` config section.
///
/// `RUST_LOG` still takes precedence over the configured level.
pub fn init_from_config(
    config: &iconsight_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = if verbose_override {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

/// Filter for a configured level; unknown levels fall back to info.
fn filter_for(level: &str) -> EnvFilter {
    match level {
        "error" | "warn" | "info" | "debug" | "trace" => EnvFilter::new(level),
        _ => EnvFilter::new("info"),
    }
}
