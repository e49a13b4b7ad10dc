//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g.
/// `COURSEBOT_LOG=coursebot::classify=debug,info`.
pub const LOG_ENV: &str = "COURSEBOT_LOG";

/// Installs the global subscriber writing to stderr, so stdout stays clean
/// for command output. Falls back to `info` when `COURSEBOT_LOG` is unset
/// or invalid. Safe to call more than once.
pub fn init_tracing(json: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(filter);
        if json {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}
