//! Logging initialization for the githost binaries.
//!
//! Both utilities are invoked by sshd, so everything goes to stderr,
//! where sshd folds it into its own log stream (the role syslog played
//! in older deployments). Filtering comes from `GITHOST_LOG`, with a
//! per-binary default.

use std::env;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "GITHOST_LOG";

/// Declarative logging setup, consumed once by [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    filter: String,
}

impl LogConfig {
    /// Filter from `GITHOST_LOG`, falling back to `default_level`.
    pub fn from_env(default_level: &str) -> Self {
        Self {
            filter: env::var(LOG_ENV).unwrap_or_else(|_| default_level.to_string()),
        }
    }

    /// Replace the level, e.g. for `--verbose`.
    pub fn with_level(mut self, level: &str) -> Self {
        self.filter = level.to_string();
        self
    }
}

/// Install the global stderr subscriber.
///
/// Safe to call more than once; later calls are no-ops (tests share one
/// process).
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
