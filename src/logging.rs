// src/logging.rs

//! Logging setup for `assetdag` using `tracing` + `tracing-subscriber`.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` CLI flag, applied to every target
//! 2. `ASSETDAG_LOG`, read as a full `EnvFilter` directive string
//!    (e.g. `debug` or `assetdag=debug,tower_http=trace`)
//! 3. `info`
//!
//! Dependency crates that chatter at debug level are capped at `warn` unless
//! the directive string names them. Logs go to STDERR; linter reports and
//! the dry-run plan use stdout.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "ASSETDAG_LOG";

const QUIET_DEPENDENCIES: &[&str] = &["hyper", "hyper_util", "notify", "globset", "mio"];

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directives = filter_directives(cli_level, env.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter `{directives}`"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// The `EnvFilter` directive string for a CLI level and the raw value of
/// [`LOG_ENV`].
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    let base = match (cli_level, env.map(str::trim)) {
        (Some(level), _) => level.as_directive().to_string(),
        (None, Some(raw)) if !raw.is_empty() => raw.to_string(),
        _ => LogLevel::Info.as_directive().to_string(),
    };

    let mut directives = vec![base.clone()];
    for dep in QUIET_DEPENDENCIES {
        let named = base
            .split(',')
            .any(|d| d.split(['=', '[']).next().map(str::trim) == Some(*dep));
        if !named {
            directives.push(format!("{dep}=warn"));
        }
    }
    directives.join(",")
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
