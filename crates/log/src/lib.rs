//! Tracing setup for the Nebula workflow engine.
//!
//! One entry point, [`init`]/[`init_with`], builds a global
//! `tracing_subscriber` registry from a [`Config`]: an `EnvFilter` layer plus
//! one of three formatting layers (pretty/compact/json). Every other crate in
//! the workspace logs through the plain `tracing::{info,warn,error,debug}!`
//! macros — this crate owns only the subscriber wiring.

mod config;
mod format;

pub use config::{Config, Format};

use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors initializing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("invalid filter directive {directive:?}: {source}")]
    Filter { directive: String, source: tracing_subscriber::filter::ParseError },
    #[error("a global subscriber is already set")]
    AlreadyInitialized,
}

/// RAII guard returned by [`init`]. Dropping it does nothing today — it
/// exists so callers (e.g. `apps/cli`) have a binding to keep alive for the
/// process lifetime without caring whether a future revision adds a
/// non-blocking file writer that needs a flush-on-drop guard.
#[derive(Debug)]
#[must_use = "dropping the guard immediately is usually a bug — bind it to `_guard` at least"]
pub struct LogGuard(());

/// Initializes global tracing with [`Config::from_env`].
///
/// # Errors
/// Returns [`LogError::Filter`] if `NEBULA_LOG`/`RUST_LOG` holds a directive
/// string `EnvFilter` can't parse, or [`LogError::AlreadyInitialized`] if a
/// global subscriber is already set (e.g. a second call in the same process,
/// or in a test binary that also sets one up).
pub fn init() -> Result<LogGuard, LogError> {
    init_with(Config::from_env())
}

/// Initializes global tracing from an explicit [`Config`].
///
/// # Errors
/// See [`init`].
pub fn init_with(config: Config) -> Result<LogGuard, LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|source| LogError::Filter { directive: config.level.clone(), source })?;

    let timer = format::make_timer(None);
    let registry = Registry::default().with(filter);

    let result = match config.format {
        Format::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_ansi(config.ansi)
                .with_timer(timer)
                .with_target(true);
            registry.with(layer).try_init()
        }
        Format::Compact => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(config.ansi)
                .with_timer(timer)
                .with_target(true);
            registry.with(layer).try_init()
        }
        Format::Json => {
            let layer = tracing_subscriber::fmt::layer().json().with_timer(timer).flatten_event(true);
            registry.with(layer).try_init()
        }
    };

    result.map_err(|_| LogError::AlreadyInitialized)?;
    Ok(LogGuard(()))
}
