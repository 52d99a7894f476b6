//! Logger configuration.

use serde::{Deserialize, Serialize};

/// Output encoding for emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Human-readable, multi-line, ANSI-colored — local development.
    #[default]
    Pretty,
    /// Single-line key=value — CI and terminals without a fancy renderer.
    Compact,
    /// Newline-delimited JSON — production, shipped to a log aggregator.
    Json,
}

/// Logger configuration, built from defaults then overridden by environment
/// variables (`NEBULA_LOG` / `RUST_LOG` for the filter, `NEBULA_LOG_FORMAT`
/// for the encoding).
#[derive(Debug, Clone)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive string, e.g. `"info"` or
    /// `"nebula_engine=debug,info"`.
    pub level: String,
    pub format: Format,
    pub ansi: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { level: "info".to_string(), format: Format::default(), ansi: true }
    }
}

impl Config {
    /// Reads `NEBULA_LOG`/`RUST_LOG` and `NEBULA_LOG_FORMAT`, falling back to
    /// [`Config::default`] for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("NEBULA_LOG") {
            config.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            config.level = level;
        }

        if let Ok(format) = std::env::var("NEBULA_LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "json" => Format::Json,
                "compact" => Format::Compact,
                _ => Format::Pretty,
            };
        }

        config
    }

    /// Pretty, debug-level, colored — local development.
    #[must_use]
    pub fn development() -> Self {
        Self { level: "debug".to_string(), format: Format::Pretty, ansi: true }
    }

    /// JSON, info-level, no color codes — production.
    #[must_use]
    pub fn production() -> Self {
        Self { level: "info".to_string(), format: Format::Json, ansi: false }
    }
}
