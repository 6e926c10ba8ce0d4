//! Tracing/logging initialization.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "text" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info,buildpro_auth=debug`.
    pub filter: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: "info".to_string(),
        }
    }
}

impl TracingConfig {
    /// `BUILDPRO_LOG_FORMAT` (`json` | `pretty`) and `BUILDPRO_LOG_FILTER`,
    /// falling back to `RUST_LOG`, then to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let format = lookup("BUILDPRO_LOG_FORMAT")
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or(defaults.format);
        let filter = lookup("BUILDPRO_LOG_FILTER")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.filter);
        Self { format, filter }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_with(config: &TracingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(false);

    let _ = match config.format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

/// Human-readable output captured by the test harness, `debug` by default.
pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(TracingConfig::from_lookup(lookup(&[])), TracingConfig::default());
    }

    #[test]
    fn explicit_settings_win_over_rust_log() {
        let config = TracingConfig::from_lookup(lookup(&[
            ("BUILDPRO_LOG_FORMAT", "Pretty"),
            ("BUILDPRO_LOG_FILTER", "buildpro_auth=debug"),
            ("RUST_LOG", "warn"),
        ]));
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter, "buildpro_auth=debug");
    }

    #[test]
    fn rust_log_is_the_fallback_filter() {
        let config = TracingConfig::from_lookup(lookup(&[("RUST_LOG", "trace")]));
        assert_eq!(config.filter, "trace");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn unknown_format_falls_back_to_json() {
        let config = TracingConfig::from_lookup(lookup(&[("BUILDPRO_LOG_FORMAT", "xml")]));
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn init_is_idempotent() {
        init_for_tests();
        init_with(&TracingConfig::default());
        crate::init();
    }
}
