mod accounting;
mod display;
mod observability;
mod server;

pub use accounting::*;
pub use display::*;
pub use observability::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub accounting: AccountingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Fill environment-derived defaults. Called exactly once at startup,
    /// after the TOML file has been parsed.
    pub fn apply_env(&mut self) -> crate::Result<()> {
        let mem_limit = std::env::var(MEM_LIMIT_ENV).ok();
        self.display.apply_env_default(mem_limit.as_deref())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Any issue with
    /// [`ConfigSeverity::Error`] must stop the server from starting.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error(
                "server.port",
                "port must be greater than 0",
            ));
        }

        if self.server.host.is_empty() {
            errors.push(ConfigError::error(
                "server.host",
                "host must not be empty",
            ));
        }

        if !self.server.base_url.starts_with('/') || !self.server.base_url.ends_with('/') {
            errors.push(ConfigError::error(
                "server.base_url",
                format!(
                    "base_url must start and end with '/' (got {:?})",
                    self.server.base_url
                ),
            ));
        }

        let threshold = self.display.mem_warning_threshold;
        if !threshold.is_finite() || !(0.0..1.0).contains(&threshold) {
            errors.push(ConfigError::error(
                "display.mem_warning_threshold",
                format!("must be within [0, 1) (got {threshold})"),
            ));
        }

        if self.accounting.stat_path.as_os_str().is_empty() {
            errors.push(ConfigError::error(
                "accounting.stat_path",
                "stat_path must not be empty",
            ));
        }

        if self.accounting.read_timeout_ms == 0 {
            errors.push(ConfigError::error(
                "accounting.read_timeout_ms",
                "read timeout must be greater than 0",
            ));
        } else if self.accounting.read_timeout_ms > 30_000 {
            errors.push(ConfigError::warning(
                "accounting.read_timeout_ms",
                "read timeout above 30s will hold requests open on a stuck mount",
            ));
        }

        let rate = self.observability.sample_rate;
        if !(0.0..=1.0).contains(&rate) {
            errors.push(ConfigError::error(
                "observability.sample_rate",
                format!("must be within [0, 1] (got {rate})"),
            ));
        }

        errors
    }

    /// True when [`validate`](Self::validate) reports at least one error.
    pub fn has_errors(issues: &[ConfigError]) -> bool {
        issues.iter().any(|e| e.severity == ConfigSeverity::Error)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(issues: &[ConfigError]) -> Vec<&str> {
        issues.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn default_config_is_valid() {
        let issues = Config::default().validate();
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn threshold_of_one_is_rejected() {
        let mut cfg = Config::default();
        cfg.display.mem_warning_threshold = 1.0;
        let issues = cfg.validate();
        assert!(Config::has_errors(&issues));
        assert_eq!(fields(&issues), vec!["display.mem_warning_threshold"]);
    }

    #[test]
    fn negative_and_nan_thresholds_are_rejected() {
        for bad in [-0.1, f64::NAN, f64::INFINITY] {
            let mut cfg = Config::default();
            cfg.display.mem_warning_threshold = bad;
            assert!(Config::has_errors(&cfg.validate()), "accepted {bad}");
        }
    }

    #[test]
    fn zero_threshold_is_valid() {
        let mut cfg = Config::default();
        cfg.display.mem_warning_threshold = 0.0;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn base_url_needs_slashes() {
        let mut cfg = Config::default();
        cfg.server.base_url = "/user/alice".into();
        assert_eq!(fields(&cfg.validate()), vec!["server.base_url"]);
    }

    #[test]
    fn zero_read_timeout_is_rejected() {
        let mut cfg = Config::default();
        cfg.accounting.read_timeout_ms = 0;
        assert!(Config::has_errors(&cfg.validate()));
    }

    #[test]
    fn long_read_timeout_is_only_a_warning() {
        let mut cfg = Config::default();
        cfg.accounting.read_timeout_ms = 60_000;
        let issues = cfg.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Warning);
        assert!(!Config::has_errors(&issues));
    }

    #[test]
    fn display_formats_severity_tag() {
        let issue = ConfigError::error("server.port", "port must be greater than 0");
        assert_eq!(issue.to_string(), "[ERROR] server.port: port must be greater than 0");
    }
}
