//! Configuration loading and typed config structures.
//!
//! The configuration lives in `alertstate-config.yaml`. Every field has a
//! default, so an empty file (or no file) is a valid configuration.
//!
//! ```yaml
//! external_url: https://alerts.example.com
//! metrics_interval_ms: 15000
//! observer:
//!   host: 0.0.0.0
//!   port: 8080
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Environment variable overriding [`CacheConfig::external_url`].
pub const EXTERNAL_URL_ENV: &str = "ALERTSTATE_EXTERNAL_URL";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Base URL exposed to label and annotation templates.
    #[serde(default)]
    pub external_url: Option<String>,

    /// Milliseconds between metrics snapshots.
    #[serde(default = "default_metrics_interval_ms")]
    pub metrics_interval_ms: u64,

    /// HTTP surface settings.
    #[serde(default)]
    pub observer: ObserverConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            external_url: None,
            metrics_interval_ms: default_metrics_interval_ms(),
            observer: ObserverConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `ALERTSTATE_EXTERNAL_URL` overrides `external_url` when set.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying env overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        if let Ok(url) = std::env::var(EXTERNAL_URL_ENV) {
            config.external_url = Some(url);
        }
        config.validate()?;
        Ok(config)
    }

    fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml maps an empty document to unit, not to an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Reject values that would break the host process.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "metrics_interval_ms",
                reason: "must be greater than zero".to_owned(),
            });
        }
        if let Some(url) = &self.external_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid {
                field: "external_url",
                reason: format!("{url:?} is not an http(s) URL"),
            });
        }
        Ok(())
    }

    /// Interval between metrics snapshots.
    pub const fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }

    /// `external_url` without a trailing slash, as exposed to templates.
    pub fn template_base_url(&self) -> Option<String> {
        self.external_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_owned())
    }
}

/// Observer HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

const fn default_metrics_interval_ms() -> u64 {
    15_000
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = CacheConfig::parse_without_env("").ok();
        assert_eq!(config, Some(CacheConfig::default()));
        let config = config.unwrap_or_default();
        assert_eq!(config.metrics_interval(), Duration::from_secs(15));
        assert_eq!(config.observer.port, 8080);
        assert_eq!(config.observer.host, "0.0.0.0");
    }

    #[test]
    fn full_document_parses() {
        let yaml = "external_url: https://alerts.example.com/\nmetrics_interval_ms: 5000\nobserver:\n  host: 127.0.0.1\n  port: 9090\n";
        let config = CacheConfig::parse_without_env(yaml).unwrap_or_default();
        assert_eq!(config.metrics_interval_ms, 5000);
        assert_eq!(config.observer.host, "127.0.0.1");
        assert_eq!(config.observer.port, 9090);
        assert_eq!(
            config.template_base_url().as_deref(),
            Some("https://alerts.example.com")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = CacheConfig {
            metrics_interval_ms: 0,
            ..CacheConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "metrics_interval_ms", .. })
        ));
    }

    #[test]
    fn non_http_url_is_rejected() {
        let config = CacheConfig {
            external_url: Some("ftp://example.com".to_owned()),
            ..CacheConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "external_url", .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = CacheConfig::parse_without_env("observer: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
