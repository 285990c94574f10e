//! Cache configuration

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::system_type::Visibility;

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_arg(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Metadata cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Describe private members too. By default only public and
    /// crate-visible members are enumerated.
    pub include_private: bool,

    /// Initial capacity of the descriptor table
    pub initial_capacity: usize,

    /// How long a build waits for a nested type that another thread is
    /// building before it gives up
    pub nested_build_wait: Duration,

    /// Log output format (used by the inspection binary)
    pub log_format: LogFormat,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            include_private: false,
            initial_capacity: 256,
            nested_build_wait: Duration::from_secs(5),
            log_format: LogFormat::Pretty,
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let include_private = env::var("TYPESHAPE_INCLUDE_PRIVATE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(defaults.include_private);

        let initial_capacity = match env::var("TYPESHAPE_INITIAL_CAPACITY") {
            Ok(v) => v
                .parse()
                .context("Invalid TYPESHAPE_INITIAL_CAPACITY")?,
            Err(_) => defaults.initial_capacity,
        };

        let nested_build_wait = match env::var("TYPESHAPE_NESTED_WAIT_MS") {
            Ok(v) => Duration::from_millis(v.parse().context("Invalid TYPESHAPE_NESTED_WAIT_MS")?),
            Err(_) => defaults.nested_build_wait,
        };

        let log_format = match env::var("TYPESHAPE_LOG_FORMAT") {
            Ok(v) => LogFormat::from_arg(&v)
                .with_context(|| format!("Invalid TYPESHAPE_LOG_FORMAT: {}", v))?,
            Err(_) => defaults.log_format,
        };

        Ok(Self {
            include_private,
            initial_capacity,
            nested_build_wait,
            log_format,
        })
    }

    /// Lowest visibility a member needs to be described
    pub fn min_visibility(&self) -> Visibility {
        if self.include_private {
            Visibility::Private
        } else {
            Visibility::Crate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_exclude_private_members() {
        let config = CacheConfig::default();
        assert_eq!(config.min_visibility(), Visibility::Crate);
        assert!(Visibility::Public >= config.min_visibility());
        assert!(Visibility::Private < config.min_visibility());
    }

    #[test]
    fn test_include_private() {
        let config = CacheConfig {
            include_private: true,
            ..Default::default()
        };
        assert_eq!(config.min_visibility(), Visibility::Private);
    }

    #[test]
    fn test_log_format_from_arg() {
        assert_eq!(LogFormat::from_arg("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_arg("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::from_arg("yaml"), None);
    }
}
