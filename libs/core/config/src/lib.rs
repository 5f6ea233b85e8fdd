pub mod layered;
pub mod server;
pub mod tracing;

use std::env;
use thiserror::Error;

pub use layered::LayeredSources;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Application environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development, // Local dev, pretty logs
    Production,  // Supervised container, JSON logs
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable into `T`, falling back to `default` when unset.
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
                key: key.to_string(),
                details: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

/// Interpret common truthy/falsy spellings (`1`, `true`, `yes`, `on` and their opposites).
pub fn env_flag(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::ParseError {
                key: key.to_string(),
                details: format!("'{}' is not a boolean", other),
            }),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });

        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("GW_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("GW_TEST_VAR", "default"), "value");
        });
        temp_env::with_var_unset("GW_TEST_VAR", || {
            assert_eq!(env_or_default("GW_TEST_VAR", "default"), "default");
        });
    }

    #[test]
    fn test_env_parse_or() {
        temp_env::with_var("GW_TIMEOUT", Some(" 7 "), || {
            assert_eq!(env_parse_or("GW_TIMEOUT", 5u64).unwrap(), 7);
        });
        temp_env::with_var_unset("GW_TIMEOUT", || {
            assert_eq!(env_parse_or("GW_TIMEOUT", 5u64).unwrap(), 5);
        });
        temp_env::with_var("GW_TIMEOUT", Some("soon"), || {
            let err = env_parse_or("GW_TIMEOUT", 5u64).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { .. }));
        });
    }

    #[test]
    fn test_env_flag() {
        temp_env::with_var("GW_FLAG", Some("No"), || {
            assert!(!env_flag("GW_FLAG", true).unwrap());
        });
        temp_env::with_var("GW_FLAG", Some("on"), || {
            assert!(env_flag("GW_FLAG", false).unwrap());
        });
        temp_env::with_var("GW_FLAG", Some("maybe"), || {
            assert!(env_flag("GW_FLAG", false).is_err());
        });
        temp_env::with_var_unset("GW_FLAG", || {
            assert!(env_flag("GW_FLAG", true).unwrap());
        });
    }
}
