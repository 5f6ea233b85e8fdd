//! Layered configuration resolution.
//!
//! Sources are applied lowest to highest precedence:
//!
//! 1. compiled defaults (the `defaults` value passed to [`LayeredSources::resolve`])
//! 2. an optional configuration file (YAML, JSON or TOML, chosen by extension)
//! 3. environment variables, `PREFIX__SECTION__KEY=value`
//! 4. explicit overrides, normally collected from command-line flags
//!
//! The result is deserialized once into an owned value. Callers keep it behind an
//! `Arc` and never re-resolve it while serving requests.

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::ConfigError;

#[derive(Debug, Clone)]
pub struct LayeredSources {
    env_prefix: String,
    file: Option<PathBuf>,
    list_keys: Vec<String>,
    overrides: Vec<(String, String)>,
}

impl LayeredSources {
    pub fn new(env_prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
            file: None,
            list_keys: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Configuration file to layer over the defaults. A path that was given but
    /// does not exist is an error.
    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    /// Dotted key whose environment value is a comma separated list.
    pub fn with_list_key(mut self, key: impl Into<String>) -> Self {
        self.list_keys.push(key.into());
        self
    }

    /// Highest-precedence value for a dotted key. `None` leaves lower layers untouched.
    pub fn with_override<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.overrides.push((key.into(), value.to_string()));
        }
        self
    }

    pub fn resolve<T>(self, defaults: &T) -> Result<T, ConfigError>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut builder = Config::builder().add_source(Config::try_from(defaults)?);

        if let Some(path) = &self.file {
            debug!(path = %path.display(), "Layering configuration file");
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let mut env = Environment::with_prefix(&self.env_prefix)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        if !self.list_keys.is_empty() {
            env = env.list_separator(",");
            for key in &self.list_keys {
                env = env.with_list_parse_key(key);
            }
        }
        builder = builder.add_source(env);

        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
