//! Kit configuration.
//!
//! Two knobs: whether handler faults are logged (development builds) and
//! how long generated instance ids are.
//!
//! # Example
//!
//! ```ignore
//! use spark_kit::KitConfig;
//!
//! let config = KitConfig::from_env()?;
//! let config = KitConfig::from_json(r#"{ "development": false }"#)?;
//! ```

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable selecting `development` or `production`.
pub const ENV_VAR: &str = "SPARK_KIT_ENV";

/// Environment variable overriding the generated id length.
pub const ID_LENGTH_VAR: &str = "SPARK_KIT_ID_LENGTH";

/// Default generated id length.
pub const DEFAULT_ID_LENGTH: usize = 9;

/// Shortest id the registry will generate, whatever `id_length` says.
pub const MIN_ID_LENGTH: usize = 4;

/// Runtime configuration shared by the registry and orchestrators.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KitConfig {
    /// Log swallowed handler faults.
    pub development: bool,
    /// Length of ids produced by [`generate_id`](crate::util::generate_id).
    pub id_length: usize,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            development: cfg!(debug_assertions),
            id_length: DEFAULT_ID_LENGTH,
        }
    }
}

impl KitConfig {
    /// Development config (faults logged).
    pub fn development() -> Self {
        Self { development: true, ..Self::default() }
    }

    /// Production config (faults swallowed silently).
    pub fn production() -> Self {
        Self { development: false, ..Self::default() }
    }

    /// Build from `SPARK_KIT_ENV` / `SPARK_KIT_ID_LENGTH`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup(ENV_VAR) {
            config.development = match env.trim().to_ascii_lowercase().as_str() {
                "development" | "dev" => true,
                "production" | "prod" => false,
                _ => return Err(ConfigError::Environment(env)),
            };
        }

        if let Some(raw) = lookup(ID_LENGTH_VAR) {
            config.id_length = match raw.trim().parse::<usize>() {
                Ok(len) if len > 0 => len,
                _ => return Err(ConfigError::IdLength(raw)),
            };
        }

        Ok(config)
    }

    /// Parse a JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.id_length == 0 {
            return Err(ConfigError::IdLength(config.id_length.to_string()));
        }
        Ok(config)
    }

    /// Length used for generated ids: `id_length`, raised to
    /// [`MIN_ID_LENGTH`].
    pub fn effective_id_length(&self) -> usize {
        self.id_length.max(MIN_ID_LENGTH)
    }
}
