mod engine;
mod loader;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use engine::EngineConfig;
pub use value::{ConfigValue, FromConfigValue};

/// Environment variables with this prefix are overlaid onto the loaded
/// values (`AUTOGRAPH_QUERY_LIMIT` → `autograph.query.limit`).
const ENV_PREFIX: &str = "AUTOGRAPH_";

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// A value was readable but not acceptable.
    Invalid { key: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A typed view over a prefix of the configuration.
pub trait ConfigSection: Sized {
    /// Key prefix, e.g. `"autograph.log"`.
    fn prefix() -> &'static str;

    fn from_config(config: &AutographConfig) -> Result<Self, ConfigError>;
}

/// Engine configuration loaded from YAML files, `.env` files and
/// environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `autograph.yaml`
/// 2. `autograph-{profile}.yaml`
/// 3. `.env` then `.env.{profile}` (never overwrite variables already set)
/// 4. `AUTOGRAPH_*` environment variables
///
/// The profile is `AUTOGRAPH_PROFILE` if set, else the argument.
#[derive(Debug, Clone)]
pub struct AutographConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl AutographConfig {
    /// Load configuration files from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load configuration files from `dir`.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var("AUTOGRAPH_PROFILE").unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();
        loader::load_yaml_file(&dir.join("autograph.yaml"), &mut values)?;
        loader::load_yaml_file(&dir.join(format!("autograph-{active_profile}.yaml")), &mut values)?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        for (env_key, env_val) in std::env::vars() {
            if env_key.starts_with(ENV_PREFIX) && env_key != "AUTOGRAPH_PROFILE" {
                let key = env_key.to_lowercase().replace('_', ".");
                values.insert(key, ConfigValue::String(env_val));
            }
        }

        tracing::debug!(profile = %active_profile, keys = values.len(), "configuration loaded");
        Ok(Self {
            values,
            profile: active_profile,
        })
    }

    /// Build a config from a YAML string (no files, no environment).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(Self {
            values,
            profile: profile.to_string(),
        })
    }

    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a typed value for a dot-separated key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Like [`get`](Self::get), but a missing key yields `default`.
    /// A present key of the wrong type is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.values.get(key) {
            Some(value) => V::from_config_value(value, key),
            None => Ok(default),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn section<C: ConfigSection>(&self) -> Result<C, ConfigError> {
        tracing::debug!(prefix = C::prefix(), "Reading config section");
        C::from_config(self)
    }

    /// Whether any key lives under the prefix of `C`.
    pub fn has_section<C: ConfigSection>(&self) -> bool {
        let prefix = C::prefix();
        self.values.keys().any(|key| {
            key.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
        })
    }
}
