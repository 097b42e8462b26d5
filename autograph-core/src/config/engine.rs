use std::time::Duration;

use super::{AutographConfig, ConfigError, ConfigSection};

/// Runtime knobs of the resolver engine and the bundled adapters.
///
/// ```yaml
/// autograph:
///   mutation:
///     transactions: true   # acquire an adapter transaction per commit
///   query:
///     limit: 20            # page size for collection queries
///   cursor:
///     ttl: 300             # seconds a collection cursor stays valid
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub transactions: bool,
    pub page_size: usize,
    pub cursor_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transactions: true,
            page_size: 20,
            cursor_ttl: Duration::from_secs(300),
        }
    }
}

impl ConfigSection for EngineConfig {
    fn prefix() -> &'static str {
        "autograph"
    }

    fn from_config(config: &AutographConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let page_size = config.get_or("autograph.query.limit", defaults.page_size)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "autograph.query.limit".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(Self {
            transactions: config.get_or("autograph.mutation.transactions", defaults.transactions)?,
            page_size,
            cursor_ttl: Duration::from_secs(
                config.get_or("autograph.cursor.ttl", defaults.cursor_ttl.as_secs())?,
            ),
        })
    }
}
