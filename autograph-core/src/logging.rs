//! Log subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::{AutographConfig, ConfigError, ConfigSection};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// `autograph.log.*` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl ConfigSection for LogConfig {
    fn prefix() -> &'static str {
        "autograph.log"
    }

    fn from_config(config: &AutographConfig) -> Result<Self, ConfigError> {
        let filter = config.get_or("autograph.log.filter", "info".to_string())?;
        let format = match config
            .get_or("autograph.log.format", "pretty".to_string())?
            .to_lowercase()
            .as_str()
        {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    key: "autograph.log.format".into(),
                    message: format!("expected `pretty` or `json`, got `{other}`"),
                })
            }
        };
        Ok(Self { filter, format })
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.filter`. Call once, early in `main`; a second
/// call returns an error instead of panicking.
pub fn init_tracing(
    config: &LogConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    }
}
