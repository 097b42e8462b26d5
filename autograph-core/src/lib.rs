//! # autograph-core
//!
//! Shared foundation of the Autograph resolver engine:
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`error`] | [`AutographError`], the taxonomy every resolver reports |
//! | [`types`] | [`Record`], [`Context`], [`ResolveInfo`], [`TransactionHandle`], [`BoxFuture`] |
//! | [`managed`] | [`ManagedResource`] acquire/release lifecycle |
//! | [`config`] | YAML + environment configuration ([`AutographConfig`], [`EngineConfig`]) |
//! | [`logging`] | `tracing` subscriber setup ([`init_tracing`]) |

pub mod config;
pub mod error;
pub mod logging;
pub mod managed;
pub mod types;

pub use config::{AutographConfig, ConfigError, ConfigSection, ConfigValue, EngineConfig, FromConfigValue};
pub use error::AutographError;
pub use logging::{init_tracing, LogConfig, LogFormat};
pub use managed::ManagedResource;
pub use types::{id_string, BoxFuture, Context, Operation, Record, ResolveInfo, TransactionHandle};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{AutographError, BoxFuture, Context, Operation, Record, ResolveInfo, TransactionHandle};
}
