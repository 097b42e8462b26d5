//! # autograph-data
//!
//! Declarative model layer and storage contract:
//!
//! - [`Model`] / [`Field`]: named fields with storage columns, read
//!   ([`Getter`]) and write ([`Setter`]) resolution, and per-field hooks.
//! - [`HookSet`]: the nine [`HookStage`] slots shared by models and fields.
//! - [`StorageAdapter`]: the backend trait, fed with [`QueryTransport`] and
//!   [`MutationTransport`] values.

pub mod adapter;
pub mod error;
pub mod field;
pub mod hooks;
pub mod model;
pub mod order;
pub mod page;

pub use adapter::{Lookup, MutationTransport, QueryResponse, QueryTransport, StorageAdapter};
pub use error::DataError;
pub use field::{AfterDataFn, Field, FieldBuilder, Getter, GetterCall, GetterFn, Setter, SetterCall, TransformFn};
pub use hooks::{DataHook, EffectHook, HookCall, HookKind, HookSet, HookStage};
pub use model::{Model, ModelBuilder, ModelError};
pub use order::{parse_order, Direction, Order};
pub use page::Page;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        DataError, Direction, Field, Getter, HookCall, HookSet, Model, MutationTransport, Order, Page,
        QueryResponse, QueryTransport, Setter, SetterCall, StorageAdapter,
    };
}
