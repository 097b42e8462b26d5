//! # autograph-resolvers
//!
//! Turns a [`Model`](autograph_data::Model) and a
//! [`StorageAdapter`](autograph_data::StorageAdapter) into resolvers:
//!
//! - [`MutationPipeline`]: staged create/update/delete with hook execution
//!   and per-field error aggregation
//! - [`QueryResolver`]: single-record and collection reads
//! - [`build_resolvers`]: the named entry points of one model
//! - [`Schema`]: several models behind one adapter

pub mod aggregate;
pub mod assembly;
pub mod field_resolver;
pub mod mutation;
pub mod query;
pub mod schema;
pub mod tx;

pub use aggregate::{merge_additive, settle_fields};
pub use assembly::{build_resolvers, resolver, Resolver, ResolverSet};
pub use field_resolver::resolve_field;
pub use mutation::{MutationOptions, MutationPipeline};
pub use query::QueryResolver;
pub use schema::Schema;
pub use tx::{TransactionScope, TransactionSource};

pub mod prelude {
    //! Re-exports of the most commonly used resolver types.
    pub use crate::{build_resolvers, MutationOptions, MutationPipeline, QueryResolver, Resolver, ResolverSet, Schema};
}
