//! Binds a model's pipeline and query resolver into named entry points.
//!
//! For a model `M` the generated set contains:
//!
//! | Group | Name | Arguments | Returns |
//! |-------|------|-----------|---------|
//! | query | `M` | `{ id }` | the record |
//! | query | `M_many` | `{ cursor?, order? }` | `{ items, cursor, has_more }` |
//! | mutation | `M_create` | `{ data: [..] }` | committed records |
//! | mutation | `M_update` | `{ data: [..] }`, each with its id | committed records |
//! | mutation | `M_delete` | `{ ids: [..] }` | the deleted ids |
//! | root | one per readable field | field arguments | the field value |
//!
//! Mutation entry points can be renamed or disabled on the model.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use autograph_core::{id_string, AutographError, BoxFuture, Context, Operation, Record, ResolveInfo};
use autograph_data::{GetterCall, Model, StorageAdapter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::field_resolver::resolve_field;
use crate::mutation::{MutationOptions, MutationPipeline};
use crate::query::QueryResolver;

/// Uniform resolver signature: `(source, args, context, info)`.
pub type Resolver = Arc<
    dyn Fn(Option<Arc<Record>>, Value, Context, ResolveInfo) -> BoxFuture<'static, Result<Value, AutographError>>
        + Send
        + Sync,
>;

/// Wraps an async closure into a [`Resolver`].
pub fn resolver<F, Fut>(f: F) -> Resolver
where
    F: Fn(Option<Arc<Record>>, Value, Context, ResolveInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, AutographError>> + Send + 'static,
{
    Arc::new(
        move |source, args, context, info| -> BoxFuture<'static, Result<Value, AutographError>> {
            Box::pin(f(source, args, context, info))
        },
    )
}

/// Resolvers generated for one or more models.
#[derive(Clone, Default)]
pub struct ResolverSet {
    /// Field resolvers, keyed by model name then field name.
    pub root: BTreeMap<String, BTreeMap<String, Resolver>>,
    pub query: BTreeMap<String, Resolver>,
    pub mutation: BTreeMap<String, Resolver>,
}

impl ResolverSet {
    pub fn query(&self, name: &str) -> Option<&Resolver> {
        self.query.get(name)
    }

    pub fn mutation(&self, name: &str) -> Option<&Resolver> {
        self.mutation.get(name)
    }

    pub fn field(&self, model: &str, field: &str) -> Option<&Resolver> {
        self.root.get(model)?.get(field)
    }

    /// Moves every resolver of `other` into this set.
    ///
    /// Fails without modifying `self` when a query or mutation name, or a
    /// model's root group, already exists.
    pub fn merge(&mut self, other: ResolverSet) -> Result<(), AutographError> {
        let clash = other
            .query
            .keys()
            .chain(other.mutation.keys())
            .find(|name| self.query.contains_key(*name) || self.mutation.contains_key(*name))
            .or_else(|| other.root.keys().find(|name| self.root.contains_key(*name)));
        if let Some(name) = clash {
            return Err(AutographError::InvalidArguments(format!("entry point `{name}` is already registered")));
        }
        self.root.extend(other.root);
        self.query.extend(other.query);
        self.mutation.extend(other.mutation);
        Ok(())
    }
}

impl fmt::Debug for ResolverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root: BTreeMap<&String, Vec<&String>> =
            self.root.iter().map(|(model, fields)| (model, fields.keys().collect())).collect();
        f.debug_struct("ResolverSet")
            .field("root", &root)
            .field("query", &self.query.keys().collect::<Vec<_>>())
            .field("mutation", &self.mutation.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Deserialize)]
struct OneArgs {
    #[serde(default)]
    id: Value,
}

#[derive(Deserialize)]
struct ManyArgs {
    cursor: Option<String>,
    order: Option<String>,
}

#[derive(Deserialize)]
struct DataArgs {
    #[serde(default)]
    data: Vec<Record>,
}

#[derive(Deserialize)]
struct IdsArgs {
    #[serde(default)]
    ids: Vec<Value>,
}

/// Builds the query, mutation and field resolvers of `model`.
pub fn build_resolvers(model: Arc<Model>, adapter: Arc<dyn StorageAdapter>, options: MutationOptions) -> ResolverSet {
    let query = Arc::new(QueryResolver::new(Arc::clone(&model), Arc::clone(&adapter)));
    let pipeline = Arc::new(MutationPipeline::new(Arc::clone(&model), adapter, options));
    let name = model.name().to_string();
    let mut set = ResolverSet::default();

    let fields: BTreeMap<String, Resolver> = model
        .fields()
        .filter(|field| field.is_readable())
        .map(|field| {
            let field_name = field.name().to_string();
            let field = Arc::new(field.clone());
            let query = Arc::clone(&query);
            let resolve = resolver(move |source, args, context, info| {
                let field = Arc::clone(&field);
                let query = Arc::clone(&query);
                async move {
                    let source = source.ok_or_else(|| {
                        AutographError::InvalidArguments(format!("field `{}` needs a source record", field.name()))
                    })?;
                    resolve_field(&field, &query, GetterCall { source, args, context, info }).await
                }
            });
            (field_name, resolve)
        })
        .collect();
    set.root.insert(name.clone(), fields);

    let one = Arc::clone(&query);
    set.query.insert(
        model.query_name().to_string(),
        resolver(move |_, args, context, info| {
            let query = Arc::clone(&one);
            async move {
                let OneArgs { id } = parse_args(args)?;
                let id = id_string(&id).ok_or_else(|| {
                    AutographError::InvalidArguments(format!("{}: `id` must be a string or a number", query.model().name()))
                })?;
                Ok(Value::Object(query.get_one(&id, &context, &info).await?))
            }
        }),
    );

    let many = Arc::clone(&query);
    set.query.insert(
        model.query_many_name(),
        resolver(move |_, args, context, _| {
            let query = Arc::clone(&many);
            async move {
                let ManyArgs { cursor, order } = parse_args(args)?;
                let page = query.query_many(cursor, order.as_deref(), &context).await?;
                Ok(serde_json::to_value(page)?)
            }
        }),
    );

    if let Some(entry) = model.mutation_name(Operation::Create) {
        let pipeline = Arc::clone(&pipeline);
        set.mutation.insert(
            entry.to_string(),
            resolver(move |_, args, context, info| {
                let pipeline = Arc::clone(&pipeline);
                async move {
                    let DataArgs { data } = parse_args(args)?;
                    if data.is_empty() {
                        return Ok(Value::Array(Vec::new()));
                    }
                    let results = pipeline.create(data, &context, &info).await;
                    Ok(Value::Array(settle_batch(pipeline.model().name(), results)?))
                }
            }),
        );
    }

    if let Some(entry) = model.mutation_name(Operation::Update) {
        let pipeline = Arc::clone(&pipeline);
        set.mutation.insert(
            entry.to_string(),
            resolver(move |_, args, context, info| {
                let pipeline = Arc::clone(&pipeline);
                async move {
                    let DataArgs { data } = parse_args(args)?;
                    if data.is_empty() {
                        return Ok(Value::Array(Vec::new()));
                    }
                    let results = pipeline.update(data, &context, &info).await;
                    Ok(Value::Array(settle_batch(pipeline.model().name(), results)?))
                }
            }),
        );
    }

    if let Some(entry) = model.mutation_name(Operation::Delete) {
        set.mutation.insert(
            entry.to_string(),
            resolver(move |_, args, context, info| {
                let pipeline = Arc::clone(&pipeline);
                async move {
                    let IdsArgs { ids } = parse_args(args)?;
                    if ids.is_empty() {
                        return Ok(Value::Array(Vec::new()));
                    }
                    let ids = ids
                        .iter()
                        .map(|id| {
                            id_string(id).ok_or_else(|| {
                                AutographError::InvalidArguments(format!(
                                    "{}: every id must be a string or a number",
                                    pipeline.model().name()
                                ))
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    let results = pipeline.delete(ids, &context, &info).await;
                    Ok(Value::Array(settle_batch(pipeline.model().name(), results)?))
                }
            }),
        );
    }

    set
}

/// Missing or `null` arguments read as an empty object.
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, AutographError> {
    let args = if args.is_null() { Value::Object(Record::new()) } else { args };
    Ok(serde_json::from_value(args)?)
}

/// Turns per-item results into the entry point's answer.
///
/// A one-item batch reports its own error. Larger batches report every
/// failed index in a single `Batch` error, alongside the output of the items
/// that committed.
fn settle_batch<T: Into<Value>>(entity: &str, results: Vec<Result<T, AutographError>>) -> Result<Vec<Value>, AutographError> {
    let single = results.len() == 1;
    let mut committed = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) => committed.push((index, value.into())),
            Err(err) => failures.push((index, err)),
        }
    }
    match failures.pop() {
        None => Ok(committed.into_iter().map(|(_, value)| value).collect()),
        Some((_, err)) if single => Err(err),
        Some(last) => {
            failures.push(last);
            Err(AutographError::Batch {
                entity: entity.to_string(),
                committed,
                failures,
            })
        }
    }
}
