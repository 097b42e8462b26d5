use std::collections::BTreeMap;
use std::sync::Arc;

use autograph_core::{AutographError, Context, EngineConfig, Record, ResolveInfo};
use autograph_data::{Model, StorageAdapter};
use serde_json::Value;

use crate::assembly::{build_resolvers, ResolverSet};
use crate::mutation::MutationOptions;

/// A set of models served from one storage adapter.
///
/// ```ignore
/// let mut schema = Schema::new(Arc::new(MemoryAdapter::new()));
/// schema.register(user_model())?;
/// let created = schema.execute("user_create", json!({ "data": [{ "name": "Ada" }] }), Context::empty()).await?;
/// ```
pub struct Schema {
    adapter: Arc<dyn StorageAdapter>,
    options: MutationOptions,
    models: BTreeMap<String, Arc<Model>>,
    resolvers: ResolverSet,
}

impl Schema {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self::with_options(adapter, MutationOptions::default())
    }

    pub fn with_options(adapter: Arc<dyn StorageAdapter>, options: MutationOptions) -> Self {
        Self {
            adapter,
            options,
            models: BTreeMap::new(),
            resolvers: ResolverSet::default(),
        }
    }

    pub fn from_config(adapter: Arc<dyn StorageAdapter>, config: &EngineConfig) -> Self {
        Self::with_options(adapter, MutationOptions::from(config))
    }

    /// Generates and adds the resolvers of `model`.
    ///
    /// Fails when the model name or one of its entry points is taken.
    pub fn register(&mut self, model: Model) -> Result<Arc<Model>, AutographError> {
        if self.models.contains_key(model.name()) {
            return Err(AutographError::InvalidArguments(format!(
                "model `{}` is already registered",
                model.name()
            )));
        }
        let model = Arc::new(model);
        self.resolvers
            .merge(build_resolvers(Arc::clone(&model), Arc::clone(&self.adapter), self.options))?;
        self.models.insert(model.name().to_string(), Arc::clone(&model));
        tracing::debug!(model = model.name(), "Model registered");
        Ok(model)
    }

    pub fn model(&self, name: &str) -> Option<&Arc<Model>> {
        self.models.get(name)
    }

    pub fn resolvers(&self) -> &ResolverSet {
        &self.resolvers
    }

    /// Runs a query or mutation entry point by name.
    pub async fn execute(&self, entry: &str, args: Value, context: Context) -> Result<Value, AutographError> {
        let (parent, resolver) = match (self.resolvers.query(entry), self.resolvers.mutation(entry)) {
            (Some(resolver), _) => ("Query", resolver),
            (None, Some(resolver)) => ("Mutation", resolver),
            (None, None) => {
                return Err(AutographError::InvalidArguments(format!("unknown entry point `{entry}`")));
            }
        };
        resolver(None, args, context, ResolveInfo::new(parent, entry)).await
    }

    /// Reads one field of `source`, a record of `model`.
    pub async fn resolve_field(
        &self,
        model: &str,
        field: &str,
        source: Arc<Record>,
        args: Value,
        context: Context,
    ) -> Result<Value, AutographError> {
        let resolver = self.resolvers.field(model, field).ok_or_else(|| AutographError::UnknownField {
            entity: model.to_string(),
            field: field.to_string(),
        })?;
        resolver(Some(source), args, context, ResolveInfo::new(model, field)).await
    }
}
