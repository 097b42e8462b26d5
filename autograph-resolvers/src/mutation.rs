//! The mutation pipeline.
//!
//! Every item of a batch runs its own sequence of stages; items run
//! concurrently and fail independently.
//!
//! | Stage | create / update | delete |
//! |-------|-----------------|--------|
//! | lookup | update: existing record, `NotFound` if absent | existing record, `NotFound` if absent |
//! | access | `on-access` of every input field | |
//! | resolve | `set_create` / `set_update` of every input field | |
//! | pre-write | model `on-create`/`on-update`, `on-mutation`; then field hooks | model `on-delete`, `on-mutation`; then field hooks |
//! | commit | one adapter write inside a [`TransactionScope`] | one adapter delete |
//! | post-write | after-data setters, field hooks, model hooks | model hooks, field hooks |
//!
//! Field stages aggregate their failures into one `FieldErrors`. Model-level
//! failures propagate as they are. Anything failing after the commit is
//! reported as `AfterCommit` carrying the record that was written.

use std::sync::Arc;

use autograph_core::{
    id_string, AutographError, Context, EngineConfig, ManagedResource, Operation, Record, ResolveInfo,
    TransactionHandle,
};
use autograph_data::{Field, HookCall, HookStage, Model, MutationTransport, Setter, SetterCall, StorageAdapter};
use futures_util::future::{join_all, try_join_all};
use tracing::Instrument;

use crate::aggregate::{merge_additive, settle_fields};
use crate::query::QueryResolver;
use crate::tx::{TransactionScope, TransactionSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOptions {
    /// Acquire an adapter transaction around each commit.
    pub transactions: bool,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self { transactions: true }
    }
}

impl From<&EngineConfig> for MutationOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            transactions: config.transactions,
        }
    }
}

pub struct MutationPipeline {
    model: Arc<Model>,
    adapter: Arc<dyn StorageAdapter>,
    query: QueryResolver,
    options: MutationOptions,
}

impl MutationPipeline {
    pub fn new(model: Arc<Model>, adapter: Arc<dyn StorageAdapter>, options: MutationOptions) -> Self {
        Self {
            query: QueryResolver::new(Arc::clone(&model), Arc::clone(&adapter)),
            model,
            adapter,
            options,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Writes every item, in input order. Items carrying an identity update
    /// the existing record, the others create a new one.
    pub async fn create(
        &self,
        items: Vec<Record>,
        context: &Context,
        info: &ResolveInfo,
    ) -> Vec<Result<Record, AutographError>> {
        self.write_all(items, false, context, info).await
    }

    /// Updates every item, in input order. Each item must carry its identity.
    pub async fn update(
        &self,
        items: Vec<Record>,
        context: &Context,
        info: &ResolveInfo,
    ) -> Vec<Result<Record, AutographError>> {
        self.write_all(items, true, context, info).await
    }

    /// Deletes every id and returns them back, in input order.
    pub async fn delete(
        &self,
        ids: Vec<String>,
        context: &Context,
        info: &ResolveInfo,
    ) -> Vec<Result<String, AutographError>> {
        let entity = self.model.name();
        let items = ids.into_iter().enumerate().map(|(index, id)| {
            let span = tracing::debug_span!("mutation", entity, operation = "delete", index, id = %id);
            self.delete_item(id, context, info).instrument(span)
        });
        join_all(items).await
    }

    async fn write_all(
        &self,
        items: Vec<Record>,
        require_id: bool,
        context: &Context,
        info: &ResolveInfo,
    ) -> Vec<Result<Record, AutographError>> {
        let entity = self.model.name();
        let primary_key = self.model.primary_key();
        let items = items.into_iter().enumerate().map(|(index, item)| {
            let id = item.get(primary_key).and_then(id_string);
            let op = if id.is_some() { Operation::Update } else { Operation::Create };
            let span = tracing::debug_span!("mutation", entity, operation = %op, index, id = id.as_deref());
            async move {
                if require_id && id.is_none() {
                    return Err(AutographError::InvalidArguments(format!(
                        "{entity}: update item {index} has no `{primary_key}`"
                    )));
                }
                self.write_item(op, id, item, context, info).await
            }
            .instrument(span)
        });
        join_all(items).await
    }

    async fn write_item(
        &self,
        op: Operation,
        id: Option<String>,
        item: Record,
        context: &Context,
        info: &ResolveInfo,
    ) -> Result<Record, AutographError> {
        let existing = match &id {
            Some(id) => Some(Arc::new(self.query.get_one(id, context, info).await?)),
            None => None,
        };
        let call = HookCall {
            source: existing.clone(),
            context: context.clone(),
            info: info.clone(),
        };

        tracing::debug!("Running access hooks");
        self.run_access(&item, &call).await?;

        tracing::debug!("Resolving input fields");
        let mut data = self.resolve_input(op, id.as_deref(), &item, &call).await?;

        tracing::debug!("Running pre-write hooks");
        let hooks = self.model.hooks();
        merge_additive(&mut data, hooks.run_data(HookStage::before(op), call.clone()).await?);
        merge_additive(&mut data, hooks.run_data(HookStage::OnMutation, call.clone()).await?);
        for contribution in self.field_data_hooks(op, id.as_deref(), &call).await? {
            merge_additive(&mut data, contribution);
        }

        let entity = self.model.name();
        let transport = MutationTransport {
            name: entity.to_string(),
            id: id.clone(),
            data: Some(data),
            trx: None,
            context: context.clone(),
        };
        let record = self
            .commit(transport)
            .await?
            .ok_or_else(|| AutographError::Mutation {
                entity: entity.to_string(),
                operation: op,
                id: id.clone(),
                message: "expected a record back from the adapter, got nothing".into(),
            })?;

        let committed = Arc::new(record);
        let id = committed.get(self.model.primary_column()).and_then(id_string).or(id);
        let after = HookCall {
            source: Some(Arc::clone(&committed)),
            context: context.clone(),
            info: info.clone(),
        };
        let outcome = self.after_write(op, id.as_deref(), &item, after).await;
        if let Err(cause) = outcome {
            return Err(self.after_commit(id, (*committed).clone(), cause));
        }
        Ok(Arc::unwrap_or_clone(committed))
    }

    async fn delete_item(&self, id: String, context: &Context, info: &ResolveInfo) -> Result<String, AutographError> {
        let existing = Arc::new(self.query.get_one(&id, context, info).await?);
        let call = HookCall {
            source: Some(Arc::clone(&existing)),
            context: context.clone(),
            info: info.clone(),
        };

        tracing::debug!("Running pre-delete hooks");
        let hooks = self.model.hooks();
        hooks.run_effect(HookStage::OnDelete, call.clone()).await?;
        hooks.run_data(HookStage::OnMutation, call.clone()).await?;
        self.field_data_hooks(Operation::Delete, Some(&id), &call).await?;

        let transport = MutationTransport::delete(self.model.name(), id.clone(), context.clone());
        self.commit(transport).await?;

        tracing::debug!("Running post-delete hooks");
        let after = async {
            hooks.run_effect(HookStage::OnDeleteAfterData, call.clone()).await?;
            hooks.run_effect(HookStage::OnMutationAfterData, call.clone()).await?;
            self.field_after_hooks(Operation::Delete, Some(&id), &call).await
        };
        let outcome = after.await;
        if let Err(cause) = outcome {
            return Err(self.after_commit(Some(id), (*existing).clone(), cause));
        }
        Ok(id)
    }

    /// `on-access` of every input field; the first failure wins.
    async fn run_access(&self, item: &Record, call: &HookCall) -> Result<(), AutographError> {
        let checks = item
            .keys()
            .filter_map(|key| self.model.field(key))
            .filter(|field| field.hooks().contains(HookStage::OnAccess))
            .map(|field| field.hooks().run_effect(HookStage::OnAccess, call.clone()));
        try_join_all(checks).await?;
        Ok(())
    }

    /// Applies the write setter of every input field and merges the results.
    async fn resolve_input(
        &self,
        op: Operation,
        id: Option<&str>,
        item: &Record,
        call: &HookCall,
    ) -> Result<Record, AutographError> {
        let entity = self.model.name();
        let primary_key = self.model.primary_key();
        let ops: Vec<_> = item
            .iter()
            .map(|(key, value)| {
                let resolve = async move {
                    if key == primary_key {
                        return Ok(Record::new());
                    }
                    let Some(field) = self.model.field(key) else {
                        return Err(AutographError::UnknownField {
                            entity: entity.to_string(),
                            field: key.clone(),
                        });
                    };
                    if field.is_primary() {
                        return Ok(Record::new());
                    }
                    let setter_call = SetterCall {
                        value: value.clone(),
                        source: call.source.clone(),
                        context: call.context.clone(),
                        info: call.info.clone(),
                    };
                    write_setter(field, op).resolve(setter_call).await
                };
                (key.clone(), resolve)
            })
            .collect();

        let mut data = Record::new();
        for (_, entries) in settle_fields(entity, id, ops).await? {
            merge_additive(&mut data, entries);
        }
        Ok(data)
    }

    /// Field-level pre-write hooks: the operation hook, then `on-mutation`.
    ///
    /// Contributions come back in field-name order. Delete runs `on-delete`
    /// (which contributes nothing) and discards `on-mutation` results.
    async fn field_data_hooks(
        &self,
        op: Operation,
        id: Option<&str>,
        call: &HookCall,
    ) -> Result<Vec<Record>, AutographError> {
        let before = HookStage::before(op);
        let ops: Vec<_> = self
            .model
            .fields()
            .filter(|field| field.hooks().contains(before) || field.hooks().contains(HookStage::OnMutation))
            .map(|field| {
                let hooks = field.hooks();
                let run = async move {
                    if op == Operation::Delete {
                        hooks.run_effect(before, call.clone()).await?;
                        hooks.run_data(HookStage::OnMutation, call.clone()).await?;
                        return Ok(Record::new());
                    }
                    let mut contribution = hooks.run_data(before, call.clone()).await?;
                    merge_additive(&mut contribution, hooks.run_data(HookStage::OnMutation, call.clone()).await?);
                    Ok(contribution)
                };
                (field.name().to_string(), run)
            })
            .collect();

        let contributions = settle_fields(self.model.name(), id, ops).await?;
        Ok(contributions.into_iter().map(|(_, c)| c).collect())
    }

    /// Field-level after-data hooks: the operation hook, then `on-mutation-after-data`.
    async fn field_after_hooks(&self, op: Operation, id: Option<&str>, call: &HookCall) -> Result<(), AutographError> {
        let after = HookStage::after(op);
        let ops: Vec<_> = self
            .model
            .fields()
            .filter(|field| field.hooks().contains(after) || field.hooks().contains(HookStage::OnMutationAfterData))
            .map(|field| {
                let hooks = field.hooks();
                let run = async move {
                    hooks.run_effect(after, call.clone()).await?;
                    hooks.run_effect(HookStage::OnMutationAfterData, call.clone()).await
                };
                (field.name().to_string(), run)
            })
            .collect();
        settle_fields(self.model.name(), id, ops).await?;
        Ok(())
    }

    /// Post-write stage of create/update. `call.source` is the committed
    /// record and `id` its identity. Takes the call by value: the committed
    /// record is uniquely owned again once this returns.
    async fn after_write(
        &self,
        op: Operation,
        id: Option<&str>,
        item: &Record,
        call: HookCall,
    ) -> Result<(), AutographError> {
        let entity = self.model.name();

        let setters: Vec<_> = item
            .iter()
            .filter_map(|(key, value)| {
                let field = self.model.field(key)?;
                let after_data = match op {
                    Operation::Update => field.set_update_after_data(),
                    _ => field.set_create_after_data(),
                }?;
                let setter_call = SetterCall {
                    value: value.clone(),
                    source: call.source.clone(),
                    context: call.context.clone(),
                    info: call.info.clone(),
                };
                Some((key.clone(), after_data(setter_call)))
            })
            .collect();
        settle_fields(entity, id, setters).await?;

        self.field_after_hooks(op, id, &call).await?;

        let hooks = self.model.hooks();
        hooks.run_effect(HookStage::after(op), call.clone()).await?;
        hooks.run_effect(HookStage::OnMutationAfterData, call).await
    }

    /// One adapter write inside a transaction scope.
    ///
    /// The scope is released with `success = true` only when the adapter
    /// accepted the write (and, for create/update, returned a record). A
    /// write error takes precedence over a release error.
    async fn commit(&self, transport: MutationTransport) -> Result<Option<Record>, AutographError> {
        let op = transport.kind()?;
        let source = TransactionSource {
            adapter: &self.adapter,
            context: &transport.context,
            begin: self.options.transactions,
        };
        let scope = TransactionScope::acquire(&source).await?;
        tracing::debug!(
            trx = scope.handle().map(TransactionHandle::id),
            owned = scope.is_owned(),
            "Committing"
        );
        let transport = transport.with_transaction(scope.handle().cloned());
        let id = transport.id.clone();

        let result = self.adapter.on_mutation(transport).await;
        let success = match &result {
            Ok(record) => record.is_some() || op == Operation::Delete,
            Err(_) => false,
        };
        let released = scope.release(success).await;

        let record = result?;
        released?;
        if success {
            tracing::info!(entity = self.model.name(), operation = %op, id = id.as_deref(), "Mutation committed");
        }
        Ok(record)
    }

    fn after_commit(&self, id: Option<String>, record: Record, cause: AutographError) -> AutographError {
        tracing::warn!(entity = self.model.name(), id = id.as_deref(), error = %cause, "Post-commit stage failed");
        AutographError::AfterCommit {
            entity: self.model.name().to_string(),
            id,
            record,
            cause: Box::new(cause),
        }
    }
}

fn write_setter(field: &Field, op: Operation) -> &Setter {
    match op {
        Operation::Update => field.set_update(),
        _ => field.set_create(),
    }
}
