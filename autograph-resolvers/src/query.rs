use std::sync::Arc;

use autograph_core::{AutographError, Context, Record, ResolveInfo};
use autograph_data::{parse_order, DataError, Model, Order, Page, QueryResponse, QueryTransport, StorageAdapter};
use serde_json::json;

/// Read side of a model: single-record and collection fetches.
#[derive(Clone)]
pub struct QueryResolver {
    model: Arc<Model>,
    adapter: Arc<dyn StorageAdapter>,
}

impl QueryResolver {
    pub fn new(model: Arc<Model>, adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { model, adapter }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Looks up a record of any model by identity.
    pub async fn fetch(&self, entity: &str, id: &str, context: &Context) -> Result<Option<Record>, AutographError> {
        let transport = QueryTransport::one(entity, id, context.clone());
        match self.adapter.on_query(transport).await? {
            QueryResponse::Record(record) => Ok(record),
            QueryResponse::Page(_) => Err(DataError::Other(format!(
                "adapter answered an id lookup on `{entity}` with a page"
            ))
            .into()),
        }
    }

    /// Fetches one record of this model, failing with `NotFound` when absent.
    pub async fn get_one(&self, id: &str, context: &Context, info: &ResolveInfo) -> Result<Record, AutographError> {
        let entity = self.model.name();
        tracing::debug!(entity, id, field = %info.field_name, "Fetching record");
        self.fetch(entity, id, context)
            .await?
            .ok_or_else(|| AutographError::not_found(entity, json!({ "id": id })))
    }

    /// Translates an order argument into a storage order.
    ///
    /// Known fields map to their column, unknown names pass through
    /// unchanged and malformed arguments give no order at all.
    pub fn resolve_order(&self, arg: Option<&str>) -> Option<Order> {
        let (key, by) = parse_order(arg?)?;
        Some(Order::new(self.model.column_for(key), by))
    }

    pub async fn query_many(
        &self,
        cursor: Option<String>,
        order: Option<&str>,
        context: &Context,
    ) -> Result<Page, AutographError> {
        let entity = self.model.name();
        let order = self.resolve_order(order);
        tracing::debug!(entity, cursor = cursor.as_deref(), order = ?order, "Querying collection");
        let transport = QueryTransport::many(entity, cursor, order, context.clone());
        match self.adapter.on_query(transport).await? {
            QueryResponse::Page(page) => Ok(page),
            QueryResponse::Record(_) => Err(DataError::Other(format!(
                "adapter answered a collection query on `{entity}` with a single record"
            ))
            .into()),
        }
    }
}
