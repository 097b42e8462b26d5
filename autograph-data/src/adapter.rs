//! Storage adapter contract and the transports exchanged across it.

use autograph_core::{BoxFuture, Context, Operation, Record, TransactionHandle};

use crate::error::DataError;
use crate::order::Order;
use crate::page::Page;

/// What a read asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// A single record by identity.
    Id(String),
    /// A slice of the collection, continuing from `cursor` when given.
    Cursor {
        cursor: Option<String>,
        order: Option<Order>,
    },
}

/// A read request for one model.
#[derive(Debug, Clone)]
pub struct QueryTransport {
    pub name: String,
    pub lookup: Lookup,
    pub context: Context,
}

impl QueryTransport {
    pub fn one(name: impl Into<String>, id: impl Into<String>, context: Context) -> Self {
        Self {
            name: name.into(),
            lookup: Lookup::Id(id.into()),
            context,
        }
    }

    pub fn many(
        name: impl Into<String>,
        cursor: Option<String>,
        order: Option<Order>,
        context: Context,
    ) -> Self {
        Self {
            name: name.into(),
            lookup: Lookup::Cursor { cursor, order },
            context,
        }
    }
}

/// Adapter answer to a [`QueryTransport`]. `Lookup::Id` yields `Record`,
/// `Lookup::Cursor` yields `Page`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResponse {
    Record(Option<Record>),
    Page(Page),
}

/// A single resolved write.
///
/// `id` alone deletes, `data` alone creates, both update. Neither is
/// rejected with [`DataError::InvalidQuery`].
#[derive(Debug, Clone)]
pub struct MutationTransport {
    pub name: String,
    pub id: Option<String>,
    pub data: Option<Record>,
    pub trx: Option<TransactionHandle>,
    pub context: Context,
}

impl MutationTransport {
    pub fn create(name: impl Into<String>, data: Record, context: Context) -> Self {
        Self {
            name: name.into(),
            id: None,
            data: Some(data),
            trx: None,
            context,
        }
    }

    pub fn update(name: impl Into<String>, id: impl Into<String>, data: Record, context: Context) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
            data: Some(data),
            trx: None,
            context,
        }
    }

    pub fn delete(name: impl Into<String>, id: impl Into<String>, context: Context) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
            data: None,
            trx: None,
            context,
        }
    }

    pub fn with_transaction(mut self, trx: Option<TransactionHandle>) -> Self {
        self.trx = trx;
        self
    }

    /// Which write this transport describes.
    pub fn kind(&self) -> Result<Operation, DataError> {
        match (&self.id, &self.data) {
            (None, Some(_)) => Ok(Operation::Create),
            (Some(_), Some(_)) => Ok(Operation::Update),
            (Some(_), None) => Ok(Operation::Delete),
            (None, None) => Err(DataError::InvalidQuery(self.name.clone())),
        }
    }
}

/// Pluggable persistence backend.
///
/// Implementations execute exactly one resolved read or write per call.
/// Transaction support is optional: the default `begin` hands out no handle
/// and the default `release` does nothing.
pub trait StorageAdapter: Send + Sync + 'static {
    fn on_query(&self, query: QueryTransport) -> BoxFuture<'_, Result<QueryResponse, DataError>>;

    fn on_mutation(&self, mutation: MutationTransport)
        -> BoxFuture<'_, Result<Option<Record>, DataError>>;

    fn begin(&self) -> BoxFuture<'_, Result<Option<TransactionHandle>, DataError>> {
        Box::pin(async { Ok(None) })
    }

    fn release(&self, handle: TransactionHandle, success: bool) -> BoxFuture<'_, Result<(), DataError>> {
        let _ = (handle, success);
        Box::pin(async { Ok(()) })
    }
}
