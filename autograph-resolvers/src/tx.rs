//! Transaction scope around a single commit call.

use std::sync::Arc;

use autograph_core::{Context, ManagedResource, TransactionHandle};
use autograph_data::{DataError, StorageAdapter};

/// Everything a [`TransactionScope`] needs to acquire a handle.
pub struct TransactionSource<'a> {
    pub adapter: &'a Arc<dyn StorageAdapter>,
    pub context: &'a Context,
    /// Whether to ask the adapter for a fresh handle when the caller
    /// supplied none.
    pub begin: bool,
}

/// The transaction handle used by one adapter write.
///
/// - `acquire`: reuses the handle carried by the [`Context`], else asks the
///   adapter to `begin` one (when enabled)
/// - `release(success)`: hands a handle obtained from `begin` back to the
///   adapter; caller-supplied handles are left untouched
pub struct TransactionScope {
    handle: Option<TransactionHandle>,
    owned: bool,
    adapter: Arc<dyn StorageAdapter>,
}

impl TransactionScope {
    pub fn handle(&self) -> Option<&TransactionHandle> {
        self.handle.as_ref()
    }

    /// Whether this scope began the transaction itself.
    pub fn is_owned(&self) -> bool {
        self.owned
    }
}

impl<'a> ManagedResource<TransactionSource<'a>> for TransactionScope {
    type Error = DataError;

    async fn acquire(source: &TransactionSource<'a>) -> Result<Self, Self::Error> {
        let adapter = Arc::clone(source.adapter);
        if let Some(handle) = source.context.transaction() {
            return Ok(Self {
                handle: Some(handle.clone()),
                owned: false,
                adapter,
            });
        }
        let handle = if source.begin { adapter.begin().await? } else { None };
        if let Some(handle) = &handle {
            tracing::debug!(trx = handle.id(), "Transaction started");
        }
        Ok(Self {
            owned: handle.is_some(),
            handle,
            adapter,
        })
    }

    async fn release(self, success: bool) -> Result<(), Self::Error> {
        match self.handle {
            Some(handle) if self.owned => {
                tracing::debug!(trx = handle.id(), success, "Transaction released");
                self.adapter.release(handle, success).await
            }
            _ => Ok(()),
        }
    }
}
