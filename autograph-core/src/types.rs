//! Values shared by every layer of the engine: records, request context,
//! resolve info and transaction handles.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

/// A record as seen by resolvers, hooks and storage adapters.
pub type Record = serde_json::Map<String, Value>;

/// A boxed, `Send` future. Used at every object-safe async seam.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The three write operations the mutation pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to an adapter-side transaction.
///
/// The engine never looks inside: it only carries the handle from where it
/// was acquired (or supplied by the caller) to the adapter's commit call.
/// Two handles are equal when they were created by the same `new` call.
#[derive(Clone)]
pub struct TransactionHandle {
    id: u64,
    inner: Arc<dyn Any + Send + Sync>,
}

impl TransactionHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            id: NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed),
            inner: Arc::new(value),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Borrow the adapter-specific payload.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for TransactionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TransactionHandle {}

impl fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionHandle(#{})", self.id)
    }
}

/// Caller context, forwarded unchanged to every hook, transform and adapter
/// call of a request.
///
/// The payload is whatever the serving layer wants hooks to see (a session,
/// a tenant, a user id). A caller that already holds an adapter transaction
/// attaches it with [`Context::with_transaction`]; the mutation pipeline then
/// uses it instead of acquiring its own.
#[derive(Clone, Default)]
pub struct Context {
    value: Option<Arc<dyn Any + Send + Sync>>,
    transaction: Option<TransactionHandle>,
}

impl Context {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Arc::new(value)),
            transaction: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    pub fn with_transaction(mut self, transaction: TransactionHandle) -> Self {
        self.transaction = Some(transaction);
        self
    }

    pub fn transaction(&self) -> Option<&TransactionHandle> {
        self.transaction.as_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("has_value", &self.value.is_some())
            .field("transaction", &self.transaction)
            .finish()
    }
}

/// Where in the request a resolver is running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveInfo {
    pub parent_type: String,
    pub field_name: String,
}

impl ResolveInfo {
    pub fn new(parent_type: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            parent_type: parent_type.into(),
            field_name: field_name.into(),
        }
    }
}

/// Render a JSON identity (`"42"` or `42`) as the string form used in
/// transports and errors. Anything else is not an identity.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
