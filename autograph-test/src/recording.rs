use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use autograph_core::{BoxFuture, Operation, Record, TransactionHandle};
use autograph_data::{DataError, MutationTransport, QueryResponse, QueryTransport, StorageAdapter};
use autograph_memory::MemoryAdapter;

#[derive(Default)]
struct Log {
    queries: Vec<QueryTransport>,
    mutations: Vec<MutationTransport>,
    begun: Vec<TransactionHandle>,
    released: Vec<(TransactionHandle, bool)>,
    fail_mutations: Option<String>,
    return_nothing: bool,
}

/// Wraps a [`StorageAdapter`] and records every call made through it.
///
/// Clones share the same log, so a test can keep one clone and hand
/// another to the code under test.
///
/// ```ignore
/// let adapter = RecordingAdapter::memory();
/// let schema = Schema::new(Arc::new(adapter.clone()));
/// // ...
/// assert_eq!(adapter.mutation_count(), 0);
/// ```
pub struct RecordingAdapter<A = MemoryAdapter> {
    inner: Arc<A>,
    log: Arc<Mutex<Log>>,
}

impl<A> Clone for RecordingAdapter<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            log: Arc::clone(&self.log),
        }
    }
}

impl RecordingAdapter<MemoryAdapter> {
    /// Records calls to a fresh [`MemoryAdapter`].
    pub fn memory() -> Self {
        Self::new(MemoryAdapter::new())
    }
}

impl<A: StorageAdapter> RecordingAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner: Arc::new(inner),
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn log(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every mutation fails with `DataError::Other(message)` from now on,
    /// without reaching the wrapped adapter.
    pub fn fail_mutations(&self, message: impl Into<String>) {
        self.log().fail_mutations = Some(message.into());
    }

    /// Mutations reach the wrapped adapter but report no record back.
    pub fn return_nothing(&self) {
        self.log().return_nothing = true;
    }

    /// Clears injected failures.
    pub fn heal(&self) {
        let mut log = self.log();
        log.fail_mutations = None;
        log.return_nothing = false;
    }

    pub fn queries(&self) -> Vec<QueryTransport> {
        self.log().queries.clone()
    }

    pub fn mutations(&self) -> Vec<MutationTransport> {
        self.log().mutations.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.log().mutations.len()
    }

    /// Recorded mutations of one kind.
    pub fn mutations_of(&self, op: Operation) -> Vec<MutationTransport> {
        self.log()
            .mutations
            .iter()
            .filter(|m| m.kind().ok() == Some(op))
            .cloned()
            .collect()
    }

    /// Handles returned by `begin`, in order.
    pub fn begun(&self) -> Vec<TransactionHandle> {
        self.log().begun.clone()
    }

    /// `(handle, success)` of every `release`, in order.
    pub fn released(&self) -> Vec<(TransactionHandle, bool)> {
        self.log().released.clone()
    }
}

impl<A: StorageAdapter> StorageAdapter for RecordingAdapter<A> {
    fn on_query(&self, query: QueryTransport) -> BoxFuture<'_, Result<QueryResponse, DataError>> {
        self.log().queries.push(query.clone());
        self.inner.on_query(query)
    }

    fn on_mutation(&self, mutation: MutationTransport) -> BoxFuture<'_, Result<Option<Record>, DataError>> {
        let (failure, nothing) = {
            let mut log = self.log();
            log.mutations.push(mutation.clone());
            (log.fail_mutations.clone(), log.return_nothing)
        };
        Box::pin(async move {
            if let Some(message) = failure {
                return Err(DataError::Other(message));
            }
            let record = self.inner.on_mutation(mutation).await?;
            Ok(if nothing { None } else { record })
        })
    }

    fn begin(&self) -> BoxFuture<'_, Result<Option<TransactionHandle>, DataError>> {
        Box::pin(async move {
            let handle = self.inner.begin().await?;
            if let Some(handle) = &handle {
                self.log().begun.push(handle.clone());
            }
            Ok(handle)
        })
    }

    fn release(&self, handle: TransactionHandle, success: bool) -> BoxFuture<'_, Result<(), DataError>> {
        self.log().released.push((handle.clone(), success));
        self.inner.release(handle, success)
    }
}
