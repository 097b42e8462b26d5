use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use autograph_core::{id_string, BoxFuture, EngineConfig, Record, TransactionHandle};
use autograph_data::{
    DataError, Direction, Lookup, MutationTransport, Order, Page, QueryResponse, QueryTransport, StorageAdapter,
};
use dashmap::DashMap;
use serde_json::Value;

use crate::cursor::{CursorPosition, CursorStore, MemoryCursorStore};

#[derive(Debug, Clone)]
struct Row {
    seq: u64,
    record: Record,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<String, Row>,
    next_id: u64,
    next_seq: u64,
}

/// Pending row changes of one table inside a transaction. `None` marks a
/// deleted row.
type Overlay = HashMap<String, Option<Row>>;

/// Row `id` as seen through `overlay`.
fn current(table: &Table, overlay: Option<&Overlay>, id: &str) -> Option<Row> {
    match overlay.and_then(|o| o.get(id)) {
        Some(entry) => entry.clone(),
        None => table.rows.get(id).cloned(),
    }
}

fn put(table: &mut Table, overlay: Option<&mut Overlay>, id: String, row: Option<Row>) {
    match (overlay, row) {
        (Some(overlay), row) => {
            overlay.insert(id, row);
        }
        (None, Some(row)) => {
            table.rows.insert(id, row);
        }
        (None, None) => {
            table.rows.remove(&id);
        }
    }
}

/// Marker stored in handles issued by [`MemoryAdapter::begin`].
#[derive(Debug)]
struct MemoryTransaction;

/// [`StorageAdapter`] keeping every table in process memory.
///
/// Records are keyed by the id column (`id` unless configured). Creates
/// without an id get the next number of their table. Collection queries are
/// paged with opaque cursors from a [`CursorStore`].
///
/// Writes made under a transaction handle are kept aside per row and only
/// applied to the tables on `release(handle, true)`. Reads carrying the
/// handle in their context see those pending rows.
#[derive(Clone)]
pub struct MemoryAdapter {
    tables: Arc<DashMap<String, Table>>,
    staged: Arc<DashMap<u64, HashMap<String, Overlay>>>,
    cursors: Arc<dyn CursorStore>,
    id_column: String,
    page_size: usize,
    transactions: bool,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    /// Page size and cursor lifetime come from `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            tables: Arc::new(DashMap::new()),
            staged: Arc::new(DashMap::new()),
            cursors: Arc::new(MemoryCursorStore::new(config.cursor_ttl)),
            id_column: "id".into(),
            page_size: config.page_size.max(1),
            transactions: true,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn with_cursor_store(mut self, store: Arc<dyn CursorStore>) -> Self {
        self.cursors = store;
        self
    }

    /// `begin` hands out no handle; every write is applied immediately.
    pub fn without_transactions(mut self) -> Self {
        self.transactions = false;
        self
    }

    /// Inserts `record` directly, outside any transaction.
    pub fn seed(&self, table: &str, record: Record) -> Result<String, DataError> {
        let mut table = self.tables.entry(table.to_string()).or_default();
        let (id, row) = self.new_row(&mut table, None, record)?;
        table.rows.insert(id.clone(), row);
        Ok(id)
    }

    /// Committed record count of `table`.
    pub fn count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    /// Committed copy of a record.
    pub fn get(&self, table: &str, id: &str) -> Option<Record> {
        self.tables.get(table)?.rows.get(id).map(|row| row.record.clone())
    }

    /// Number of transactions begun and not yet released.
    pub fn open_transactions(&self) -> usize {
        self.staged.len()
    }

    fn new_row(&self, table: &mut Table, overlay: Option<&Overlay>, mut record: Record) -> Result<(String, Row), DataError> {
        let id = match record.get(&self.id_column) {
            Some(value) => id_string(value)
                .ok_or_else(|| DataError::Other(format!("`{}` must be a string or a number", self.id_column)))?,
            None => loop {
                table.next_id += 1;
                let id = table.next_id.to_string();
                if current(table, overlay, &id).is_none() {
                    break id;
                }
            },
        };
        if current(table, overlay, &id).is_some() {
            return Err(DataError::Other(format!("duplicate id `{id}`")));
        }
        record.insert(self.id_column.clone(), Value::String(id.clone()));
        table.next_seq += 1;
        Ok((
            id,
            Row {
                seq: table.next_seq,
                record,
            },
        ))
    }

    fn staged_for(&self, trx: Option<&TransactionHandle>) -> Option<u64> {
        let id = trx?.id();
        self.staged.contains_key(&id).then_some(id)
    }

    fn write(&self, mutation: MutationTransport) -> Result<Option<Record>, DataError> {
        let op = mutation.kind()?;
        let staged_id = self.staged_for(mutation.trx.as_ref());
        let MutationTransport { name, id, data, .. } = mutation;
        tracing::debug!(table = %name, operation = %op, id = id.as_deref(), staged = staged_id.is_some(), "Memory write");

        // Lock order: table shard, then staged shard.
        let mut table = self.tables.entry(name.clone()).or_default();
        let mut staged = staged_id.and_then(|id| self.staged.get_mut(&id));
        let overlay = staged.as_mut().map(|s| s.entry(name.clone()).or_default());

        let record = match (id, data) {
            (None, Some(data)) => {
                let (id, row) = self.new_row(&mut table, overlay.as_deref(), data)?;
                let record = row.record.clone();
                put(&mut table, overlay, id, Some(row));
                Some(record)
            }
            (Some(id), Some(data)) => match current(&table, overlay.as_deref(), &id) {
                Some(mut row) => {
                    for (key, value) in data {
                        if key != self.id_column {
                            row.record.insert(key, value);
                        }
                    }
                    let record = row.record.clone();
                    put(&mut table, overlay, id, Some(row));
                    Some(record)
                }
                None => None,
            },
            (Some(id), None) => match current(&table, overlay.as_deref(), &id) {
                Some(row) => {
                    put(&mut table, overlay, id, None);
                    Some(row.record)
                }
                None => None,
            },
            (None, None) => return Err(DataError::InvalidQuery(name)),
        };
        Ok(record)
    }

    /// Rows of `name` as seen through the transaction, if any.
    fn rows(&self, name: &str, trx: Option<&TransactionHandle>) -> BTreeMap<String, Row> {
        let mut rows = self.tables.get(name).map(|t| t.rows.clone()).unwrap_or_default();
        let staged = self.staged_for(trx).and_then(|id| self.staged.get(&id));
        if let Some(overlay) = staged.as_ref().and_then(|s| s.get(name)) {
            for (id, entry) in overlay {
                match entry {
                    Some(row) => rows.insert(id.clone(), row.clone()),
                    None => rows.remove(id),
                };
            }
        }
        rows
    }

    fn read(&self, query: QueryTransport) -> Result<QueryResponse, DataError> {
        let QueryTransport { name, lookup, context } = query;
        let trx = context.transaction();
        match lookup {
            Lookup::Id(id) => {
                let record = self.rows(&name, trx).remove(&id).map(|row| row.record);
                Ok(QueryResponse::Record(record))
            }
            Lookup::Cursor { cursor, order } => {
                let offset = cursor
                    .as_deref()
                    .and_then(|token| self.cursors.resolve(token))
                    .filter(|position| position.table == name && position.order == order)
                    .map(|position| position.offset)
                    .unwrap_or(0);

                let mut rows: Vec<Row> = self.rows(&name, trx).into_values().collect();
                sort_rows(&mut rows, order.as_ref());

                let total = rows.len();
                let end = (offset + self.page_size).min(total);
                let items = rows
                    .into_iter()
                    .skip(offset)
                    .take(self.page_size)
                    .map(|row| row.record)
                    .collect();
                tracing::debug!(table = %name, offset, end, total, "Memory page");
                let next = (end < total).then(|| {
                    self.cursors.issue(CursorPosition {
                        table: name,
                        order,
                        offset: end,
                    })
                });
                Ok(QueryResponse::Page(Page::new(items, next)))
            }
        }
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageAdapter for MemoryAdapter {
    fn on_query(&self, query: QueryTransport) -> BoxFuture<'_, Result<QueryResponse, DataError>> {
        Box::pin(async move { self.read(query) })
    }

    fn on_mutation(&self, mutation: MutationTransport) -> BoxFuture<'_, Result<Option<Record>, DataError>> {
        Box::pin(async move { self.write(mutation) })
    }

    fn begin(&self) -> BoxFuture<'_, Result<Option<TransactionHandle>, DataError>> {
        Box::pin(async move {
            if !self.transactions {
                return Ok(None);
            }
            let handle = TransactionHandle::new(MemoryTransaction);
            self.staged.insert(handle.id(), HashMap::new());
            Ok(Some(handle))
        })
    }

    fn release(&self, handle: TransactionHandle, success: bool) -> BoxFuture<'_, Result<(), DataError>> {
        Box::pin(async move {
            let Some((_, overlays)) = self.staged.remove(&handle.id()) else {
                return Err(DataError::Other(format!("unknown transaction #{}", handle.id())));
            };
            if !success {
                tracing::debug!(trx = handle.id(), "Memory transaction discarded");
                return Ok(());
            }
            for (name, overlay) in overlays {
                let mut table = self.tables.entry(name).or_default();
                for (id, entry) in overlay {
                    put(&mut table, None, id, entry);
                }
            }
            tracing::debug!(trx = handle.id(), "Memory transaction applied");
            Ok(())
        })
    }
}

fn sort_rows(rows: &mut [Row], order: Option<&Order>) {
    match order {
        None => rows.sort_by_key(|row| row.seq),
        Some(order) => rows.sort_by(|a, b| {
            let ordering = compare_values(a.record.get(&order.name), b.record.get(&order.name))
                .then_with(|| a.seq.cmp(&b.seq));
            match order.direction() {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        }),
    }
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order over JSON values: missing or null first, then booleans,
/// numbers and strings by content, then arrays and objects by type only.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
