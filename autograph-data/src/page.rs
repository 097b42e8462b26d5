use autograph_core::Record;
use serde::Serialize;

/// One slice of a collection query.
///
/// `cursor` is opaque to the engine; adapters hand it back on the next
/// `_many` call to continue where this page stopped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<Record>,
    pub cursor: Option<String>,
    pub has_more: bool,
}

impl Page {
    pub fn new(items: Vec<Record>, cursor: Option<String>) -> Self {
        let has_more = cursor.is_some();
        Self {
            items,
            cursor,
            has_more,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
