//! # autograph-memory
//!
//! A [`StorageAdapter`](autograph_data::StorageAdapter) that keeps tables in
//! process memory, with optional transaction staging, and the
//! [`CursorStore`] it pages collections with.

pub mod adapter;
pub mod cursor;

pub use adapter::MemoryAdapter;
pub use cursor::{CursorPosition, CursorStore, MemoryCursorStore, TtlCache};
