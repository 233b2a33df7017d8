//! Document store capability
//!
//! The query layer only ever talks to storage through [`DocumentStore`], so a
//! real database client and the file-backed [`MemoryStore`] are
//! interchangeable.

#[cfg(test)]
mod tests;

pub mod cursor;
pub mod matcher;
pub mod memory;
pub mod ordering;
pub mod path;

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;

pub use cursor::{DocumentCursor, SortDirection};
pub use memory::MemoryStore;

/// Identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// A stored document: nested mapping with insertion order preserved.
pub type Document = Map<String, Value>;

/// Match conditions keyed by dotted field path. Interpreted by the store.
pub type Filter = Map<String, Value>;

/// Inclusion set of dotted field paths.
pub type Projection = BTreeSet<String>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read operations the query layer needs from a document store.
///
/// `sort` and `limit` are composed on the returned [`DocumentCursor`].
pub trait DocumentStore {
    /// Documents matching `filter`, restricted to `projection` when given.
    fn find(&self, filter: &Filter, projection: Option<&Projection>)
    -> StoreResult<DocumentCursor<'_>>;

    /// Unique values of `field` across documents matching `filter`, in
    /// store-defined order.
    fn distinct_values(&self, field: &str, filter: &Filter) -> StoreResult<Vec<Value>>;
}
