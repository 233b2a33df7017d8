//! Structured query normalization and tabular flattening
//!
//! A [`QuerySpec`] is validated, run once against a
//! [`DocumentStore`](crate::store::DocumentStore) and turned into a
//! [`ResultTable`] of flat rows keyed by dotted paths.


pub mod executor;
pub mod flatten;
pub mod spec;
pub mod table;

use thiserror::Error;

use crate::store::StoreError;

pub use executor::execute;
pub use flatten::{flatten, unflatten};
pub use spec::{DEFAULT_LIMIT, QueryMode, QuerySpec, SortSpec};
pub use table::{FlatRow, ResultTable};

#[derive(Debug, Error)]
pub enum QueryError {
    /// The request itself is malformed. Raised before the store is touched.
    #[error("Invalid query spec: {0}")]
    InvalidSpec(String),

    #[error("Field not allowed in queries: {0}")]
    FieldNotAllowed(String),

    #[error("Invalid query request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}
