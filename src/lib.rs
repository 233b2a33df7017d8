use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocQueryError>;

#[derive(Error, Debug)]
pub enum DocQueryError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Query error: {0}")]
    Query(#[from] query::QueryError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod embeddings;
pub mod query;
pub mod rag;
pub mod request;
pub mod store;
