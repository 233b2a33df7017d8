//! Retrieval over the collection: the text that gets embedded for each
//! document, filling in missing embeddings, and similarity search.

pub mod embed;
pub mod search;
pub mod text;


use anyhow::{Context, Result};
use tracing::debug;

pub use embed::embed_documents;
pub use search::{SCORE_FIELD, VectorSearch};
pub use text::build_rag_text;

use crate::embeddings::Embedder;
use crate::query::ResultTable;
use crate::store::DocumentStore;

/// Embed `question` and return the `k` most similar documents.
#[inline]
pub fn semantic_search<S, E>(
    search: &VectorSearch,
    store: &S,
    embedder: &E,
    question: &str,
    k: usize,
) -> Result<ResultTable>
where
    S: DocumentStore + ?Sized,
    E: Embedder + ?Sized,
{
    debug!("Embedding question: {}", question);
    let query = embedder
        .embed_query(question)
        .context("Failed to embed question")?;

    search
        .search(store, &query, k)
        .context("Vector search failed")
}
