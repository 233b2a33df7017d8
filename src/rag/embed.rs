use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::text::build_rag_text;
use crate::config::SearchConfig;
use crate::embeddings::Embedder;
use crate::store::MemoryStore;
use crate::store::path::{get_path, set_path};

/// Fill in the embedding field of every document that lacks one.
///
/// Documents whose text comes out empty are left alone. Returns how many
/// documents were embedded.
#[inline]
pub fn embed_documents<E>(store: &mut MemoryStore, embedder: &E, config: &SearchConfig) -> Result<usize>
where
    E: Embedder + ?Sized,
{
    let field = config.embedding_field.as_str();

    let mut pending = Vec::new();
    let mut texts = Vec::new();
    let mut empty = 0_usize;
    for (index, document) in store.documents().iter().enumerate() {
        if get_path(document, field).is_some_and(|value| !value.is_null()) {
            continue;
        }

        let text = build_rag_text(document, &config.text_fields);
        if text.is_empty() {
            empty += 1;
            continue;
        }

        pending.push(index);
        texts.push(text);
    }

    if empty > 0 {
        warn!("Skipping {} documents with no text to embed", empty);
    }

    if texts.is_empty() {
        debug!("No documents need embeddings");
        return Ok(0);
    }

    info!("Generating embeddings for {} documents", texts.len());
    let embeddings = embedder
        .embed_batch(&texts)
        .context("Failed to generate document embeddings")?;

    if embeddings.len() != pending.len() {
        anyhow::bail!(
            "Embedder returned {} embeddings for {} documents",
            embeddings.len(),
            pending.len()
        );
    }

    let documents = store.documents_mut();
    for (index, embedding) in pending.iter().zip(embeddings) {
        let vector = embedding.into_iter().map(f64::from).map(Value::from).collect();
        if let Some(document) = documents.get_mut(*index) {
            set_path(document, field, Value::Array(vector));
        }
    }

    Ok(pending.len())
}
