// Embeddings module
// Turns free text into vectors for similarity search

pub mod ollama;

use anyhow::Result;

pub use ollama::OllamaClient;

/// Anything that can turn text into an embedding vector.
pub trait Embedder {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed_query(text)).collect()
    }
}
