use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::query::{QueryError, ResultTable, flatten};
use crate::store::path::{get_path, set_path};
use crate::store::{Document, DocumentStore, Filter, ID_FIELD, Projection};

/// Column holding the similarity score in search results.
pub const SCORE_FIELD: &str = "score";

/// Exact nearest-neighbour search over embeddings stored in the documents.
///
/// Scores are cosine similarity rescaled to `[0, 1]` as `(1 + cos) / 2`, the
/// same range Atlas reports for its cosine vector indexes.
#[derive(Debug, Clone)]
pub struct VectorSearch {
    embedding_field: String,
    num_candidates: usize,
    result_fields: Vec<String>,
}

struct Scored {
    score: f64,
    document: Document,
}

impl VectorSearch {
    #[inline]
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            embedding_field: config.embedding_field.clone(),
            num_candidates: config.num_candidates,
            result_fields: config.result_fields.clone(),
        }
    }

    #[inline]
    pub fn embedding_field(&self) -> &str {
        &self.embedding_field
    }

    /// Top `k` documents by similarity to `query`, best first.
    ///
    /// At most `num_candidates` documents carrying the embedding field are
    /// read, in store order. Those without a usable embedding of the query's
    /// dimension count as candidates but are not scored.
    #[inline]
    pub fn search<S>(&self, store: &S, query: &[f32], k: usize) -> Result<ResultTable, QueryError>
    where
        S: DocumentStore + ?Sized,
    {
        if query.is_empty() {
            return Err(QueryError::InvalidSpec(
                "query vector cannot be empty".to_string(),
            ));
        }
        if k == 0 {
            return Err(QueryError::InvalidSpec(
                "k must be greater than zero".to_string(),
            ));
        }

        let query: Vec<f64> = query.iter().copied().map(f64::from).collect();
        let query_norm = norm(&query);
        if query_norm == 0.0 {
            return Err(QueryError::InvalidSpec(
                "query vector has zero magnitude".to_string(),
            ));
        }

        let projection = self.projection();
        let cursor = store.find(&Filter::new(), projection.as_ref())?;

        let mut scored = Vec::new();
        let mut candidates = 0_usize;
        let mut skipped = 0_usize;
        for document in cursor {
            if candidates >= self.num_candidates {
                break;
            }

            let document = document?;
            let Some(embedding) = get_path(&document, &self.embedding_field) else {
                continue;
            };
            candidates += 1;

            match embedding_vector(embedding, query.len()) {
                Some(vector) => {
                    let vector_norm = norm(&vector);
                    if vector_norm == 0.0 {
                        skipped += 1;
                        continue;
                    }
                    let cosine = dot(&query, &vector) / (query_norm * vector_norm);
                    scored.push(Scored {
                        score: (1.0 + cosine) / 2.0,
                        document,
                    });
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(
                "Skipped {} documents with unusable '{}' values",
                skipped, self.embedding_field
            );
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        debug!("Vector search returned {} results (k = {})", scored.len(), k);

        Ok(scored
            .into_iter()
            .map(|hit| flatten(&self.result_row(hit)))
            .collect())
    }

    fn projection(&self) -> Option<Projection> {
        if self.result_fields.is_empty() {
            return None;
        }

        let mut fields: Projection = self.result_fields.iter().cloned().collect();
        fields.insert(self.embedding_field.clone());
        Some(fields)
    }

    fn result_row(&self, hit: Scored) -> Document {
        let mut row = Document::new();
        row.insert(SCORE_FIELD.to_string(), Value::from(hit.score));

        if self.result_fields.is_empty() {
            for (key, value) in hit.document {
                if key != ID_FIELD && key != self.embedding_field {
                    row.insert(key, value);
                }
            }
        } else {
            for field in &self.result_fields {
                if let Some(value) = get_path(&hit.document, field) {
                    set_path(&mut row, field, value.clone());
                }
            }
        }

        row
    }
}

fn embedding_vector(value: &Value, dimension: usize) -> Option<Vec<f64>> {
    let Value::Array(items) = value else {
        return None;
    };
    if items.len() != dimension {
        return None;
    }
    items.iter().map(Value::as_f64).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).fold(0.0, |acc, (x, y)| x.mul_add(*y, acc))
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}
