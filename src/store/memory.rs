use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use super::matcher::Matcher;
use super::ordering::values_equal;
use super::path::get_path;
use super::{
    Document, DocumentCursor, DocumentStore, Filter, ID_FIELD, Projection, StoreError,
    StoreResult,
};

/// A collection held entirely in memory, persisted as a JSON array or as
/// JSON Lines (chosen by a `.jsonl` extension).
#[derive(Debug, Clone)]
pub struct MemoryStore {
    documents: Vec<Document>,
    next_id: i64,
    taken_ids: HashSet<i64>,
}

impl Default for MemoryStore {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[inline]
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            next_id: 1,
            taken_ids: HashSet::new(),
        }
    }

    /// Build a store from existing documents. Explicit integer ids are
    /// reserved before any new id is assigned.
    #[inline]
    pub fn from_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let documents: Vec<Document> = documents.into_iter().collect();
        let mut store = Self::new();
        for id in documents.iter().filter_map(|d| d.get(ID_FIELD)?.as_i64()) {
            store.reserve_id(id);
        }
        for document in documents {
            store.insert(document);
        }
        store
    }

    /// Insert a document, assigning the next free integer `_id` when it has
    /// none. Returns the document's id.
    #[inline]
    pub fn insert(&mut self, mut document: Document) -> Value {
        let id = match document.get(ID_FIELD) {
            Some(id) => {
                if let Some(n) = id.as_i64() {
                    self.reserve_id(n);
                }
                id.clone()
            }
            None => {
                let id = Value::from(self.allocate_id());
                let mut with_id = Map::with_capacity(document.len() + 1);
                with_id.insert(ID_FIELD.to_string(), id.clone());
                with_id.append(&mut document);
                document = with_id;
                id
            }
        };

        self.documents.push(document);
        id
    }

    fn reserve_id(&mut self, id: i64) {
        self.taken_ids.insert(id);
        if let Some(next) = id.checked_add(1) {
            self.next_id = self.next_id.max(next);
        }
    }

    // Wraps back to 1 past i64::MAX and skips ids already in use.
    fn allocate_id(&mut self) -> i64 {
        loop {
            let candidate = self.next_id;
            self.next_id = candidate.checked_add(1).unwrap_or(1);
            if self.taken_ids.insert(candidate) {
                return candidate;
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    #[inline]
    pub fn documents_mut(&mut self) -> &mut [Document] {
        &mut self.documents
    }

    /// Load a collection file.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::Unavailable(format!(
                "collection file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let values: Vec<Value> = if is_json_lines(path) {
            content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str)
                .collect::<Result<_, _>>()?
        } else if content.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&content)?
        };

        let mut documents = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match value {
                Value::Object(document) => documents.push(document),
                other => {
                    return Err(StoreError::InvalidDocument(format!(
                        "entry {} in {} is not an object: {}",
                        index,
                        path.display(),
                        other
                    )));
                }
            }
        }

        let store = Self::from_documents(documents);
        info!("Loaded {} documents from {}", store.len(), path.display());
        Ok(store)
    }

    /// Write the collection back to disk in the format implied by the path.
    #[inline]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> StoreResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(fs::File::create(path)?);
        if is_json_lines(path) {
            for document in &self.documents {
                serde_json::to_writer(&mut writer, document)?;
                writer.write_all(b"\n")?;
            }
        } else {
            serde_json::to_writer_pretty(&mut writer, &self.documents)?;
        }
        writer.flush()?;

        debug!("Saved {} documents to {}", self.len(), path.display());
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    #[inline]
    fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> StoreResult<DocumentCursor<'_>> {
        let matcher = Matcher::compile(filter)?;

        Ok(DocumentCursor::new(
            self.documents
                .iter()
                .filter(move |document| matcher.matches(document))
                .map(|document| Ok(document.clone())),
        )
        .with_projection(projection))
    }

    #[inline]
    fn distinct_values(&self, field: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        let matcher = Matcher::compile(filter)?;
        let mut values: Vec<Value> = Vec::new();

        let mut remember = |value: &Value| {
            if !values.iter().any(|seen| values_equal(seen, value)) {
                values.push(value.clone());
            }
        };

        for document in self.documents.iter().filter(|d| matcher.matches(d)) {
            match get_path(document, field) {
                None => {}
                Some(Value::Array(items)) => items.iter().for_each(&mut remember),
                Some(value) => remember(value),
            }
        }

        debug!("Found {} distinct values for '{}'", values.len(), field);
        Ok(values)
    }
}

fn is_json_lines(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"))
}
