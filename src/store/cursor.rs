use serde::{Deserialize, Serialize};

use super::ordering::compare_optional;
use super::path::{get_path, project};
use super::{Document, Projection, StoreResult};

/// Sort direction. Deserializes from the numeric convention used by
/// document databases: any value `>= 0` is ascending, negative is descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl From<i64> for SortDirection {
    #[inline]
    fn from(direction: i64) -> Self {
        if direction >= 0 {
            Self::Ascending
        } else {
            Self::Descending
        }
    }
}

impl From<SortDirection> for i64 {
    #[inline]
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// Lazy sequence of documents returned by [`super::DocumentStore::find`].
///
/// `sort` and `limit` compose on top of `find`. Sorting has to materialize the
/// sequence; limiting stays lazy. Errors are yielded in place and a failed
/// sort yields the first error it saw.
///
/// The projection is applied as documents are yielded, so sorting can use
/// fields the projection leaves out.
pub struct DocumentCursor<'a> {
    inner: Box<dyn Iterator<Item = StoreResult<Document>> + 'a>,
    projection: Option<Vec<String>>,
}

impl<'a> DocumentCursor<'a> {
    #[inline]
    pub fn new<I>(documents: I) -> Self
    where
        I: Iterator<Item = StoreResult<Document>> + 'a,
    {
        Self {
            inner: Box::new(documents),
            projection: None,
        }
    }

    #[inline]
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self::new(documents.into_iter().map(Ok))
    }

    /// Restrict yielded documents to `projection`. The identifier is always kept.
    #[inline]
    #[must_use]
    pub fn with_projection(mut self, projection: Option<&Projection>) -> Self {
        self.projection = projection.map(|fields| fields.iter().cloned().collect());
        self
    }

    /// Stable sort by a dotted field. Documents without the field sort as the
    /// smallest possible value.
    #[inline]
    #[must_use]
    pub fn sort(self, field: &str, direction: SortDirection) -> Self {
        let projection = self.projection;
        let mut documents = match self.inner.collect::<StoreResult<Vec<Document>>>() {
            Ok(documents) => documents,
            Err(e) => return Self::new(std::iter::once(Err(e))).with_paths(projection),
        };

        documents.sort_by(|a, b| {
            let ordering = compare_optional(get_path(a, field), get_path(b, field));
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        Self::from_documents(documents).with_paths(projection)
    }

    #[inline]
    #[must_use]
    pub fn limit(self, limit: usize) -> Self {
        let projection = self.projection;
        Self::new(self.inner.take(limit)).with_paths(projection)
    }

    fn with_paths(mut self, projection: Option<Vec<String>>) -> Self {
        self.projection = projection;
        self
    }
}

impl Iterator for DocumentCursor<'_> {
    type Item = StoreResult<Document>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let document = self.inner.next()?;
        Some(match &self.projection {
            Some(paths) => document.map(|document| project(&document, paths)),
            None => document,
        })
    }
}

impl std::fmt::Debug for DocumentCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCursor")
            .field("projection", &self.projection)
            .finish_non_exhaustive()
    }
}
