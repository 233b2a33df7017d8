use serde::{Deserialize, Serialize};

use super::QueryError;
use crate::store::{Filter, Projection, SortDirection};

/// Row cap applied when a find query sets no limit (or a limit of zero).
pub const DEFAULT_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Find,
    Distinct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    #[inline]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// A single structured request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub mode: QueryMode,
    pub filter: Filter,
    pub projection: Option<Projection>,
    pub sort: Option<SortSpec>,
    pub limit: Option<i64>,
    pub distinct_field: Option<String>,
}

impl QuerySpec {
    #[inline]
    pub fn find() -> Self {
        Self::default()
    }

    #[inline]
    pub fn distinct(field: impl Into<String>) -> Self {
        Self {
            mode: QueryMode::Distinct,
            distinct_field: Some(field.into()),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec::new(field, direction));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check the query spec without touching any store.
    #[inline]
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.mode == QueryMode::Distinct {
            self.distinct_field()?;
        }

        if let Some(sort) = &self.sort {
            if sort.field.trim().is_empty() {
                return Err(QueryError::InvalidSpec(
                    "sort field cannot be empty".to_string(),
                ));
            }
        }

        if let Some(projection) = &self.projection {
            if projection.iter().any(|field| field.trim().is_empty()) {
                return Err(QueryError::InvalidSpec(
                    "projection fields cannot be empty".to_string(),
                ));
            }
        }

        self.effective_limit()?;
        Ok(())
    }

    /// The field a distinct query reads, required to be non-blank.
    #[inline]
    pub fn distinct_field(&self) -> Result<&str, QueryError> {
        self.distinct_field
            .as_deref()
            .filter(|field| !field.trim().is_empty())
            .ok_or_else(|| {
                QueryError::InvalidSpec("distinct queries need a distinctField".to_string())
            })
    }

    /// Unset or zero means [`DEFAULT_LIMIT`]; a negative limit is rejected.
    #[inline]
    pub fn effective_limit(&self) -> Result<usize, QueryError> {
        match self.limit {
            None | Some(0) => Ok(DEFAULT_LIMIT),
            Some(limit) if limit < 0 => Err(QueryError::InvalidSpec(format!(
                "limit must not be negative, got {}",
                limit
            ))),
            Some(limit) => usize::try_from(limit)
                .map_err(|_| QueryError::InvalidSpec(format!("limit {} is too large", limit))),
        }
    }
}
