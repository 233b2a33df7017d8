//! Translating user-supplied JSON into a validated [`QuerySpec`].
//!
//! Requests look like the ones a chat front end produces:
//!
//! ```json
//! {"mode": "find", "filter": {"city": "Pune"}, "projection": ["name"],
//!  "sort": {"field": "name", "direction": 1}, "limit": 20}
//! ```
//!
//! Every field a request mentions is checked against a [`FieldPolicy`]
//! safe-list before a spec is produced.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

use crate::query::{DEFAULT_LIMIT, QueryError, QueryMode, QuerySpec, SortSpec};
use crate::store::path::PATH_SEPARATOR;
use crate::store::{Filter, Projection};

/// Fields structured queries may reference when nothing else is configured.
pub const DEFAULT_ALLOWED_FIELDS: &[&str] = &[
    "_id",
    "leadId",
    "name",
    "phone",
    "email",
    "city",
    "pincode",
    "crmStage",
    "telecallerName",
    "telecaller.name",
    "role",
    "createdAt",
    "modifiedAt",
    "notes",
    "remarks",
    "description",
    "content",
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub mode: QueryMode,
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub projection: Option<ProjectionInput>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub distinct_field: Option<String>,
}

/// Either a list of field names or a `{field: 1}` inclusion document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProjectionInput {
    Fields(Vec<String>),
    Document(Map<String, Value>),
}

/// Safe-list of queryable fields plus the row cap used for unset limits.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPolicy {
    allowed: BTreeSet<String>,
    default_limit: usize,
}

impl Default for FieldPolicy {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_FIELDS.iter().copied(), DEFAULT_LIMIT)
    }
}

impl FieldPolicy {
    #[inline]
    pub fn new<I, S>(allowed: I, default_limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            default_limit,
        }
    }

    /// A policy that lets every field through.
    #[inline]
    pub fn permissive(default_limit: usize) -> Self {
        Self::new(std::iter::empty::<String>(), default_limit)
    }

    /// A field is allowed when it, or any dotted ancestor of it, is listed.
    /// An empty safe-list allows everything.
    #[inline]
    pub fn is_allowed(&self, field: &str) -> bool {
        if self.allowed.is_empty() || self.allowed.contains(field) {
            return true;
        }

        field
            .match_indices(PATH_SEPARATOR)
            .any(|(index, _)| field.get(..index).is_some_and(|p| self.allowed.contains(p)))
    }

    fn check(&self, field: &str) -> Result<(), QueryError> {
        if self.is_allowed(field) {
            Ok(())
        } else {
            Err(QueryError::FieldNotAllowed(field.to_string()))
        }
    }

    fn check_filter(&self, filter: &Filter) -> Result<(), QueryError> {
        for (key, value) in filter {
            match key.as_str() {
                "$and" | "$or" => {
                    if let Value::Array(branches) = value {
                        for branch in branches {
                            if let Value::Object(branch) = branch {
                                self.check_filter(branch)?;
                            }
                        }
                    }
                }
                operator if operator.starts_with('$') => {}
                field => self.check(field)?,
            }
        }
        Ok(())
    }
}

impl QueryRequest {
    #[inline]
    pub fn parse(json: &str) -> Result<Self, QueryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate against `policy` and build the query spec.
    ///
    /// A missing or zero limit becomes the policy's default limit.
    #[inline]
    pub fn into_spec(self, policy: &FieldPolicy) -> Result<QuerySpec, QueryError> {
        let filter = self.filter.unwrap_or_default();
        policy.check_filter(&filter)?;

        let projection = self.projection.map(projection_fields).transpose()?;
        if let Some(fields) = &projection {
            for field in fields {
                policy.check(field)?;
            }
        }

        if let Some(sort) = &self.sort {
            policy.check(&sort.field)?;
        }

        if self.mode == QueryMode::Distinct {
            if let Some(field) = &self.distinct_field {
                policy.check(field)?;
            }
        }

        let limit = match self.limit {
            None | Some(0) => Some(i64::try_from(policy.default_limit).unwrap_or(i64::MAX)),
            other => other,
        };

        let spec = QuerySpec {
            mode: self.mode,
            filter,
            projection,
            sort: self.sort,
            limit,
            distinct_field: self.distinct_field,
        };
        spec.validate()?;

        debug!("Built {:?} query spec", spec.mode);
        Ok(spec)
    }
}

fn projection_fields(input: ProjectionInput) -> Result<Projection, QueryError> {
    match input {
        ProjectionInput::Fields(fields) => Ok(fields.into_iter().collect()),
        ProjectionInput::Document(document) => {
            let mut fields = Projection::new();
            for (field, flag) in document {
                let include = match &flag {
                    Value::Bool(b) => *b,
                    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                    _ => {
                        return Err(QueryError::InvalidSpec(format!(
                            "projection value for '{}' must be 0/1 or a boolean",
                            field
                        )));
                    }
                };

                if include {
                    fields.insert(field);
                } else if field != crate::store::ID_FIELD {
                    return Err(QueryError::InvalidSpec(format!(
                        "exclusion projections are not supported ('{}')",
                        field
                    )));
                }
            }
            Ok(fields)
        }
    }
}
