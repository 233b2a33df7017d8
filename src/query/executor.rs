use tracing::debug;

use super::{QueryError, QueryMode, QuerySpec, ResultTable, flatten};
use crate::store::{Document, DocumentStore, ID_FIELD};

/// Run a spec against a store and flatten the result.
///
/// The spec is validated before any store call. Store failures surface as
/// [`QueryError::StoreUnavailable`] and no partial table is returned.
#[inline]
pub fn execute<S>(spec: &QuerySpec, store: &S) -> Result<ResultTable, QueryError>
where
    S: DocumentStore + ?Sized,
{
    spec.validate()?;

    match spec.mode {
        QueryMode::Distinct => run_distinct(spec, store),
        QueryMode::Find => run_find(spec, store),
    }
}

fn run_distinct<S>(spec: &QuerySpec, store: &S) -> Result<ResultTable, QueryError>
where
    S: DocumentStore + ?Sized,
{
    let field = spec.distinct_field()?;
    let values = store.distinct_values(field, &spec.filter)?;
    debug!("Distinct '{}' returned {} values", field, values.len());
    Ok(ResultTable::single_column(field, values))
}

fn run_find<S>(spec: &QuerySpec, store: &S) -> Result<ResultTable, QueryError>
where
    S: DocumentStore + ?Sized,
{
    let limit = spec.effective_limit()?;

    let mut cursor = store.find(&spec.filter, spec.projection.as_ref())?;
    if let Some(sort) = &spec.sort {
        cursor = cursor.sort(&sort.field, sort.direction);
    }

    let rows = cursor
        .limit(limit)
        .map(|document| document.map(|d| flatten(&without_id(d))))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Find returned {} rows (limit {})", rows.len(), limit);
    Ok(ResultTable::new(rows))
}

fn without_id(mut document: Document) -> Document {
    document.shift_remove(ID_FIELD);
    document
}
