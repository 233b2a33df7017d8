use itertools::Itertools;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One result row keyed by dotted column path.
pub type FlatRow = Map<String, Value>;

/// Ordered rows, not necessarily sharing the same columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    rows: Vec<FlatRow>,
}

impl ResultTable {
    #[inline]
    pub fn new(rows: Vec<FlatRow>) -> Self {
        Self { rows }
    }

    /// A single-column table, one row per value.
    #[inline]
    pub fn single_column(column: &str, values: Vec<Value>) -> Self {
        values
            .into_iter()
            .map(|value| {
                let mut row = FlatRow::with_capacity(1);
                row.insert(column.to_string(), value);
                row
            })
            .collect()
    }

    #[inline]
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    #[inline]
    pub fn into_rows(self) -> Vec<FlatRow> {
        self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of all row keys, in the order they are first seen.
    #[inline]
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .unique()
            .collect()
    }

    /// Values of one column, `None` where a row lacks it.
    #[inline]
    pub fn column(&self, name: &str) -> Vec<Option<&Value>> {
        self.rows.iter().map(|row| row.get(name)).collect()
    }
}

impl FromIterator<FlatRow> for ResultTable {
    #[inline]
    fn from_iter<I: IntoIterator<Item = FlatRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.replace('\n', " "),
        Some(other) => other.to_string(),
    }
}

/// Plain-text grid with a header row. Missing cells are left blank.
impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "(no rows)");
        }

        let columns = self.columns();
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| columns.iter().map(|c| render_cell(row.get(*c))).collect())
            .collect();

        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |f: &mut fmt::Formatter<'_>, values: &[&str]| -> fmt::Result {
            let padded = values
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{:<width$}", value, width = *width))
                .join(" | ");
            writeln!(f, "{}", padded.trim_end())
        };

        line(f, &columns)?;
        writeln!(
            f,
            "{}",
            widths.iter().map(|width| "-".repeat(*width)).join("-+-")
        )?;
        for row in &cells {
            let values: Vec<&str> = row.iter().map(String::as_str).collect();
            line(f, &values)?;
        }

        Ok(())
    }
}
