//! Filter compilation and evaluation for the in-memory store.
//!
//! Filters use the familiar document-database shape: a mapping from dotted
//! field paths to either a literal (equality) or an operator document such as
//! `{"$gte": 10}`. Top-level `$and` / `$or` combine sub-filters. All top-level
//! clauses must hold.

use fancy_regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::debug;

use super::ordering::{compare_values, kind_rank, values_equal};
use super::path::get_path;
use super::{Document, Filter, StoreError, StoreResult};

/// A filter compiled once per `find` / `distinct_values` call.
#[derive(Debug)]
pub struct Matcher {
    clauses: Vec<Clause>,
}

#[derive(Debug)]
enum Clause {
    Field {
        path: String,
        conditions: Vec<Condition>,
    },
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
}

#[derive(Debug)]
enum Condition {
    Eq(Value),
    Ne(Value),
    Cmp(Ordering, bool, Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Regex(Regex),
}

impl Matcher {
    /// Compile a filter. An empty filter matches every document.
    #[inline]
    pub fn compile(filter: &Filter) -> StoreResult<Self> {
        let mut clauses = Vec::with_capacity(filter.len());

        for (key, value) in filter {
            let clause = match key.as_str() {
                "$and" => Clause::And(compile_branches(key, value)?),
                "$or" => Clause::Or(compile_branches(key, value)?),
                other if other.starts_with('$') => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unsupported top-level operator '{}'",
                        other
                    )));
                }
                path => Clause::Field {
                    path: path.to_string(),
                    conditions: compile_conditions(path, value)?,
                },
            };
            clauses.push(clause);
        }

        debug!("Compiled filter with {} clauses", clauses.len());
        Ok(Self { clauses })
    }

    #[inline]
    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|clause| clause.matches(document))
    }
}

impl Clause {
    fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Field { path, conditions } => {
                let actual = get_path(document, path);
                conditions.iter().all(|c| c.matches(actual))
            }
            Self::And(branches) => branches.iter().all(|m| m.matches(document)),
            Self::Or(branches) => branches.iter().any(|m| m.matches(document)),
        }
    }
}

impl Condition {
    fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            Self::Eq(expected) => eq_matches(actual, expected),
            Self::Ne(expected) => !eq_matches(actual, expected),
            Self::Cmp(target, or_equal, bound) => {
                any_element(actual, |v| {
                    if kind_rank(v) != kind_rank(bound) {
                        return false;
                    }
                    let ordering = compare_values(v, bound);
                    ordering == *target || (*or_equal && ordering == Ordering::Equal)
                })
            }
            Self::In(candidates) => candidates.iter().any(|c| eq_matches(actual, c)),
            Self::Nin(candidates) => !candidates.iter().any(|c| eq_matches(actual, c)),
            Self::Exists(expected) => actual.is_some() == *expected,
            Self::Regex(regex) => any_element(actual, |v| {
                v.as_str()
                    .is_some_and(|s| regex.is_match(s).unwrap_or(false))
            }),
        }
    }
}

/// Equality, where a missing field equals `null` and an array field matches
/// when any element equals the expected scalar.
fn eq_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn any_element(actual: Option<&Value>, predicate: impl Fn(&Value) -> bool) -> bool {
    match actual {
        None => false,
        Some(Value::Array(items)) => items.iter().any(predicate),
        Some(value) => predicate(value),
    }
}

fn compile_branches(operator: &str, value: &Value) -> StoreResult<Vec<Matcher>> {
    let Value::Array(branches) = value else {
        return Err(StoreError::InvalidFilter(format!(
            "'{}' expects an array of filters",
            operator
        )));
    };
    if branches.is_empty() {
        return Err(StoreError::InvalidFilter(format!(
            "'{}' needs at least one filter",
            operator
        )));
    }

    branches
        .iter()
        .map(|branch| match branch {
            Value::Object(filter) => Matcher::compile(filter),
            _ => Err(StoreError::InvalidFilter(format!(
                "'{}' entries must be objects",
                operator
            ))),
        })
        .collect()
}

fn compile_conditions(path: &str, value: &Value) -> StoreResult<Vec<Condition>> {
    let operators = match value {
        Value::Object(map) if map.keys().any(|k| k.starts_with('$')) => map,
        _ => return Ok(vec![Condition::Eq(value.clone())]),
    };

    if let Some(plain) = operators.keys().find(|k| !k.starts_with('$')) {
        return Err(StoreError::InvalidFilter(format!(
            "field '{}' mixes operators with plain key '{}'",
            path, plain
        )));
    }

    let mut conditions = Vec::with_capacity(operators.len());
    for (operator, operand) in operators {
        let condition = match operator.as_str() {
            "$eq" => Condition::Eq(operand.clone()),
            "$ne" => Condition::Ne(operand.clone()),
            "$gt" => Condition::Cmp(Ordering::Greater, false, operand.clone()),
            "$gte" => Condition::Cmp(Ordering::Greater, true, operand.clone()),
            "$lt" => Condition::Cmp(Ordering::Less, false, operand.clone()),
            "$lte" => Condition::Cmp(Ordering::Less, true, operand.clone()),
            "$in" => Condition::In(operand_list(path, operator, operand)?),
            "$nin" => Condition::Nin(operand_list(path, operator, operand)?),
            "$exists" => Condition::Exists(truthy(operand)),
            "$regex" => Condition::Regex(compile_regex(path, operand, operators.get("$options"))?),
            "$options" => {
                if !operators.contains_key("$regex") {
                    return Err(StoreError::InvalidFilter(format!(
                        "'$options' on '{}' requires '$regex'",
                        path
                    )));
                }
                continue;
            }
            other => {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported operator '{}' on field '{}'",
                    other, path
                )));
            }
        };
        conditions.push(condition);
    }

    Ok(conditions)
}

fn operand_list(path: &str, operator: &str, operand: &Value) -> StoreResult<Vec<Value>> {
    match operand {
        Value::Array(items) => Ok(items.clone()),
        _ => Err(StoreError::InvalidFilter(format!(
            "'{}' on '{}' expects an array",
            operator, path
        ))),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

fn compile_regex(path: &str, pattern: &Value, options: Option<&Value>) -> StoreResult<Regex> {
    let Some(pattern) = pattern.as_str() else {
        return Err(StoreError::InvalidFilter(format!(
            "'$regex' on '{}' expects a string",
            path
        )));
    };

    let mut flags = String::new();
    if let Some(options) = options {
        let Some(options) = options.as_str() else {
            return Err(StoreError::InvalidFilter(format!(
                "'$options' on '{}' expects a string",
                path
            )));
        };
        for flag in options.chars() {
            match flag {
                'i' | 'm' | 's' | 'x' => flags.push(flag),
                other => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unsupported regex option '{}' on '{}'",
                        other, path
                    )));
                }
            }
        }
    }

    let source = if flags.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{}){}", flags, pattern)
    };

    Regex::new(&source)
        .map_err(|e| StoreError::InvalidFilter(format!("bad regex on '{}': {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn matches(filter: Value, document: Value) -> bool {
        Matcher::compile(&object(filter))
            .expect("filter should compile")
            .matches(&object(document))
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(json!({}), json!({"name": "Ana"})));
    }

    #[test]
    fn literal_equality_and_nested_paths() {
        let lead = json!({"city": "Pune", "telecaller": {"name": "Raj"}});
        assert!(matches(json!({"city": "Pune"}), lead.clone()));
        assert!(matches(json!({"telecaller.name": "Raj"}), lead.clone()));
        assert!(!matches(json!({"city": "Delhi"}), lead.clone()));
        assert!(matches(json!({"pincode": null}), lead));
    }

    #[test]
    fn array_fields_match_any_element() {
        let lead = json!({"tags": ["hot", "callback"]});
        assert!(matches(json!({"tags": "hot"}), lead.clone()));
        assert!(matches(json!({"tags": {"$in": ["cold", "callback"]}}), lead.clone()));
        assert!(!matches(json!({"tags": {"$nin": ["hot"]}}), lead));
    }

    #[test]
    fn comparisons_stay_within_kind() {
        let lead = json!({"score": 42, "stage": "B"});
        assert!(matches(json!({"score": {"$gte": 42, "$lt": 50}}), lead.clone()));
        assert!(!matches(json!({"score": {"$gt": 42}}), lead.clone()));
        assert!(!matches(json!({"score": {"$gt": "10"}}), lead.clone()));
        assert!(matches(json!({"stage": {"$lte": "C"}}), lead));
    }

    #[test]
    fn exists_and_ne() {
        let lead = json!({"email": "a@b.c"});
        assert!(matches(json!({"email": {"$exists": true}}), lead.clone()));
        assert!(matches(json!({"phone": {"$exists": 0}}), lead.clone()));
        assert!(matches(json!({"email": {"$ne": "x@y.z"}}), lead));
    }

    #[test]
    fn regex_with_options() {
        let lead = json!({"name": "Ananya"});
        assert!(matches(json!({"name": {"$regex": "^ana", "$options": "i"}}), lead.clone()));
        assert!(!matches(json!({"name": {"$regex": "^ana"}}), lead));
    }

    #[test]
    fn logical_combinators() {
        let lead = json!({"city": "Pune", "crmStage": "won"});
        assert!(matches(
            json!({"$or": [{"city": "Delhi"}, {"crmStage": "won"}]}),
            lead.clone()
        ));
        assert!(!matches(
            json!({"$and": [{"city": "Pune"}, {"crmStage": "lost"}]}),
            lead
        ));
    }

    #[test]
    fn plain_object_is_literal_equality() {
        let lead = json!({"telecaller": {"name": "Raj"}});
        assert!(matches(json!({"telecaller": {"name": "Raj"}}), lead.clone()));
        assert!(!matches(json!({"telecaller": {}}), lead));
    }

    #[test]
    fn invalid_filters_are_rejected() {
        for filter in [
            json!({"$nor": []}),
            json!({"$or": {}}),
            json!({"$or": []}),
            json!({"age": {"$between": [1, 2]}}),
            json!({"age": {"$in": 3}}),
            json!({"name": {"$regex": "("}}),
            json!({"name": {"$options": "i"}}),
            json!({"score": {"$gt": 1, "x": 2}}),
            json!({"telecaller": {"name": "Raj", "$exists": true}}),
        ] {
            let result = Matcher::compile(&object(filter.clone()));
            assert!(
                matches!(result, Err(StoreError::InvalidFilter(_))),
                "filter {} should be rejected",
                filter
            );
        }
    }
}
