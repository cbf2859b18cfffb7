//! # Predicate Building
//!
//! Filter and free-text search conditions.
//!
//! Filtering picks a comparison per value:
//!
//! | value                       | scalar            | list item         |
//! |-----------------------------|-------------------|-------------------|
//! | parses as a finite number   | `= number`        | `= number`        |
//! | enum column                 | `= raw`           | `= raw`           |
//! | uuid column                 | `= raw`           | `ILIKE %raw%`     |
//! | anything else               | `ILIKE %raw%`     | `ILIKE %raw%`     |
//!
//! Every item of a list becomes its own condition and all of them must
//! hold. Keys that are not columns of the entity are skipped.

use serde_json::{Map, Number, Value};

use super::builder::{ColumnRef, CompareOp, Condition, SelectQuery};
use crate::metadata::{Comparison, EntityMetadata};

/// Name of the bound search parameter
pub const SEARCH_PARAM: &str = "search";

/// AND one condition group per filter key that names a column.
///
/// Returns the keys that were skipped.
pub fn apply_filter(
    query: &mut SelectQuery,
    filters: &Map<String, Value>,
    metadata: &EntityMetadata,
) -> Vec<String> {
    let mut skipped = Vec::new();

    for (key, value) in filters {
        let column = match metadata.column(key) {
            Some(column) if !value.is_null() => column,
            _ => {
                skipped.push(key.clone());
                continue;
            }
        };
        let comparison = column.comparison();
        let target = query.column(key);

        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    continue;
                }
                let mut group = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let param = format!("{}_{}", key, idx);
                    let (op, bound) = list_item_comparison(item, comparison);
                    query.set_parameter(param.clone(), bound);
                    group.push(Condition::compare(target.clone(), op, param));
                }
                query.and_where(Condition::All(group));
            }
            scalar => {
                let (op, bound) = scalar_comparison(scalar, comparison);
                query.set_parameter(key.clone(), bound);
                query.and_where(Condition::compare(target, op, key.clone()));
            }
        }
    }

    skipped
}

/// OR a `LIKE %term%` over every listed column that exists.
///
/// No-op for an empty term, an empty column list, or when none of the
/// columns exist.
pub fn apply_search<S: AsRef<str>>(
    query: &mut SelectQuery,
    term: &str,
    columns: &[S],
    metadata: &EntityMetadata,
) {
    if term.is_empty() || columns.is_empty() {
        return;
    }

    let targets: Vec<ColumnRef> = columns
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| metadata.has_column(name))
        .map(|name| query.column(name))
        .collect();

    if targets.is_empty() {
        return;
    }

    query.set_parameter(SEARCH_PARAM, Value::String(contains_pattern(term)));
    query.and_where(Condition::Any(
        targets
            .into_iter()
            .map(|column| Condition::compare(column, CompareOp::Like, SEARCH_PARAM))
            .collect(),
    ));
}

fn scalar_comparison(value: &Value, comparison: Comparison) -> (CompareOp, Value) {
    if let Some(n) = numeric_value(value) {
        return (CompareOp::Eq, numeric_bound(n));
    }
    match comparison {
        Comparison::Enum | Comparison::Uuid => (CompareOp::Eq, Value::String(text_of(value))),
        Comparison::Text => (
            CompareOp::ILike,
            Value::String(contains_pattern(&text_of(value))),
        ),
    }
}

fn list_item_comparison(item: &Value, comparison: Comparison) -> (CompareOp, Value) {
    if let Some(n) = numeric_value(item) {
        return (CompareOp::Eq, numeric_bound(n));
    }
    match comparison {
        Comparison::Enum => (CompareOp::Eq, Value::String(text_of(item))),
        Comparison::Uuid | Comparison::Text => (
            CompareOp::ILike,
            Value::String(contains_pattern(&text_of(item))),
        ),
    }
}

/// The value as a finite number, if it is one or is text that parses as one
pub fn numeric_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Bind a parsed number, as an integer when it is one
pub(crate) fn numeric_bound(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn contains_pattern(raw: &str) -> String {
    format!("%{}%", raw)
}
