//! In-memory relational store
//!
//! Tables of JSON object rows with column and relation metadata. Executes
//! a [`SelectQuery`] the way a SQL database would: left joins nest related
//! rows under the relation name, conditions are evaluated per row, the
//! count is taken before skip/take, and sorting is stable.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::DateTime;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::{Store, StoreError, StoreResult};
use crate::metadata::{ColumnKind, EntityMetadata, MetadataProvider, RelationDescriptor};
use crate::query::{ColumnRef, CompareOp, Condition, SelectQuery, SortDirection};

/// One table: metadata plus rows in insertion order
#[derive(Debug, Clone)]
pub struct MemoryTable {
    metadata: Arc<EntityMetadata>,
    rows: Vec<Value>,
}

impl MemoryTable {
    pub fn new(metadata: EntityMetadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Value>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn metadata(&self) -> &Arc<EntityMetadata> {
        &self.metadata
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }
}

/// Thread-safe in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryStore::insert_table`]
    pub fn with_table(self, table: MemoryTable) -> Self {
        self.insert_table(table);
        self
    }

    /// Add or replace a table
    pub fn insert_table(&self, table: MemoryTable) {
        let mut tables = match self.tables.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tables.insert(table.name().to_string(), table);
    }

    /// Append a row to an existing table
    pub fn insert_row(&self, entity: &str, row: Value) -> StoreResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".to_string()))?;
        let table = tables
            .get_mut(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        table.rows.push(row);
        Ok(())
    }

    /// Entity names, sorted
    pub fn entities(&self) -> Vec<String> {
        let tables = match self.tables.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        names
    }
}

impl MetadataProvider for MemoryStore {
    fn metadata(&self, entity: &str) -> StoreResult<Arc<EntityMetadata>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".to_string()))?;
        tables
            .get(entity)
            .map(|t| Arc::clone(&t.metadata))
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))
    }
}

impl Store for MemoryStore {
    fn fetch_and_count(&self, query: &SelectQuery) -> StoreResult<(Vec<Value>, u64)> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".to_string()))?;

        let base = tables
            .get(query.entity())
            .ok_or_else(|| StoreError::UnknownEntity(query.entity().to_string()))?;

        let mut aliases = HashMap::new();
        aliases.insert(
            query.alias().to_string(),
            AliasPath {
                entity: base.name().to_string(),
                path: Vec::new(),
            },
        );

        let mut rows = base.rows.clone();

        // Joins
        for join in query.joins() {
            if aliases.contains_key(&join.alias) {
                return Err(StoreError::DuplicateAlias(join.alias.clone()));
            }
            let parent = aliases
                .get(&join.parent)
                .ok_or_else(|| StoreError::UnknownAlias(join.parent.clone()))?
                .clone();
            let parent_table = tables
                .get(&parent.entity)
                .ok_or_else(|| StoreError::UnknownEntity(parent.entity.clone()))?;
            let relation = parent_table.metadata.relation(&join.relation).ok_or_else(|| {
                StoreError::UnknownRelation {
                    entity: parent.entity.clone(),
                    relation: join.relation.clone(),
                }
            })?;
            let target = tables
                .get(&relation.target)
                .ok_or_else(|| StoreError::UnknownEntity(relation.target.clone()))?;

            for row in rows.iter_mut() {
                attach(row, &parent.path, relation, &target.rows);
            }

            let mut path = parent.path;
            path.push(relation.name.clone());
            aliases.insert(
                join.alias.clone(),
                AliasPath {
                    entity: relation.target.clone(),
                    path,
                },
            );
        }

        // Conditions
        let matchers = query
            .conditions()
            .iter()
            .map(|c| compile(c, query, &aliases, &tables))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut rows: Vec<Value> = rows
            .into_iter()
            .filter(|row| matchers.iter().all(|m| m.matches(row)))
            .collect();

        let total = rows.len() as u64;

        // Order
        if let Some(order) = query.order() {
            let path = resolve_column(&order.column, &aliases)?;
            rows.sort_by(|a, b| {
                let ordering = compare_for_sort(path.lookup(a), path.lookup(b));
                match order.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        // Window
        let skip = usize::try_from(query.skip_rows().unwrap_or(0)).unwrap_or(usize::MAX);
        let take = query
            .take_rows()
            .map_or(usize::MAX, |t| usize::try_from(t).unwrap_or(usize::MAX));
        let page = rows.into_iter().skip(skip).take(take).collect();

        Ok((page, total))
    }
}

#[derive(Debug, Clone)]
struct AliasPath {
    entity: String,
    path: Vec<String>,
}

/// Attach related rows under `relation.name` on every object at `path`
fn attach(node: &mut Value, path: &[String], relation: &RelationDescriptor, targets: &[Value]) {
    match node {
        Value::Array(items) => {
            for item in items {
                attach(item, path, relation, targets);
            }
        }
        Value::Object(map) => match path.split_first() {
            Some((head, rest)) => {
                if let Some(child) = map.get_mut(head) {
                    attach(child, rest, relation, targets);
                }
            }
            None => {
                let related = related_rows(map.get(&relation.local_column), relation, targets);
                map.insert(relation.name.clone(), related);
            }
        },
        _ => {}
    }
}

fn related_rows(key: Option<&Value>, relation: &RelationDescriptor, targets: &[Value]) -> Value {
    let key = key.filter(|k| !k.is_null());
    let mut matches = targets.iter().filter(|row| match (key, row.get(&relation.target_column)) {
        (Some(k), Some(v)) => keys_equal(k, v),
        _ => false,
    });

    if relation.many {
        Value::Array(matches.cloned().collect())
    } else {
        matches.next().cloned().unwrap_or(Value::Null)
    }
}

fn keys_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x == y,
        _ => text(a).is_some() && text(a) == text(b),
    }
}

/// Where a column lives inside a joined row
#[derive(Debug, Clone)]
struct ColumnPath {
    path: Vec<String>,
    column: String,
}

impl ColumnPath {
    fn lookup<'a>(&self, row: &'a Value) -> Option<&'a Value> {
        let mut node = row;
        for segment in &self.path {
            node = node.get(segment)?;
        }
        node.get(&self.column)
    }
}

fn resolve_column(column: &ColumnRef, aliases: &HashMap<String, AliasPath>) -> StoreResult<ColumnPath> {
    let alias = aliases
        .get(&column.alias)
        .ok_or_else(|| StoreError::UnknownAlias(column.alias.clone()))?;
    Ok(ColumnPath {
        path: alias.path.clone(),
        column: column.column.clone(),
    })
}

/// A condition with parameters bound and patterns compiled
enum Matcher {
    /// `fold_case` is set for uuid columns, which compare case-insensitively
    Eq {
        column: ColumnPath,
        value: Value,
        fold_case: bool,
    },
    Pattern { column: ColumnPath, regex: Regex },
    All(Vec<Matcher>),
    Any(Vec<Matcher>),
}

impl Matcher {
    fn matches(&self, row: &Value) -> bool {
        match self {
            Matcher::Eq {
                column,
                value,
                fold_case,
            } => match column.lookup(row) {
                Some(actual) if !actual.is_null() => equals(actual, value, *fold_case),
                _ => false,
            },
            Matcher::Pattern { column, regex } => column
                .lookup(row)
                .and_then(text)
                .is_some_and(|s| regex.is_match(&s)),
            Matcher::All(children) => children.iter().all(|m| m.matches(row)),
            Matcher::Any(children) => children.iter().any(|m| m.matches(row)),
        }
    }
}

fn compile(
    condition: &Condition,
    query: &SelectQuery,
    aliases: &HashMap<String, AliasPath>,
    tables: &HashMap<String, MemoryTable>,
) -> StoreResult<Matcher> {
    match condition {
        Condition::Compare { column: target, op, param } => {
            let value = query
                .param(param)
                .ok_or_else(|| StoreError::MissingParameter(param.clone()))?;
            let column = resolve_column(target, aliases)?;
            match op {
                CompareOp::Eq => Ok(Matcher::Eq {
                    column,
                    value: value.clone(),
                    fold_case: column_kind(target, aliases, tables) == Some(ColumnKind::Uuid),
                }),
                CompareOp::Like | CompareOp::ILike => {
                    let pattern = text(value).unwrap_or_default();
                    let regex = like_regex(&pattern, *op == CompareOp::ILike)?;
                    Ok(Matcher::Pattern { column, regex })
                }
            }
        }
        Condition::All(children) => Ok(Matcher::All(
            children
                .iter()
                .map(|c| compile(c, query, aliases, tables))
                .collect::<StoreResult<_>>()?,
        )),
        Condition::Any(children) => Ok(Matcher::Any(
            children
                .iter()
                .map(|c| compile(c, query, aliases, tables))
                .collect::<StoreResult<_>>()?,
        )),
    }
}

fn column_kind(
    column: &ColumnRef,
    aliases: &HashMap<String, AliasPath>,
    tables: &HashMap<String, MemoryTable>,
) -> Option<ColumnKind> {
    let alias = aliases.get(&column.alias)?;
    let table = tables.get(&alias.entity)?;
    table.metadata.column(&column.column).map(|c| c.kind)
}

/// Translate a SQL LIKE pattern: `%` is any run, `_` one character
fn like_regex(pattern: &str, case_insensitive: bool) -> StoreResult<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');

    RegexBuilder::new(&source)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| StoreError::Internal(format!("Invalid pattern: {}", e)))
}

/// Equality the way a typed column compares to a bound parameter
fn equals(actual: &Value, bound: &Value, fold_case: bool) -> bool {
    match bound {
        Value::Number(_) => match (numeric(actual), numeric(bound)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        Value::String(expected) if fold_case => {
            text(actual).is_some_and(|a| a.eq_ignore_ascii_case(expected))
        }
        Value::String(expected) => text(actual).is_some_and(|a| a == *expected),
        other => actual == other,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ascending order with NULLs last
fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => compare_strings(x, y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// RFC 3339 timestamps first, chronologically, then all other text.
/// Equal instants with different spellings fall back to text order.
fn compare_strings(x: &str, y: &str) -> Ordering {
    match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
        (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| x.cmp(y)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => x.cmp(y),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ColumnDescriptor;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_table(
                MemoryTable::new(
                    EntityMetadata::new(
                        "department",
                        vec![ColumnDescriptor::numeric("id"), ColumnDescriptor::text("name")],
                    )
                    .with_relation(RelationDescriptor::to_many("courses", "course", "departmentId")),
                )
                .with_rows(vec![
                    json!({"id": 1, "name": "Mathematics"}),
                    json!({"id": 2, "name": "Physics"}),
                ]),
            )
            .with_table(
                MemoryTable::new(
                    EntityMetadata::new(
                        "course",
                        vec![
                            ColumnDescriptor::numeric("id"),
                            ColumnDescriptor::text("code"),
                            ColumnDescriptor::numeric("departmentId"),
                        ],
                    )
                    .with_relation(RelationDescriptor::to_one("department", "department", "departmentId")),
                )
                .with_rows(vec![
                    json!({"id": 1, "code": "MATH101", "departmentId": 1}),
                    json!({"id": 2, "code": "math_201", "departmentId": 1}),
                    json!({"id": 3, "code": "PHYS100", "departmentId": null}),
                ]),
            )
    }

    fn compare(q: &mut SelectQuery, column: &str, op: CompareOp, param: &str, value: Value) {
        let target = q.column(column);
        q.set_parameter(param, value)
            .and_where(Condition::compare(target, op, param));
    }

    #[test]
    fn test_ilike_vs_like() {
        let s = store();

        let mut q = SelectQuery::new("course");
        compare(&mut q, "code", CompareOp::ILike, "p", json!("%math%"));
        assert_eq!(s.fetch_and_count(&q).unwrap().1, 2);

        let mut q = SelectQuery::new("course");
        compare(&mut q, "code", CompareOp::Like, "p", json!("%math%"));
        assert_eq!(s.fetch_and_count(&q).unwrap().1, 1);
    }

    #[test]
    fn test_like_wildcards_are_not_escaped() {
        let s = store();
        let mut q = SelectQuery::new("course");
        compare(&mut q, "code", CompareOp::ILike, "p", json!("%h_2%"));
        let (rows, _) = s.fetch_and_count(&q).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["code"], "math_201");
    }

    #[test]
    fn test_numeric_equality_against_text() {
        let s = store();
        let mut q = SelectQuery::new("course");
        compare(&mut q, "code", CompareOp::Eq, "p", json!(100));
        assert_eq!(s.fetch_and_count(&q).unwrap().1, 0);

        let mut q = SelectQuery::new("course");
        compare(&mut q, "departmentId", CompareOp::Eq, "p", json!(1));
        assert_eq!(s.fetch_and_count(&q).unwrap().1, 2);
    }

    #[test]
    fn test_to_one_and_to_many_joins() {
        let s = store();

        let mut q = SelectQuery::new("course");
        q.left_join_and_select("course", "department", "department");
        let (rows, _) = s.fetch_and_count(&q).unwrap();
        assert_eq!(rows[0]["department"]["name"], "Mathematics");
        assert!(rows[2]["department"].is_null());

        let mut q = SelectQuery::new("department");
        q.left_join_and_select("department", "courses", "courses")
            .left_join_and_select("courses", "department", "department");
        let (rows, _) = s.fetch_and_count(&q).unwrap();
        assert_eq!(rows[0]["courses"].as_array().unwrap().len(), 2);
        assert_eq!(rows[0]["courses"][0]["department"]["id"], 1);
        assert_eq!(rows[1]["courses"], json!([]));
    }

    #[test]
    fn test_join_errors() {
        let s = store();

        let mut q = SelectQuery::new("course");
        q.left_join_and_select("course", "teacher", "teacher");
        assert_eq!(
            s.fetch_and_count(&q).unwrap_err(),
            StoreError::UnknownRelation {
                entity: "course".to_string(),
                relation: "teacher".to_string()
            }
        );

        let mut q = SelectQuery::new("course");
        q.left_join_and_select("course", "department", "department")
            .left_join_and_select("course", "department", "department");
        assert_eq!(
            s.fetch_and_count(&q).unwrap_err(),
            StoreError::DuplicateAlias("department".to_string())
        );

        let mut q = SelectQuery::new("course");
        q.left_join_and_select("room", "building", "building");
        assert_eq!(
            s.fetch_and_count(&q).unwrap_err(),
            StoreError::UnknownAlias("room".to_string())
        );
    }

    #[test]
    fn test_missing_parameter() {
        let s = store();
        let mut q = SelectQuery::new("course");
        let target = q.column("code");
        q.and_where(Condition::compare(target, CompareOp::Eq, "nope"));
        assert_eq!(
            s.fetch_and_count(&q).unwrap_err(),
            StoreError::MissingParameter("nope".to_string())
        );
    }

    #[test]
    fn test_sort_nulls_and_window() {
        let s = store();

        let mut q = SelectQuery::new("course");
        let dept = q.column("departmentId");
        q.order_by(dept.clone(), SortDirection::Asc);
        let (rows, total) = s.fetch_and_count(&q).unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows[2]["code"], "PHYS100");

        let mut q = SelectQuery::new("course");
        q.order_by(dept, SortDirection::Desc).skip(1).take(1);
        let (rows, total) = s.fetch_and_count(&q).unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["code"], "MATH101");
    }

    #[test]
    fn test_timestamps_sort_chronologically() {
        assert_eq!(
            compare_values(
                &json!("2024-01-01T10:00:00+02:00"),
                &json!("2024-01-01T09:00:00Z")
            ),
            Ordering::Less
        );
    }

    #[test]
    fn test_mixed_text_sorts_timestamps_first() {
        assert_eq!(
            compare_values(&json!("2024-01-01T09:30"), &json!("2024-01-01T10:00:00+02:00")),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&json!("2024-01-01T09:00:00Z"), &json!("2024-01-01T09:30")),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&json!("2024-01-01T09:00:00Z"), &json!("2024-01-01T10:00:00+01:00")),
            Ordering::Less
        );
    }

    #[test]
    fn test_uuid_equality_ignores_case() {
        let s = MemoryStore::new().with_table(
            MemoryTable::new(EntityMetadata::new(
                "student",
                vec![ColumnDescriptor::uuid("id"), ColumnDescriptor::text("name")],
            ))
            .with_rows(vec![
                json!({"id": "5f2b9c1e-8a3d-4c6e-9b1a-0d7e4f3a2c10", "name": "Ada"}),
                json!({"id": "0c1d2e3f-4a5b-4c6d-8e9f-a0b1c2d3e4f5", "name": "Ben"}),
            ]),
        );

        let mut q = SelectQuery::new("student");
        compare(
            &mut q,
            "id",
            CompareOp::Eq,
            "id",
            json!("5F2B9C1E-8A3D-4C6E-9B1A-0D7E4F3A2C10"),
        );
        let (rows, total) = s.fetch_and_count(&q).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0]["name"], "Ada");

        // Text columns stay case-sensitive under equality
        let mut q = SelectQuery::new("student");
        compare(&mut q, "name", CompareOp::Eq, "name", json!("ada"));
        assert_eq!(s.fetch_and_count(&q).unwrap().1, 0);
    }

    #[test]
    fn test_insert_row() {
        let s = store();
        s.insert_row("course", json!({"id": 4, "code": "CHEM1"})).unwrap();
        assert_eq!(s.fetch_and_count(&SelectQuery::new("course")).unwrap().1, 4);
        assert!(s.insert_row("ghost", json!({})).is_err());
        assert_eq!(s.entities(), vec!["course".to_string(), "department".to_string()]);
    }
}
