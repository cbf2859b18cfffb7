//! Composable select-query builder
//!
//! Mirrors the surface of an ORM query builder: a base scan under an
//! alias, join-and-select by relation path, grouped AND/OR conditions
//! with named parameters, one order-by, and skip/take. The built value is
//! plain data; stores interpret it, and it renders itself as
//! parameterised SQL for logging and inspection.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// `alias.column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub alias: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\".\"{}\"", self.alias, self.column)
    }
}

/// Comparison operators a condition may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Exact equality
    Eq,
    /// Case-sensitive pattern match
    Like,
    /// Case-insensitive pattern match
    ILike,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Like => "LIKE",
            CompareOp::ILike => "ILIKE",
        }
    }
}

/// A WHERE-clause condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column <op> :param`
    Compare {
        column: ColumnRef,
        op: CompareOp,
        param: String,
    },
    /// Every child must hold
    All(Vec<Condition>),
    /// At least one child must hold
    Any(Vec<Condition>),
}

impl Condition {
    pub fn compare(column: ColumnRef, op: CompareOp, param: impl Into<String>) -> Self {
        Condition::Compare {
            column,
            op,
            param: param.into(),
        }
    }

    /// Parameter names referenced by this condition, in order
    pub fn params(&self) -> Vec<&str> {
        match self {
            Condition::Compare { param, .. } => vec![param.as_str()],
            Condition::All(children) | Condition::Any(children) => {
                children.iter().flat_map(|c| c.params()).collect()
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare { column, op, param } => {
                write!(f, "{} {} :{}", column, op.as_sql(), param)
            }
            Condition::All(children) => write_group(f, children, " AND "),
            Condition::Any(children) => write_group(f, children, " OR "),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, children: &[Condition], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str(")")
}

/// A left join that also selects the related rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Alias the relation hangs off
    pub parent: String,
    /// Relation name on the parent entity
    pub relation: String,
    /// Alias given to the joined rows
    pub alias: String,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// ORDER BY clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// A select query under construction
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    entity: String,
    alias: String,
    joins: Vec<Join>,
    conditions: Vec<Condition>,
    params: BTreeMap<String, Value>,
    order: Option<OrderBy>,
    skip: Option<u64>,
    take: Option<u64>,
}

impl SelectQuery {
    /// Base scan of `entity`, aliased by its own name
    pub fn new(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            alias: entity.clone(),
            entity,
            joins: Vec::new(),
            conditions: Vec::new(),
            params: BTreeMap::new(),
            order: None,
            skip: None,
            take: None,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Reference a column of the base entity
    pub fn column(&self, name: &str) -> ColumnRef {
        ColumnRef::new(self.alias.clone(), name)
    }

    /// `LEFT JOIN parent.relation AS alias` and select its columns
    pub fn left_join_and_select(
        &mut self,
        parent: impl Into<String>,
        relation: impl Into<String>,
        alias: impl Into<String>,
    ) -> &mut Self {
        self.joins.push(Join {
            parent: parent.into(),
            relation: relation.into(),
            alias: alias.into(),
        });
        self
    }

    /// AND a condition onto the WHERE clause
    pub fn and_where(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    /// Bind a named parameter, replacing any previous value
    pub fn set_parameter(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn order_by(&mut self, column: ColumnRef, direction: SortDirection) -> &mut Self {
        self.order = Some(OrderBy { column, direction });
        self
    }

    pub fn skip(&mut self, rows: u64) -> &mut Self {
        self.skip = Some(rows);
        self
    }

    pub fn take(&mut self, rows: u64) -> &mut Self {
        self.take = Some(rows);
        self
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn order(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    pub fn skip_rows(&self) -> Option<u64> {
        self.skip
    }

    pub fn take_rows(&self) -> Option<u64> {
        self.take
    }

    /// WHERE clause body, or `None` when unconditioned
    pub fn where_sql(&self) -> Option<String> {
        if self.conditions.is_empty() {
            return None;
        }
        Some(
            self.conditions
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }

    /// ORDER BY clause body
    pub fn order_sql(&self) -> Option<String> {
        self.order
            .as_ref()
            .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
    }

    /// Single-line rendering for logs. Parameter values are not inlined.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT FROM \"{}\" \"{}\"", self.entity, self.alias);
        for join in &self.joins {
            sql.push_str(&format!(
                " LEFT JOIN \"{}\".\"{}\" \"{}\"",
                join.parent, join.relation, join.alias
            ));
        }
        if let Some(clause) = self.where_sql() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        if let Some(clause) = self.order_sql() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&clause);
        }
        if let Some(take) = self.take {
            sql.push_str(&format!(" LIMIT {}", take));
        }
        if let Some(skip) = self.skip {
            sql.push_str(&format!(" OFFSET {}", skip));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_where_sql_groups() {
        let mut q = SelectQuery::new("course");
        let code = q.column("code");
        let status = q.column("status");
        q.and_where(Condition::All(vec![
            Condition::compare(code.clone(), CompareOp::ILike, "code_0"),
            Condition::compare(code, CompareOp::ILike, "code_1"),
        ]))
        .and_where(Condition::compare(status, CompareOp::Eq, "status"));

        assert_eq!(
            q.where_sql().unwrap(),
            "(\"course\".\"code\" ILIKE :code_0 AND \"course\".\"code\" ILIKE :code_1) \
             AND \"course\".\"status\" = :status"
        );
    }

    #[test]
    fn test_any_group() {
        let mut q = SelectQuery::new("user");
        let first = q.column("firstName");
        let last = q.column("lastName");
        q.and_where(Condition::Any(vec![
            Condition::compare(first, CompareOp::Like, "search"),
            Condition::compare(last, CompareOp::Like, "search"),
        ]));
        assert_eq!(
            q.where_sql().unwrap(),
            "(\"user\".\"firstName\" LIKE :search OR \"user\".\"lastName\" LIKE :search)"
        );
        assert_eq!(q.conditions()[0].params(), vec!["search", "search"]);
    }

    #[test]
    fn test_to_sql() {
        let mut q = SelectQuery::new("class");
        let created = q.column("createdAt");
        q.left_join_and_select("class", "course", "course")
            .left_join_and_select("course", "room", "room")
            .set_parameter("x", json!(1))
            .order_by(created, SortDirection::Desc)
            .skip(20)
            .take(10);

        assert_eq!(
            q.to_sql(),
            "SELECT FROM \"class\" \"class\" \
             LEFT JOIN \"class\".\"course\" \"course\" \
             LEFT JOIN \"course\".\"room\" \"room\" \
             ORDER BY \"class\".\"createdAt\" DESC LIMIT 10 OFFSET 20"
        );
        assert!(q.where_sql().is_none());
        assert_eq!(q.param("x"), Some(&json!(1)));
    }
}
