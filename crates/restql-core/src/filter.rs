//! Filter trees and their compilation to WHERE expressions.
//!
//! A [`FilterTree`] is an ordered list of nodes that are implicitly AND-ed.
//! Each node is either a condition set on one field path or a parenthesized
//! `$and`/`$or` group of child trees. Rendering follows declaration order
//! exactly.
//!
//! # Example
//!
//! ```rust
//! use restql_core::{Condition, FilterTree};
//!
//! let filter = FilterTree::new()
//!     .field("cities.name", Condition::like("%a%"))
//!     .or(vec![
//!         FilterTree::new().field("region.name", Condition::eq("Asia")),
//!         FilterTree::new().field("region.name", Condition::eq("Europe")),
//!     ]);
//! assert_eq!(filter.len(), 2);
//! ```

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{CompileError, Result};
use crate::path::normalize_column;
use crate::schema::Schema;
use crate::value::{SqlValue, ToSqlValue};

/// A single operator applied to a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `= v`
    Eq(SqlValue),
    /// `!= v`
    Neq(SqlValue),
    /// `> v`
    Gt(SqlValue),
    /// `>= v`
    Gte(SqlValue),
    /// `< v`
    Lt(SqlValue),
    /// `<= v`
    Lte(SqlValue),
    /// `LIKE v`
    Like(SqlValue),
    /// `NOT LIKE v`
    NotLike(SqlValue),
    /// `IN (v0, v1, ...)`
    In(Vec<SqlValue>),
    /// `NOT IN (v0, v1, ...)`
    NotIn(Vec<SqlValue>),
    /// `BETWEEN low AND high`
    Between(SqlValue, SqlValue),
    /// `NOT BETWEEN low AND high`
    NotBetween(SqlValue, SqlValue),
}

impl Condition {
    /// Creates an equality condition.
    #[must_use]
    pub fn eq<V: ToSqlValue>(value: V) -> Self {
        Self::Eq(value.to_sql_value())
    }

    /// Creates an inequality condition.
    #[must_use]
    pub fn neq<V: ToSqlValue>(value: V) -> Self {
        Self::Neq(value.to_sql_value())
    }

    /// Creates a greater-than condition.
    #[must_use]
    pub fn gt<V: ToSqlValue>(value: V) -> Self {
        Self::Gt(value.to_sql_value())
    }

    /// Creates a greater-than-or-equal condition.
    #[must_use]
    pub fn gte<V: ToSqlValue>(value: V) -> Self {
        Self::Gte(value.to_sql_value())
    }

    /// Creates a less-than condition.
    #[must_use]
    pub fn lt<V: ToSqlValue>(value: V) -> Self {
        Self::Lt(value.to_sql_value())
    }

    /// Creates a less-than-or-equal condition.
    #[must_use]
    pub fn lte<V: ToSqlValue>(value: V) -> Self {
        Self::Lte(value.to_sql_value())
    }

    /// Creates a LIKE condition. Use `%` for wildcard matching.
    #[must_use]
    pub fn like<V: ToSqlValue>(pattern: V) -> Self {
        Self::Like(pattern.to_sql_value())
    }

    /// Creates a NOT LIKE condition.
    #[must_use]
    pub fn not_like<V: ToSqlValue>(pattern: V) -> Self {
        Self::NotLike(pattern.to_sql_value())
    }

    /// Creates an IN list condition.
    #[must_use]
    pub fn in_list<V: ToSqlValue>(values: Vec<V>) -> Self {
        Self::In(values.into_iter().map(ToSqlValue::to_sql_value).collect())
    }

    /// Creates a NOT IN list condition.
    #[must_use]
    pub fn not_in_list<V: ToSqlValue>(values: Vec<V>) -> Self {
        Self::NotIn(values.into_iter().map(ToSqlValue::to_sql_value).collect())
    }

    /// Creates a BETWEEN condition.
    #[must_use]
    pub fn between<V: ToSqlValue>(low: V, high: V) -> Self {
        Self::Between(low.to_sql_value(), high.to_sql_value())
    }

    /// Creates a NOT BETWEEN condition.
    #[must_use]
    pub fn not_between<V: ToSqlValue>(low: V, high: V) -> Self {
        Self::NotBetween(low.to_sql_value(), high.to_sql_value())
    }

    /// Returns the operator key used in JSON filters.
    #[must_use]
    pub const fn operator(&self) -> &'static str {
        match self {
            Self::Eq(_) => "$eq",
            Self::Neq(_) => "$neq",
            Self::Gt(_) => "$gt",
            Self::Gte(_) => "$gte",
            Self::Lt(_) => "$lt",
            Self::Lte(_) => "$lte",
            Self::Like(_) => "$like",
            Self::NotLike(_) => "$nlike",
            Self::In(_) => "$in",
            Self::NotIn(_) => "$nin",
            Self::Between(..) => "$between",
            Self::NotBetween(..) => "$nbetween",
        }
    }

    /// Decodes a condition from an operator key and its JSON operand.
    ///
    /// Returns `Ok(None)` when `operator` is not an operator key.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidFilter`] when a `$between` operand is
    /// not a two-element list or an `$in` operand is empty.
    pub fn from_operator(operator: &str, value: Value) -> Result<Option<Self>> {
        let value = SqlValue::from(value);
        let condition = match operator {
            "$eq" => Self::Eq(value),
            "$neq" => Self::Neq(value),
            "$gt" => Self::Gt(value),
            "$gte" => Self::Gte(value),
            "$lt" => Self::Lt(value),
            "$lte" => Self::Lte(value),
            "$like" => Self::Like(value),
            "$nlike" => Self::NotLike(value),
            "$in" | "$nin" => {
                let values = value.into_list();
                ensure_non_empty(operator, &values)?;
                if operator == "$in" {
                    Self::In(values)
                } else {
                    Self::NotIn(values)
                }
            }
            "$between" | "$nbetween" => {
                let [low, high]: [SqlValue; 2] =
                    value.into_list().try_into().map_err(|items: Vec<SqlValue>| {
                        CompileError::InvalidFilter(format!(
                            "{operator} expects two values, got {}",
                            items.len()
                        ))
                    })?;
                if operator == "$between" {
                    Self::Between(low, high)
                } else {
                    Self::NotBetween(low, high)
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(condition))
    }
}

/// `IN ()` is not valid SQL.
fn ensure_non_empty(operator: &str, values: &[SqlValue]) -> Result<()> {
    if values.is_empty() {
        return Err(CompileError::InvalidFilter(format!(
            "{operator} expects at least one value"
        )));
    }
    Ok(())
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |values: &[SqlValue]| {
            values
                .iter()
                .map(SqlValue::to_sql_inline)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Self::Eq(v) => write!(f, "= {}", v.to_sql_inline()),
            Self::Neq(v) => write!(f, "!= {}", v.to_sql_inline()),
            Self::Gt(v) => write!(f, "> {}", v.to_sql_inline()),
            Self::Gte(v) => write!(f, ">= {}", v.to_sql_inline()),
            Self::Lt(v) => write!(f, "< {}", v.to_sql_inline()),
            Self::Lte(v) => write!(f, "<= {}", v.to_sql_inline()),
            Self::Like(v) => write!(f, "LIKE {}", v.to_sql_inline()),
            Self::NotLike(v) => write!(f, "NOT LIKE {}", v.to_sql_inline()),
            Self::In(values) => write!(f, "IN ({})", list(values)),
            Self::NotIn(values) => write!(f, "NOT IN ({})", list(values)),
            Self::Between(low, high) => write!(
                f,
                "BETWEEN {} AND {}",
                low.to_sql_inline(),
                high.to_sql_inline()
            ),
            Self::NotBetween(low, high) => write!(
                f,
                "NOT BETWEEN {} AND {}",
                low.to_sql_inline(),
                high.to_sql_inline()
            ),
        }
    }
}

/// Conditions on one field path.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Dotted field path.
    pub path: String,
    /// Conditions, AND-ed in order.
    pub conditions: Vec<Condition>,
}

/// One entry of a filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// Conditions on a field.
    Field(FieldFilter),
    /// `$and` group.
    And(Vec<FilterTree>),
    /// `$or` group.
    Or(Vec<FilterTree>),
}

/// An ordered set of filter nodes, implicitly AND-ed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterTree {
    nodes: Vec<FilterNode>,
}

impl FilterTree {
    /// Creates an empty filter tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition on a field path.
    ///
    /// When the last node is a field node on the same path, the condition is
    /// appended to it, the way repeated operators on one JSON key are.
    /// Otherwise a new node is pushed so declaration order is kept.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, condition: Condition) -> Self {
        let path = path.into();
        let trailing = match self.nodes.last_mut() {
            Some(FilterNode::Field(field)) if field.path == path => Some(field),
            _ => None,
        };
        match trailing {
            Some(field) => field.conditions.push(condition),
            None => self.nodes.push(FilterNode::Field(FieldFilter {
                path,
                conditions: vec![condition],
            })),
        }
        self
    }

    /// Adds an `$and` group.
    #[must_use]
    pub fn and(mut self, children: Vec<FilterTree>) -> Self {
        self.nodes.push(FilterNode::And(children));
        self
    }

    /// Adds an `$or` group.
    #[must_use]
    pub fn or(mut self, children: Vec<FilterTree>) -> Self {
        self.nodes.push(FilterNode::Or(children));
        self
    }

    /// Returns the nodes in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Returns the number of top-level nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns every field path, depth first, in declaration order.
    #[must_use]
    pub fn field_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, paths: &mut Vec<&'a str>) {
        for node in &self.nodes {
            match node {
                FilterNode::Field(field) => paths.push(&field.path),
                FilterNode::And(children) | FilterNode::Or(children) => {
                    for child in children {
                        child.collect_paths(paths);
                    }
                }
            }
        }
    }

    /// Returns a copy with `path = value` as the only top-level condition on
    /// `path`.
    ///
    /// The first top-level node on `path` is replaced in place and later
    /// top-level nodes on `path` are dropped. Without one, the condition is
    /// appended. `self` is left untouched.
    #[must_use]
    pub fn with_equality(&self, path: &str, value: SqlValue) -> Self {
        let is_path = |node: &FilterNode| matches!(node, FilterNode::Field(field) if field.path == path);
        let replacement = FilterNode::Field(FieldFilter {
            path: path.to_string(),
            conditions: vec![Condition::Eq(value)],
        });

        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        let mut replacement = Some(replacement);
        for node in &self.nodes {
            if is_path(node) {
                if let Some(node) = replacement.take() {
                    nodes.push(node);
                }
            } else {
                nodes.push(node.clone());
            }
        }
        nodes.extend(replacement);
        Self { nodes }
    }

    /// Decodes a filter tree from its JSON form.
    ///
    /// Keys are field paths mapped to `{operator: value}` objects, or `$and`
    /// and `$or` mapped to arrays of trees. A field object may nest further
    /// field keys or groups, which are resolved relative to that field.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidFilter`] for unknown operators,
    /// non-object conditions, non-array groups and bad operands.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Self::from_map(map, None),
            other => Err(CompileError::InvalidFilter(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    fn from_map(map: &Map<String, Value>, prefix: Option<&str>) -> Result<Self> {
        let mut tree = Self::new();
        for (key, value) in map {
            match key.as_str() {
                "$and" => tree.nodes.push(FilterNode::And(Self::children(value, prefix)?)),
                "$or" => tree.nodes.push(FilterNode::Or(Self::children(value, prefix)?)),
                _ => {
                    let path = match prefix {
                        Some(prefix) => format!("{prefix}.{key}"),
                        None => key.clone(),
                    };
                    tree.nodes.extend(Self::field_nodes(path, value)?);
                }
            }
        }
        Ok(tree)
    }

    fn children(value: &Value, prefix: Option<&str>) -> Result<Vec<FilterTree>> {
        let Value::Array(items) = value else {
            return Err(CompileError::InvalidFilter(format!(
                "logical group expects an array, got {value}"
            )));
        };
        items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Self::from_map(map, prefix),
                other => Err(CompileError::InvalidFilter(format!(
                    "logical group member must be an object, got {other}"
                ))),
            })
            .collect()
    }

    /// Splits one field object into nodes, keeping key order. Runs of
    /// operators become one field node; nested keys become their own nodes.
    fn field_nodes(path: String, value: &Value) -> Result<Vec<FilterNode>> {
        let Value::Object(map) = value else {
            return Err(CompileError::InvalidFilter(format!(
                "conditions for '{path}' must be an object, got {value}"
            )));
        };

        let mut nodes = Vec::new();
        let mut conditions = Vec::new();
        for (key, operand) in map {
            if let Some(condition) = Condition::from_operator(key, operand.clone())? {
                conditions.push(condition);
                continue;
            }
            if key.starts_with('$') && key != "$and" && key != "$or" {
                return Err(CompileError::InvalidFilter(format!(
                    "unknown operator '{key}' on '{path}'"
                )));
            }
            if !conditions.is_empty() {
                nodes.push(FilterNode::Field(FieldFilter {
                    path: path.clone(),
                    conditions: std::mem::take(&mut conditions),
                }));
            }
            let mut nested = Map::new();
            nested.insert(key.clone(), operand.clone());
            nodes.extend(Self::from_map(&nested, Some(&path))?.nodes);
        }
        if !conditions.is_empty() {
            nodes.push(FilterNode::Field(FieldFilter { path, conditions }));
        }
        Ok(nodes)
    }
}

/// Compiles a filter tree into the body of a WHERE clause.
///
/// An empty tree compiles to an empty string.
///
/// # Errors
///
/// Fails when a field path starts from or walks into an undeclared table, or
/// when an `IN` list is empty.
pub fn compile_filter(schema: &Schema, table: &str, tree: &FilterTree) -> Result<String> {
    let mut parts = Vec::with_capacity(tree.nodes.len());
    for node in &tree.nodes {
        let sql = match node {
            FilterNode::Field(field) => compile_field(schema, table, field)?,
            FilterNode::And(children) => compile_group(schema, table, children, " AND ")?,
            FilterNode::Or(children) => compile_group(schema, table, children, " OR ")?,
        };
        if !sql.is_empty() {
            parts.push(sql);
        }
    }
    Ok(parts.join(" AND "))
}

fn compile_field(schema: &Schema, table: &str, field: &FieldFilter) -> Result<String> {
    if field.conditions.is_empty() {
        return Ok(String::new());
    }
    for condition in &field.conditions {
        if let Condition::In(values) | Condition::NotIn(values) = condition {
            ensure_non_empty(condition.operator(), values)?;
        }
    }
    let column = normalize_column(schema, table, &field.path)?;
    Ok(field
        .conditions
        .iter()
        .map(|condition| format!("{column} {condition}"))
        .collect::<Vec<_>>()
        .join(" AND "))
}

fn compile_group(
    schema: &Schema,
    table: &str,
    children: &[FilterTree],
    separator: &str,
) -> Result<String> {
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        let sql = compile_filter(schema, table, child)?;
        if !sql.is_empty() {
            parts.push(sql);
        }
    }
    if parts.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("({})", parts.join(separator)))
}
