//! Query requests and write items.
//!
//! [`QueryParams`] carries everything a statement may need: selected
//! columns, a filter tree, grouping, ordering, and pagination. Each
//! statement kind only reads the parts it uses.

use serde_json::{Map, Value};

use crate::error::{CompileError, Result};
use crate::filter::FilterTree;
use crate::path::normalize_column;
use crate::schema::Schema;
use crate::value::{SqlValue, ToSqlValue};

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field path to order by.
    pub path: String,
    /// Order direction.
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    #[must_use]
    pub fn asc(path: &str) -> Self {
        Self {
            path: path.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending order specification.
    #[must_use]
    pub fn desc(path: &str) -> Self {
        Self {
            path: path.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parses an order specification.
    ///
    /// Prefix with `-` for descending order.
    /// Example: `"-region.id"` for descending, `"name"` for ascending.
    #[must_use]
    pub fn parse(term: &str) -> Self {
        if let Some(path) = term.strip_prefix('-') {
            Self::desc(path)
        } else {
            Self::asc(term)
        }
    }

    /// Returns the SQL representation with the path resolved against `table`.
    ///
    /// # Errors
    ///
    /// Same as [`normalize_column`](crate::normalize_column).
    pub fn to_sql(&self, schema: &Schema, table: &str) -> Result<String> {
        let column = normalize_column(schema, table, &self.path)?;
        Ok(match self.direction {
            OrderDirection::Asc => format!("{column} ASC"),
            OrderDirection::Desc => format!("{column} DESC"),
        })
    }
}

/// A structured query request.
///
/// # Example
///
/// ```rust
/// use restql_core::{Condition, FilterTree, QueryParams};
///
/// let params = QueryParams::new()
///     .columns(&["name", "region.name"])
///     .filter(FilterTree::new().field("region.name", Condition::eq("Asia")))
///     .order_by("-region.id")
///     .limit(10);
/// assert_eq!(params.limit, Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Field paths to select (`None` selects every column of the table).
    pub columns: Option<Vec<String>>,
    /// Filter tree for the WHERE clause.
    pub filter: FilterTree,
    /// Ordering specifications.
    pub order_by: Vec<OrderBy>,
    /// Field paths to group by.
    pub group_by: Vec<String>,
    /// LIMIT clause.
    pub limit: Option<u64>,
    /// OFFSET clause.
    pub offset: Option<u64>,
}

impl QueryParams {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects specific field paths.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Sets the filter tree.
    #[must_use]
    pub fn filter(mut self, filter: FilterTree) -> Self {
        self.filter = filter;
        self
    }

    /// Adds an ordering. Use a `-` prefix for descending order.
    #[must_use]
    pub fn order_by(mut self, term: &str) -> Self {
        self.order_by.push(OrderBy::parse(term));
        self
    }

    /// Adds a grouping field path.
    #[must_use]
    pub fn group_by(mut self, path: &str) -> Self {
        self.group_by.push(path.to_string());
        self
    }

    /// Limits the number of results.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets the offset for pagination.
    #[must_use]
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Decodes a request from its JSON form.
    ///
    /// Recognized keys are `columns`, `where`, `orderBy`, `groupBy`, `limit`
    /// and `offset`. Null values count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidRequest`] for unknown keys or badly typed
    /// values, and [`CompileError::InvalidFilter`] for a malformed `where`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(CompileError::InvalidRequest(format!(
                "expected an object, got {value}"
            )));
        };

        let mut params = Self::new();
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            match key.as_str() {
                "columns" => params.columns = Some(string_list(key, value)?),
                "where" => params.filter = FilterTree::from_json(value)?,
                "orderBy" => {
                    params.order_by = string_list(key, value)?
                        .iter()
                        .map(|term| OrderBy::parse(term))
                        .collect();
                }
                "groupBy" => params.group_by = string_list(key, value)?,
                "limit" => params.limit = Some(count(key, value)?),
                "offset" => params.offset = Some(count(key, value)?),
                other => {
                    return Err(CompileError::InvalidRequest(format!(
                        "unknown request key '{other}'"
                    )))
                }
            }
        }
        Ok(params)
    }

    /// Returns every field path the request references, in encounter order:
    /// columns, filter fields, group-by, then order-by.
    #[must_use]
    pub fn field_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .columns
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        paths.extend(self.filter.field_paths());
        paths.extend(self.group_by.iter().map(String::as_str));
        paths.extend(self.order_by.iter().map(|o| o.path.as_str()));
        paths
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
    let invalid = || CompileError::InvalidRequest(format!("'{key}' must be an array of strings"));
    let Value::Array(items) = value else {
        return Err(invalid());
    };
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn count(key: &str, value: &Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        CompileError::InvalidRequest(format!("'{key}' must be a non-negative integer"))
    })
}

/// Column values for INSERT and UPDATE statements, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    values: Vec<(String, SqlValue)>,
}

impl Item {
    /// Creates an empty item.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column value. Setting a column twice keeps its first position.
    #[must_use]
    pub fn set<V: ToSqlValue>(mut self, column: &str, value: V) -> Self {
        let value = value.to_sql_value();
        match self.values.iter_mut().find(|(c, _)| c == column) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((column.to_string(), value)),
        }
        self
    }

    /// Returns the column/value pairs.
    #[must_use]
    pub fn values(&self) -> &[(String, SqlValue)] {
        &self.values
    }

    /// Returns the column names.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(c, _)| c.as_str())
    }

    /// Returns whether no column is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Decodes an item from a JSON object, keeping key order.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidRequest`] when `value` is not an object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(CompileError::InvalidRequest(format!(
                "item must be an object, got {value}"
            )));
        };
        Ok(Self::from(map.clone()))
    }
}

impl From<Map<String, Value>> for Item {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            values: map
                .into_iter()
                .map(|(column, value)| (column, SqlValue::from(value)))
                .collect(),
        }
    }
}
