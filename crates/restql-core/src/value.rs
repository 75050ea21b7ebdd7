//! SQL literal values.
//!
//! Every value that ends up inlined in a statement goes through
//! [`SqlValue::to_sql_inline`]. Statements are not parameterized, so this is
//! the only place where caller data touches the SQL text.
//!
//! **Warning**: text is wrapped in single quotes without escaping embedded
//! quotes. Only compile requests built from trusted input.

use serde_json::Value;

/// A literal that can be inlined into a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Unsigned integer too large for `Int`.
    UInt(u64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// List of values, rendered element by element.
    List(Vec<SqlValue>),
}

impl SqlValue {
    /// Returns the SQL representation for inline use.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => format!("{n}"),
            Self::UInt(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => format!("'{s}'"),
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::List(items) => items
                .iter()
                .map(Self::to_sql_inline)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Returns the elements of a list, or the value itself as a single
    /// element.
    #[must_use]
    pub fn into_list(self) -> Vec<SqlValue> {
        match self {
            Self::List(items) => items,
            other => vec![other],
        }
    }
}

/// Formats a value as an inline SQL literal.
#[must_use]
pub fn format_literal(value: &SqlValue) -> String {
    value.to_sql_inline()
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u64 {
    fn to_sql_value(self) -> SqlValue {
        i64::try_from(self).map_or(SqlValue::UInt(self), SqlValue::Int)
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl<T: ToSqlValue> ToSqlValue for Vec<T> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::List(self.into_iter().map(ToSqlValue::to_sql_value).collect())
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::from(self)
    }
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            // Objects have no literal form; keep their JSON text.
            Value::Object(map) => Self::Text(Value::Object(map).to_string()),
        }
    }
}
