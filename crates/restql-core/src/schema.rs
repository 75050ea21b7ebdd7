//! Schema model: tables, columns, and relations.
//!
//! A [`Schema`] is plain data. Declaration order of tables, columns, and
//! relations is kept as given, both for builder-constructed schemas and for
//! schemas decoded with [`Schema::from_json`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::value::SqlValue;

/// Column data types understood by schema declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Unbounded text.
    Text,
    /// Single precision float.
    Float4,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// JSON document.
    Json,
    /// 32-bit integer.
    Int4,
    /// 64-bit integer.
    Int8,
    /// Timestamp with time zone.
    Timestamptz,
    /// UUID.
    Uuid,
    /// Variable-length character string.
    Varchar,
    /// Timestamp without time zone.
    Timestamp,
    /// Arbitrary precision number.
    Numeric,
}

/// Definition of a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared data type.
    pub data_type: DataType,
    /// Whether the column is flagged as primary key.
    pub primary_key: bool,
    /// Whether the column has a UNIQUE constraint.
    pub unique: bool,
    /// Whether the column is NOT NULL.
    pub not_null: bool,
    /// Default value, if declared.
    pub default: Option<SqlValue>,
}

impl ColumnDef {
    /// Creates a new nullable column without constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            unique: false,
            not_null: false,
            default: None,
        }
    }

    /// Flags the column as primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Sets the column as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: SqlValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// A directed edge from an owning table to a target table.
///
/// Joining along the relation renders
/// `INNER JOIN target ON target.to_key = owner.from_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    /// Relation name, used as a path segment.
    pub name: String,
    /// Target table.
    pub table: String,
    /// Column on the owning table.
    pub from_key: String,
    /// Column on the target table.
    pub to_key: String,
}

impl RelationDef {
    /// Creates a new relation.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        from_key: impl Into<String>,
        to_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            from_key: from_key.into(),
            to_key: to_key.into(),
        }
    }
}

/// Columns and relations of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Relation definitions, in declaration order.
    pub relations: Vec<RelationDef>,
}

impl TableSchema {
    /// Creates a new table without columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a relation.
    #[must_use]
    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Gets a relation by name.
    #[must_use]
    pub fn get_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Returns the first column flagged as primary key.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }
}

/// The complete set of declared tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    tables: Vec<TableSchema>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table, replacing any previous table with the same name.
    #[must_use]
    pub fn table(mut self, table: TableSchema) -> Self {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
        self
    }

    /// Gets a table by name.
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Gets a table by name, failing when it is not declared.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownTable`] when no table is named `name`.
    pub fn require_table(&self, name: &str) -> Result<&TableSchema, SchemaError> {
        self.get_table(name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    /// Looks up a column on a declared table.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownTable`] when `table` is not declared.
    pub fn lookup_column(&self, table: &str, column: &str) -> Result<Option<&ColumnDef>, SchemaError> {
        Ok(self.require_table(table)?.get_column(column))
    }

    /// Looks up a relation on a declared table.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownTable`] when `table` is not declared.
    pub fn lookup_relation(
        &self,
        table: &str,
        relation: &str,
    ) -> Result<Option<&RelationDef>, SchemaError> {
        Ok(self.require_table(table)?.get_relation(relation))
    }

    /// Returns the primary key column of a declared table.
    ///
    /// When several columns are flagged, the first in declaration order wins.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownTable`] when `table` is not declared.
    pub fn primary_key_of(&self, table: &str) -> Result<Option<&str>, SchemaError> {
        Ok(self.require_table(table)?.primary_key())
    }

    /// Returns all tables in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.iter()
    }

    /// Returns table names in declaration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Checks that every relation points at a declared table and that both
    /// of its keys are declared columns.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: an empty table name, a relation to an
    /// undeclared table, or a relation key that is not a column.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for table in &self.tables {
            if table.name.is_empty() {
                return Err(SchemaError::InvalidSchema(
                    "table names must not be empty".to_string(),
                ));
            }
            for relation in &table.relations {
                let target = self.require_table(&relation.table)?;
                if table.get_column(&relation.from_key).is_none() {
                    return Err(SchemaError::UnknownColumn {
                        table: table.name.clone(),
                        column: relation.from_key.clone(),
                    });
                }
                if target.get_column(&relation.to_key).is_none() {
                    return Err(SchemaError::UnknownColumn {
                        table: target.name.clone(),
                        column: relation.to_key.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Decodes a schema declaration.
    ///
    /// The expected shape is
    /// `{ table: { columns: { name: { type, primaryKey?, unique?, notNull?,
    /// default? } }, relations?: { name: { table, fromKey, toKey } } } }`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidSchema`] when `value` is not an object and
    /// [`SchemaError::Json`] when a table, column or relation is malformed.
    pub fn from_json(value: Value) -> Result<Self, SchemaError> {
        let Value::Object(tables) = value else {
            return Err(SchemaError::InvalidSchema(
                "schema must be an object keyed by table name".to_string(),
            ));
        };

        let mut schema = Self::new();
        for (name, table) in tables {
            let raw: RawTable = serde_json::from_value(table)?;
            let mut table = TableSchema::new(name);
            for (column, def) in raw.columns {
                let def: RawColumn = serde_json::from_value(def)?;
                table = table.column(ColumnDef {
                    name: column,
                    data_type: def.data_type,
                    primary_key: def.primary_key,
                    unique: def.unique,
                    not_null: def.not_null,
                    default: def.default.map(SqlValue::from),
                });
            }
            for (relation, def) in raw.relations {
                let def: RawRelation = serde_json::from_value(def)?;
                table = table.relation(RelationDef::new(
                    relation,
                    def.table,
                    def.from_key,
                    def.to_key,
                ));
            }
            schema = schema.table(table);
        }
        Ok(schema)
    }

    /// Decodes a schema declaration from JSON text.
    ///
    /// # Errors
    ///
    /// Same as [`Schema::from_json`], plus JSON syntax errors.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Self::from_json(serde_json::from_str(json)?)
    }
}

#[derive(Deserialize)]
struct RawTable {
    columns: Map<String, Value>,
    #[serde(default)]
    relations: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawColumn {
    #[serde(rename = "type")]
    data_type: DataType,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    not_null: bool,
    #[serde(default)]
    default: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelation {
    table: String,
    from_key: String,
    to_key: String,
}
