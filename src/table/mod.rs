//! Table definitions and the [`Table`] trait.
//!
//! A table is a static [`TableDefinition`] (columns, key columns) plus a
//! list function and an optional get function. Tables are registered in a
//! [`TableRegistry`] at startup and looked up by name per query.

use crate::fetch::RowSink;
use crate::query::{InvalidQuery, Operator, QueryContext};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

mod registry;
mod row;
mod sink;


pub use registry::TableRegistry;
pub use row::{Hydrated, Row};
pub use sink::QuerySink;

/// Column value type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Int,
    Bool,
    Timestamp,
    Json,
}

/// Where a column's value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnSource {
    /// Dotted JSON path into the serialized item, e.g. `settings.title`.
    Field(&'static str),
    /// Supplied by the table from an extra call, only when requested.
    Hydrated,
}

#[derive(Clone, Debug, Serialize)]
pub struct Column {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub description: &'static str,
    #[serde(skip)]
    pub source: ColumnSource,
}

impl Column {
    pub fn new(name: &'static str, column_type: ColumnType, description: &'static str) -> Self {
        Self {
            name,
            column_type,
            description,
            source: ColumnSource::Field(name),
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ColumnType::String, description)
    }

    pub fn int(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ColumnType::Int, description)
    }

    pub fn bool(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ColumnType::Bool, description)
    }

    pub fn timestamp(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp, description)
    }

    pub fn json(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ColumnType::Json, description)
    }

    /// Reads the value from a different (possibly nested) field.
    pub fn from_field(mut self, path: &'static str) -> Self {
        self.source = ColumnSource::Field(path);
        self
    }

    pub fn hydrated(mut self) -> Self {
        self.source = ColumnSource::Hydrated;
        self
    }

    pub fn is_hydrated(&self) -> bool {
        self.source == ColumnSource::Hydrated
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Require {
    Required,
    Optional,
}

/// A column the table can push down to the remote API.
#[derive(Clone, Debug, Serialize)]
pub struct KeyColumn {
    pub name: &'static str,
    pub operators: &'static [Operator],
    pub require: Require,
}

impl KeyColumn {
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            operators: Operator::EQUALITY,
            require: Require::Required,
        }
    }

    pub fn optional(name: &'static str) -> Self {
        Self {
            name,
            operators: Operator::EQUALITY,
            require: Require::Optional,
        }
    }

    /// Optional time-valued key column accepting every range operator.
    pub fn range(name: &'static str) -> Self {
        Self {
            name,
            operators: Operator::RANGE,
            require: Require::Optional,
        }
    }

    fn satisfied_by(&self, ctx: &QueryContext) -> bool {
        ctx.has_equals(self.name)
    }
}

/// Static schema of one table.
#[derive(Clone, Debug, Serialize)]
pub struct TableDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub columns: Vec<Column>,
    pub list_keys: Vec<KeyColumn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get_keys: Option<Vec<KeyColumn>>,
}

impl TableDefinition {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            columns: Vec::new(),
            list_keys: Vec::new(),
            get_keys: None,
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_list_keys(mut self, keys: Vec<KeyColumn>) -> Self {
        self.list_keys = keys;
        self
    }

    pub fn with_get_keys(mut self, keys: Vec<KeyColumn>) -> Self {
        self.get_keys = Some(keys);
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// True if every required get key has an `=` qual.
    pub fn uses_get(&self, ctx: &QueryContext) -> bool {
        match &self.get_keys {
            Some(keys) => keys
                .iter()
                .filter(|k| k.require == Require::Required)
                .all(|k| k.satisfied_by(ctx)),
            None => false,
        }
    }

    /// Rejects a zero row limit, quals or projections on unknown columns
    /// and list queries missing a required key column.
    pub fn validate(&self, ctx: &QueryContext) -> Result<()> {
        if ctx.limit == Some(0) {
            return Err(InvalidQuery("row limit must be positive".to_string()).into());
        }
        for qual in &ctx.quals {
            if self.column(&qual.column).is_none() {
                return Err(InvalidQuery(format!(
                    "table {} has no column '{}'",
                    self.name, qual.column
                ))
                .into());
            }
        }
        if let Some(columns) = &ctx.columns {
            for name in columns {
                if self.column(name).is_none() {
                    return Err(InvalidQuery(format!(
                        "table {} has no column '{}'",
                        self.name, name
                    ))
                    .into());
                }
            }
        }
        if self.uses_get(ctx) {
            return Ok(());
        }
        for key in self.list_keys.iter().filter(|k| k.require == Require::Required) {
            if !key.satisfied_by(ctx) {
                return Err(InvalidQuery(format!(
                    "table {} requires an '=' qual on column '{}'",
                    self.name, key.name
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// A queryable table.
#[async_trait]
pub trait Table: Send + Sync {
    fn definition(&self) -> &TableDefinition;

    /// Streams every row matching the pushed-down quals into `sink`.
    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()>;

    /// Fetches the single row identified by the get key columns.
    async fn get(&self, _ctx: &QueryContext) -> Result<Option<Row>> {
        Ok(None)
    }
}
