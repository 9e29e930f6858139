use super::{ColumnSource, ColumnType, TableDefinition};
use crate::query::{parse_timestamp, QueryContext};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One result row, keyed by column name.
pub type Row = Map<String, Value>;

/// Values of hydrated columns, computed by the table for one item.
pub type Hydrated = HashMap<&'static str, Value>;

impl TableDefinition {
    /// Maps an API item to a row of this table.
    ///
    /// Field columns read a (dotted) path from the serialized item; zero
    /// values become null and timestamps are normalised to UTC. Hydrated
    /// columns take their value from `hydrated` and are left out when absent.
    pub fn build_row<T: Serialize>(&self, item: &T, mut hydrated: Hydrated) -> Result<Row> {
        let value = serde_json::to_value(item)
            .with_context(|| format!("Failed to serialize {} item", self.name))?;

        let mut row = Row::new();
        for column in &self.columns {
            match column.source {
                ColumnSource::Field(path) => {
                    let cell = lookup_path(&value, path)
                        .cloned()
                        .map(null_if_zero)
                        .unwrap_or(Value::Null);
                    row.insert(column.name.to_string(), normalise(column.column_type, cell));
                }
                ColumnSource::Hydrated => {
                    if let Some(cell) = hydrated.remove(column.name) {
                        row.insert(column.name.to_string(), cell);
                    }
                }
            }
        }
        Ok(row)
    }

    /// False if a qual on a field column already rules `row` out.
    ///
    /// Tables check this on the row built without hydrated columns, and
    /// skip the remote calls for rows the query will discard anyway.
    pub fn may_match(&self, ctx: &QueryContext, row: &Row) -> bool {
        ctx.quals
            .iter()
            .filter(|qual| self.column(&qual.column).is_some_and(|c| !c.is_hydrated()))
            .all(|qual| qual.matches(row))
    }

    /// Adds hydrated values to a row built by [`build_row`](Self::build_row).
    pub fn hydrate(&self, row: &mut Row, mut hydrated: Hydrated) {
        for column in self.columns.iter().filter(|c| c.is_hydrated()) {
            if let Some(cell) = hydrated.remove(column.name) {
                row.insert(column.name.to_string(), cell);
            }
        }
    }
}

fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| current.get(segment))
}

fn null_if_zero(value: Value) -> Value {
    let zero = match &value {
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Null => true,
        _ => false,
    };
    if zero {
        Value::Null
    } else {
        value
    }
}

fn normalise(column_type: ColumnType, value: Value) -> Value {
    match (column_type, &value) {
        (ColumnType::Timestamp, Value::String(s)) => match parse_timestamp(s) {
            Some(ts) => Value::String(ts.to_rfc3339()),
            None => value,
        },
        _ => value,
    }
}
