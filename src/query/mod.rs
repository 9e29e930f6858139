//! Predicate sets for a single table query.
//!
//! A [`QueryContext`] carries the quals (column, operator, literal) the host
//! pushed down, an optional row limit and an optional column projection.
//! Tables translate the quals they understand into remote query parameters;
//! the host re-applies every qual to the emitted rows (see
//! [`crate::table::QuerySink`]).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

mod range;

pub use range::{TimeFormat, TimeRange};

/// A query the table cannot answer as posed: unknown columns, a missing
/// required key column or a zero row limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidQuery(pub String);

impl fmt::Display for InvalidQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidQuery {}

/// Comparison operator of a qual.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    /// Operators accepted on plain key columns.
    pub const EQUALITY: &'static [Operator] = &[Operator::Eq];

    /// Operators accepted on time-valued key columns.
    pub const RANGE: &'static [Operator] = &[
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
        Operator::Eq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
        }
    }

    /// Returns true if `ordering` (row value compared to qual value)
    /// satisfies this operator.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Ge => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal value of a qual.
///
/// Deserialized untagged: JSON booleans and integers map directly, strings
/// that parse as RFC 3339 become timestamps, anything else is text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QualValue {
    Bool(bool),
    Int(i64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl QualValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QualValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            QualValue::Int(i) => Some(*i),
            QualValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            QualValue::Timestamp(ts) => Some(*ts),
            QualValue::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Compares a row cell against this literal.
    ///
    /// Returns the ordering of the cell relative to the literal, or `None`
    /// when the two cannot be compared (null cell, mismatched types).
    pub fn compare(&self, cell: &Value) -> Option<Ordering> {
        match (self, cell) {
            (_, Value::Null) => None,
            (QualValue::Timestamp(q), Value::String(s)) => parse_timestamp(s).map(|v| v.cmp(q)),
            (QualValue::Int(q), Value::Number(n)) => n.as_i64().map(|v| v.cmp(q)),
            (QualValue::Int(q), Value::String(s)) => s.parse::<i64>().ok().map(|v| v.cmp(q)),
            (QualValue::Bool(q), Value::Bool(b)) => Some(b.cmp(q)),
            (QualValue::Text(q), Value::String(s)) => Some(s.as_str().cmp(q.as_str())),
            (QualValue::Text(q), Value::Number(n)) => match (n.as_i64(), q.parse::<i64>()) {
                (Some(v), Ok(q)) => Some(v.cmp(&q)),
                _ => None,
            },
            (QualValue::Text(q), Value::Bool(b)) => q.parse::<bool>().ok().map(|q| b.cmp(&q)),
            _ => None,
        }
    }
}

impl fmt::Display for QualValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualValue::Bool(b) => write!(f, "{}", b),
            QualValue::Int(i) => write!(f, "{}", i),
            QualValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            QualValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for QualValue {
    fn from(s: &str) -> Self {
        QualValue::Text(s.to_string())
    }
}

impl From<String> for QualValue {
    fn from(s: String) -> Self {
        QualValue::Text(s)
    }
}

impl From<i64> for QualValue {
    fn from(i: i64) -> Self {
        QualValue::Int(i)
    }
}

impl From<bool> for QualValue {
    fn from(b: bool) -> Self {
        QualValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for QualValue {
    fn from(ts: DateTime<Utc>) -> Self {
        QualValue::Timestamp(ts)
    }
}

fn default_operator() -> Operator {
    Operator::Eq
}

/// A single filter predicate on one column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Qual {
    pub column: String,
    #[serde(default = "default_operator")]
    pub operator: Operator,
    pub value: QualValue,
}

impl Qual {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<QualValue>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Evaluates the qual against a row. A missing or null cell never matches.
    pub fn matches(&self, row: &serde_json::Map<String, Value>) -> bool {
        row.get(&self.column)
            .and_then(|cell| self.value.compare(cell))
            .is_some_and(|ordering| self.operator.accepts(ordering))
    }
}

/// The predicate set of one query: quals, row limit and projection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    #[serde(default)]
    pub quals: Vec<Qual>,
    #[serde(default)]
    pub limit: Option<u64>,
    /// Requested columns. `None` means every column.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_qual(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<QualValue>,
    ) -> Self {
        self.quals.push(Qual::new(column, operator, value));
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// All quals on `column`, in the order they were supplied.
    pub fn quals_for<'a, 'c>(&'a self, column: &'c str) -> impl Iterator<Item = &'a Qual> + 'c
    where
        'a: 'c,
    {
        self.quals.iter().filter(move |q| q.column == column)
    }

    /// The value of the first `=` qual on `column`.
    pub fn equals(&self, column: &str) -> Option<&QualValue> {
        self.quals
            .iter()
            .find(|q| q.column == column && q.operator == Operator::Eq)
            .map(|q| &q.value)
    }

    pub fn has_equals(&self, column: &str) -> bool {
        self.equals(column).is_some()
    }

    /// Text value of the `=` qual on `column`; integers are rendered as text.
    pub fn equals_string(&self, column: &str) -> Option<String> {
        match self.equals(column)? {
            QualValue::Text(s) => Some(s.clone()),
            QualValue::Int(i) => Some(i.to_string()),
            _ => None,
        }
    }

    pub fn equals_i64(&self, column: &str) -> Option<i64> {
        self.equals(column).and_then(QualValue::as_i64)
    }

    /// Translates the range quals on a time-valued column.
    pub fn time_range(&self, column: &str) -> TimeRange {
        TimeRange::from_quals(self.quals_for(column))
    }

    /// True if `column` is projected or referenced by a qual.
    pub fn wants_column(&self, column: &str) -> bool {
        match &self.columns {
            None => true,
            Some(columns) => {
                columns.iter().any(|c| c == column) || self.quals.iter().any(|q| q.column == column)
            }
        }
    }
}

/// Parses an API timestamp: RFC 3339, or `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
