// Time-range quals → since/before query parameters.
//
// The remote range filters are exclusive on the "before" side, so `<=` and
// `=` extend the upper bound by one unit (one second), giving a half-open
// interval [since, before).

use super::{Operator, Qual};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::warn;

/// Wire format of a time parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeFormat {
    /// `2006-01-02T15:04:05Z`
    Rfc3339,
    /// `2006-01-02 15:04:05`
    DateTime,
}

impl TimeFormat {
    pub fn format(self, ts: &DateTime<Utc>) -> String {
        match self {
            TimeFormat::Rfc3339 => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimeFormat::DateTime => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Half-open time interval derived from the quals on one column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub since: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Granularity added to inclusive upper bounds.
    pub fn unit() -> Duration {
        Duration::seconds(1)
    }

    /// Folds quals in order; later quals overwrite the bound they set.
    pub fn from_quals<'a, I>(quals: I) -> Self
    where
        I: IntoIterator<Item = &'a Qual>,
    {
        let mut range = Self::default();
        for qual in quals {
            let Some(ts) = qual.value.as_timestamp() else {
                warn!(column = %qual.column, value = %qual.value, "Ignoring non-timestamp range qual");
                continue;
            };
            match qual.operator {
                Operator::Gt | Operator::Ge => range.since = Some(ts),
                Operator::Lt => range.before = Some(ts),
                Operator::Le => range.before = Some(ts + Self::unit()),
                Operator::Eq => {
                    range.since = Some(ts);
                    range.before = Some(ts + Self::unit());
                }
            }
        }
        range
    }

    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.before.is_none()
    }

    pub fn since_param(&self, format: TimeFormat) -> Option<String> {
        self.since.as_ref().map(|ts| format.format(ts))
    }

    pub fn before_param(&self, format: TimeFormat) -> Option<String> {
        self.before.as_ref().map(|ts| format.format(ts))
    }
}
