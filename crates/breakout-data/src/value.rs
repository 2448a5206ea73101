use std::{cmp::Ordering, hash::Hash};

use breakout_stats::aggregate::Observation;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// A scalar cell value.
///
/// JSON `null` deserializes to [`Value::Null`]; numbers and strings map to
/// their respective variants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Null | Value::Text(_) => None,
        }
    }

    /// Returns the position of this value on an ordered axis.
    ///
    /// Numbers are their own position. Text is accepted when it is an RFC 3339
    /// timestamp or a `YYYY-MM-DD` date, positioned at its epoch milliseconds.
    #[must_use]
    pub fn as_ordered(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(text) => parse_temporal(text),
            Value::Null => None,
        }
    }

    /// Converts this value into an aggregation observation.
    #[must_use]
    pub fn observation(&self) -> Observation {
        match self {
            Value::Null => Observation::Missing,
            Value::Number(n) => Observation::Number(*n),
            Value::Text(_) => Observation::Present,
        }
    }

    #[must_use]
    pub fn category_key(&self) -> CategoryKey {
        match self {
            Value::Null => CategoryKey::Missing,
            Value::Number(n) => CategoryKey::Number(*n),
            Value::Text(s) => CategoryKey::Text(s.clone()),
        }
    }
}

/// Parses RFC 3339 timestamps and `YYYY-MM-DD` dates (as UTC midnight) into
/// epoch milliseconds.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn parse_temporal(text: &str) -> Option<f64> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.timestamp_millis() as f64);
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64)
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Hashable, totally ordered identity of a categorical value.
///
/// Ordering: `Missing < Number < Text`, numbers by [`f64::total_cmp`].
/// `-0.0` and `0.0` are the same category.
#[derive(Debug, Clone)]
pub enum CategoryKey {
    Missing,
    Number(f64),
    Text(String),
}

impl CategoryKey {
    fn rank(&self) -> u8 {
        match self {
            CategoryKey::Missing => 0,
            CategoryKey::Number(_) => 1,
            CategoryKey::Text(_) => 2,
        }
    }

    fn normalized_number(n: f64) -> f64 {
        if n == 0.0 { 0.0 } else { n }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            CategoryKey::Missing => Value::Null,
            CategoryKey::Number(n) => Value::Number(*n),
            CategoryKey::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl PartialEq for CategoryKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for CategoryKey {}

impl PartialOrd for CategoryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CategoryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CategoryKey::Number(a), CategoryKey::Number(b)) => {
                Self::normalized_number(*a).total_cmp(&Self::normalized_number(*b))
            }
            (CategoryKey::Text(a), CategoryKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for CategoryKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            CategoryKey::Missing => {}
            CategoryKey::Number(n) => Self::normalized_number(*n).to_bits().hash(state),
            CategoryKey::Text(s) => s.hash(state),
        }
    }
}
