use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::value::Value;

static MISSING: Value = Value::Null;

/// An immutable mapping from field id to value.
///
/// Rows are reference counted: cloning a row (e.g. into a filtered subset)
/// does not copy its cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Arc<BTreeMap<String, Value>>);

impl Row {
    #[must_use]
    pub fn new(cells: BTreeMap<String, Value>) -> Self {
        Self(Arc::new(cells))
    }

    /// Returns the value of `fid`, or [`Value::Null`] when absent.
    #[must_use]
    pub fn get(&self, fid: &str) -> &Value {
        self.0.get(fid).unwrap_or(&MISSING)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns whether both handles point at the same row allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Row) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_field_is_missing() {
        let row = Row::from_iter([("a", 1.0)]);
        assert_eq!(row.get("a"), &Value::Number(1.0));
        assert!(row.get("b").is_missing());
    }

    #[test]
    fn test_clone_shares_cells() {
        let row = Row::from_iter([("a", "x")]);
        let copy = row.clone();
        assert!(row.ptr_eq(&copy));
    }

    #[test]
    fn test_deserialize_from_object() {
        let row: Row = serde_json::from_str(r#"{"a": 1, "b": "x", "c": null}"#).unwrap();
        assert_eq!(row.get("a"), &Value::Number(1.0));
        assert_eq!(row.get("b"), &Value::Text("x".into()));
        assert!(row.get("c").is_missing());
    }
}
