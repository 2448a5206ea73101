use std::{collections::BTreeMap, path::Path};

use breakout_data::{FieldMeta, Row, SemanticType, Value, parse_temporal};

use crate::util::read_json_file;

/// Reads a JSON array of row objects, normalizing temporal fields.
pub fn read_rows(path: &Path, fields: &[FieldMeta]) -> anyhow::Result<Vec<Row>> {
    let raw: Vec<BTreeMap<String, Value>> = read_json_file("data", path)?;
    let temporal = fields
        .iter()
        .filter(|field| field.semantic_type == SemanticType::Temporal)
        .map(|field| field.fid.as_str())
        .collect::<Vec<_>>();

    let mut unparsed = 0;
    let rows = raw
        .into_iter()
        .map(|mut cells| {
            for fid in &temporal {
                if let Some(value) = cells.get_mut(*fid) {
                    unparsed += usize::from(!normalize_temporal(value));
                }
            }
            Row::new(cells)
        })
        .collect::<Vec<_>>();

    if unparsed > 0 {
        log::warn!("{unparsed} temporal values could not be parsed and are treated as missing");
    }
    log::info!("loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Rewrites a textual date into epoch milliseconds.
///
/// Returns `false` when the text is not a date; the value is then cleared.
fn normalize_temporal(value: &mut Value) -> bool {
    let Value::Text(text) = value else {
        return true;
    };
    match parse_temporal(text) {
        Some(millis) => {
            *value = Value::Number(millis);
            true
        }
        None => {
            *value = Value::Null;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_temporal() {
        let mut date = Value::from("1970-01-02");
        assert!(normalize_temporal(&mut date));
        assert_eq!(date, Value::Number(86_400_000.0));

        let mut number = Value::Number(5.0);
        assert!(normalize_temporal(&mut number));
        assert_eq!(number, Value::Number(5.0));

        let mut garbage = Value::from("soon");
        assert!(!normalize_temporal(&mut garbage));
        assert_eq!(garbage, Value::Null);
    }
}
