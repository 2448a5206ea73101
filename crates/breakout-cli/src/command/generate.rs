use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context;
use breakout_data::{AnalyticRole, FieldMeta, SemanticType, Value};
use chrono::{Days, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rand_pcg::Pcg32;

use crate::util::save_json;

/// Cities with their price per square meter.
const CITIES: [(&str, f64); 4] = [
    ("Oslo", 98_000.0),
    ("Bergen", 61_000.0),
    ("Trondheim", 57_000.0),
    ("Stavanger", 52_000.0),
];
const LISTING_DAYS: u64 = 365;
const PRICE_COVERAGE: f64 = 0.95;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateArg {
    /// Number of rows to generate
    #[arg(long, default_value_t = 1000)]
    rows: usize,
    /// Random seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path for the rows
    #[arg(long)]
    output: Option<PathBuf>,
    /// Output file path for the field metadata
    #[arg(long)]
    fields_output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateArg) -> anyhow::Result<()> {
    let seed = arg.seed.unwrap_or_else(rand::random);
    log::info!("generating {} rows with seed {seed}", arg.rows);

    let mut rng = Pcg32::seed_from_u64(seed);
    let rows = generate_rows(arg.rows, &mut rng)?;
    save_json(&rows, arg.output.as_deref())?;
    if let Some(path) = &arg.fields_output {
        save_json(&fields(), Some(path))?;
    }
    Ok(())
}

/// Field metadata of the generated listings.
fn fields() -> Vec<FieldMeta> {
    use AnalyticRole::{Dimension, Measure};
    use SemanticType::{Nominal, Ordinal, Quantitative, Temporal};
    vec![
        FieldMeta::new("city", "City", Nominal, Dimension),
        FieldMeta::new("rooms", "Rooms", Ordinal, Dimension),
        FieldMeta::new("area", "Area (m²)", Quantitative, Measure),
        FieldMeta::new("listed", "Listed on", Temporal, Dimension),
        FieldMeta::new("price", "Price", Quantitative, Measure),
    ]
}

/// Generates housing listings: price follows the city and the area, area
/// follows the number of rooms, and a few prices are missing.
fn generate_rows<R>(count: usize, rng: &mut R) -> anyhow::Result<Vec<BTreeMap<String, Value>>>
where
    R: Rng,
{
    let area_noise = Normal::new(0.0, 12.0)?;
    let price_noise = Normal::new(1.0, 0.08)?;
    let first_day = NaiveDate::from_ymd_opt(2024, 1, 1).context("Invalid first listing day")?;

    let rows = (0..count)
        .map(|_| {
            let (city, price_per_sqm) = CITIES[rng.random_range(0..CITIES.len())];
            let rooms = rng.random_range(1..=5_u32);
            let area = (25.0 + 22.0 * f64::from(rooms) + rng.sample(area_noise))
                .max(15.0)
                .round();
            let listed = first_day + Days::new(rng.random_range(0..LISTING_DAYS));
            let price = if rng.random_bool(PRICE_COVERAGE) {
                Value::from((price_per_sqm * area * rng.sample(price_noise)).round())
            } else {
                Value::Null
            };
            BTreeMap::from([
                ("city".to_owned(), Value::from(city)),
                ("rooms".to_owned(), Value::from(f64::from(rooms))),
                ("area".to_owned(), Value::from(area)),
                (
                    "listed".to_owned(),
                    Value::from(listed.format("%Y-%m-%d").to_string()),
                ),
                ("price".to_owned(), price),
            ])
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use breakout_data::{Aggregator, Filter, MainField, Row};
    use breakout_store::{BreakoutStore, StoreSnapshot};

    use super::*;

    #[test]
    fn test_same_seed_same_rows() {
        let a = generate_rows(50, &mut Pcg32::seed_from_u64(7)).unwrap();
        let b = generate_rows(50, &mut Pcg32::seed_from_u64(7)).unwrap();
        let c = generate_rows(50, &mut Pcg32::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_every_field_is_generated() {
        let fields = fields();
        let rows = generate_rows(20, &mut Pcg32::seed_from_u64(1)).unwrap();
        for row in &rows {
            assert_eq!(row.len(), fields.len());
            assert!(fields.iter().all(|field| row.contains_key(&field.fid)));
        }
    }

    #[test]
    fn test_generated_data_drives_the_store() {
        let fields = fields();
        let rows = generate_rows(400, &mut Pcg32::seed_from_u64(42))
            .unwrap()
            .into_iter()
            .map(Row::new)
            .collect();
        let mut store = BreakoutStore::new(rows, fields);
        store.set_main_field(Some(MainField::new("price", Aggregator::Mean)));
        store.set_main_field_filters(vec![Filter::values("city", ["Oslo"])]);
        store.set_comparison_filters(vec![Filter::values("city", ["Bergen"])]);
        store.settle();

        let selection = store.selection_stats().unwrap().value().unwrap();
        let comparison = store.diff_stats().unwrap().value().unwrap();
        assert!(selection > comparison);
        assert!(!store.general_analyses().is_empty());
        assert!(!store.comparison_analyses().is_empty());
        assert!(
            store
                .general_analyses()
                .iter()
                .all(|result| result.fid != "price")
        );

        let snapshot: StoreSnapshot = store.export();
        assert_eq!(snapshot.main_field_filters.len(), 1);
        assert_eq!(snapshot.main_field_filters[0].name, "City");
    }
}
