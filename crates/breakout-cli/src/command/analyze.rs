use std::path::PathBuf;

use breakout_analysis::{stat_division::FieldStats, subgroup::SubgroupResult};
use breakout_data::{FieldLookupResolver, FieldMeta};
use breakout_store::{BreakoutStore, StoreConfig, StoreSnapshot, SystemClock};
use serde::Serialize;

use crate::{
    dataset::read_rows,
    util::{read_json_file, save_json},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AnalyzeArg {
    /// Dataset file: a JSON array of row objects
    #[arg(long)]
    data: PathBuf,
    /// Field metadata file: a JSON array of field descriptors
    #[arg(long)]
    fields: PathBuf,
    /// Session file, as written by a previous export
    #[arg(long)]
    session: Option<PathBuf>,
    /// Store configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the analysis throttle interval
    #[arg(long)]
    throttle_ms: Option<u64>,
    /// Override the target number of bins for continuous fields
    #[arg(long)]
    bins: Option<usize>,
    /// Keep only the best N results of each analysis
    #[arg(long, default_value_t = 10)]
    top: usize,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AnalyzeReport<'a> {
    session: StoreSnapshot,
    rows: usize,
    global_stats: Option<&'a FieldStats>,
    selection_size: usize,
    selection_stats: Option<&'a FieldStats>,
    diff_group_size: usize,
    diff_stats: Option<&'a FieldStats>,
    general_analyses: &'a [SubgroupResult],
    comparison_analyses: &'a [SubgroupResult],
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let AnalyzeArg {
        data,
        fields,
        session,
        config,
        throttle_ms,
        bins,
        top,
        output,
    } = arg;

    let mut config = match config {
        Some(path) => read_json_file::<StoreConfig, _>("config", path)?,
        None => StoreConfig::default(),
    };
    if let Some(throttle_ms) = throttle_ms {
        config.throttle_ms = *throttle_ms;
    }
    if let Some(bins) = bins {
        config.bucket_policy.quantitative_bins = *bins;
    }

    let fields: Vec<FieldMeta> = read_json_file("fields", fields)?;
    let rows = read_rows(data, &fields)?;
    let snapshot = match session {
        Some(path) => read_json_file::<StoreSnapshot, _>("session", path)?,
        None => StoreSnapshot::default(),
    };

    let mut store =
        BreakoutStore::with_config(rows, fields, config, FieldLookupResolver, SystemClock);
    store.restore(&snapshot);
    store.settle();

    let truncate = |results: &[SubgroupResult]| results.len().min(*top);
    let general = store.general_analyses();
    let comparison = store.comparison_analyses();
    let report = AnalyzeReport {
        session: store.export(),
        rows: store.data().len(),
        global_stats: store.global_stats(),
        selection_size: store.selection().len(),
        selection_stats: store.selection_stats(),
        diff_group_size: store.diff_group().len(),
        diff_stats: store.diff_stats(),
        general_analyses: &general[..truncate(general)],
        comparison_analyses: &comparison[..truncate(comparison)],
    };
    save_json(&report, output.as_deref())?;
    Ok(())
}
