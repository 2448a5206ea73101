use std::time::Instant;

use breakout_analysis::{
    comparison::analyze_comparisons,
    contribution::analyze_contributions,
    stat_division::{FieldStats, aggregate_field, stat_division},
    subgroup::SubgroupResult,
};
use breakout_data::{
    CompareTargetResolver, FieldLookupResolver, FieldMeta, Filter, MainField, Row, apply_dividers,
};

use crate::{
    clock::{Clock, SystemClock},
    config::StoreConfig,
    export::{ExportedMainField, StoreSnapshot, export_filters},
    observable::{Observable, SubscriptionId},
    stage::{Memo, Version, guarded},
    throttle::Throttle,
};

#[derive(Debug)]
struct Input<T> {
    value: T,
    version: Version,
}

impl<T> Input<T> {
    fn new(value: T) -> Self {
        Self { value, version: 0 }
    }
}

/// Reactive subgroup-discovery store over one immutable dataset.
///
/// See the [crate documentation](crate) for the dataflow.
#[derive(Debug)]
pub struct BreakoutStore {
    data: Vec<Row>,
    fields: Vec<FieldMeta>,
    config: StoreConfig,
    resolver: Box<dyn CompareTargetResolver>,
    clock: Box<dyn Clock>,
    throttle: Throttle,
    destroyed: bool,

    last_version: Version,
    main_field: Input<Option<MainField>>,
    main_field_filters: Input<Vec<Filter>>,
    comparison_filters: Input<Vec<Filter>>,

    global_memo: Memo<Version>,
    main_group_memo: Memo<(Version, Version)>,
    compare_group_memo: Memo<(Version, Version)>,
    general_memo: Memo<(Version, Version)>,
    comparison_memo: Memo<(Version, Version, Version)>,

    next_subscription: u64,
    global_stats: Observable<Option<FieldStats>>,
    selection: Observable<Vec<Row>>,
    selection_stats: Observable<Option<FieldStats>>,
    diff_group: Observable<Vec<Row>>,
    diff_stats: Observable<Option<FieldStats>>,
    general_analyses: Observable<Vec<SubgroupResult>>,
    comparison_analyses: Observable<Vec<SubgroupResult>>,
}

impl BreakoutStore {
    /// Creates a store with the default config, field-id target resolution
    /// and wall-clock throttling.
    #[must_use]
    pub fn new(data: Vec<Row>, fields: Vec<FieldMeta>) -> Self {
        Self::with_config(
            data,
            fields,
            StoreConfig::default(),
            FieldLookupResolver,
            SystemClock,
        )
    }

    #[must_use]
    pub fn with_config(
        data: Vec<Row>,
        fields: Vec<FieldMeta>,
        config: StoreConfig,
        resolver: impl CompareTargetResolver + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        log::info!(
            "creating breakout store: {} rows, {} fields, throttle {:?}",
            data.len(),
            fields.len(),
            config.throttle_interval()
        );
        let mut store = Self {
            throttle: Throttle::new(config.throttle_interval()),
            data,
            fields,
            config,
            resolver: Box::new(resolver),
            clock: Box::new(clock),
            destroyed: false,
            last_version: 0,
            main_field: Input::new(None),
            main_field_filters: Input::new(vec![]),
            comparison_filters: Input::new(vec![]),
            global_memo: Memo::default(),
            main_group_memo: Memo::default(),
            compare_group_memo: Memo::default(),
            general_memo: Memo::default(),
            comparison_memo: Memo::default(),
            next_subscription: 0,
            global_stats: Observable::new(None),
            selection: Observable::new(vec![]),
            selection_stats: Observable::new(None),
            diff_group: Observable::new(vec![]),
            diff_stats: Observable::new(None),
            general_analyses: Observable::new(vec![]),
            comparison_analyses: Observable::new(vec![]),
        };
        store.run_cheap_stages();
        // Nothing to analyze without a main field
        let (general_key, comparison_key) = (store.main_group_key(), store.comparison_key());
        store.general_memo.record(general_key);
        store.comparison_memo.record(comparison_key);
        store
    }

    #[must_use]
    pub fn data(&self) -> &[Row] {
        &self.data
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // Inputs

    #[must_use]
    pub fn main_field(&self) -> Option<&MainField> {
        self.main_field.value.as_ref()
    }

    #[must_use]
    pub fn main_field_filters(&self) -> &[Filter] {
        &self.main_field_filters.value
    }

    #[must_use]
    pub fn comparison_filters(&self) -> &[Filter] {
        &self.comparison_filters.value
    }

    pub fn set_main_field(&mut self, main_field: Option<MainField>) {
        if self.reject_after_destroy("set_main_field") {
            return;
        }
        self.main_field = Input {
            value: main_field,
            version: self.bump_version(),
        };
        self.refresh();
    }

    pub fn set_main_field_filters(&mut self, filters: Vec<Filter>) {
        if self.reject_after_destroy("set_main_field_filters") {
            return;
        }
        self.main_field_filters = Input {
            value: filters,
            version: self.bump_version(),
        };
        self.refresh();
    }

    pub fn set_comparison_filters(&mut self, filters: Vec<Filter>) {
        if self.reject_after_destroy("set_comparison_filters") {
            return;
        }
        self.comparison_filters = Input {
            value: filters,
            version: self.bump_version(),
        };
        self.refresh();
    }

    // Outputs

    #[must_use]
    pub fn global_stats(&self) -> Option<&FieldStats> {
        self.global_stats.get().as_ref()
    }

    #[must_use]
    pub fn selection(&self) -> &[Row] {
        self.selection.get()
    }

    #[must_use]
    pub fn selection_stats(&self) -> Option<&FieldStats> {
        self.selection_stats.get().as_ref()
    }

    #[must_use]
    pub fn diff_group(&self) -> &[Row] {
        self.diff_group.get()
    }

    #[must_use]
    pub fn diff_stats(&self) -> Option<&FieldStats> {
        self.diff_stats.get().as_ref()
    }

    #[must_use]
    pub fn general_analyses(&self) -> &[SubgroupResult] {
        self.general_analyses.get()
    }

    #[must_use]
    pub fn comparison_analyses(&self) -> &[SubgroupResult] {
        self.comparison_analyses.get()
    }

    // Subscriptions

    fn next_subscription_id(&mut self) -> Option<SubscriptionId> {
        if self.reject_after_destroy("subscribe") {
            return None;
        }
        self.next_subscription += 1;
        Some(SubscriptionId(self.next_subscription))
    }

    /// Registers `callback` to run on every republication of `global_stats`.
    ///
    /// After [`destroy`](Self::destroy) the callback is dropped and `None` is
    /// returned.
    pub fn subscribe_global_stats(
        &mut self,
        callback: impl FnMut(&Option<FieldStats>) + 'static,
    ) -> Option<SubscriptionId> {
        let id = self.next_subscription_id()?;
        self.global_stats.subscribe(id, Box::new(callback));
        Some(id)
    }

    pub fn subscribe_selection(
        &mut self,
        callback: impl FnMut(&Vec<Row>) + 'static,
    ) -> Option<SubscriptionId> {
        let id = self.next_subscription_id()?;
        self.selection.subscribe(id, Box::new(callback));
        Some(id)
    }

    pub fn subscribe_selection_stats(
        &mut self,
        callback: impl FnMut(&Option<FieldStats>) + 'static,
    ) -> Option<SubscriptionId> {
        let id = self.next_subscription_id()?;
        self.selection_stats.subscribe(id, Box::new(callback));
        Some(id)
    }

    pub fn subscribe_diff_group(
        &mut self,
        callback: impl FnMut(&Vec<Row>) + 'static,
    ) -> Option<SubscriptionId> {
        let id = self.next_subscription_id()?;
        self.diff_group.subscribe(id, Box::new(callback));
        Some(id)
    }

    pub fn subscribe_diff_stats(
        &mut self,
        callback: impl FnMut(&Option<FieldStats>) + 'static,
    ) -> Option<SubscriptionId> {
        let id = self.next_subscription_id()?;
        self.diff_stats.subscribe(id, Box::new(callback));
        Some(id)
    }

    pub fn subscribe_general_analyses(
        &mut self,
        callback: impl FnMut(&Vec<SubgroupResult>) + 'static,
    ) -> Option<SubscriptionId> {
        let id = self.next_subscription_id()?;
        self.general_analyses.subscribe(id, Box::new(callback));
        Some(id)
    }

    pub fn subscribe_comparison_analyses(
        &mut self,
        callback: impl FnMut(&Vec<SubgroupResult>) + 'static,
    ) -> Option<SubscriptionId> {
        let id = self.next_subscription_id()?;
        self.comparison_analyses.subscribe(id, Box::new(callback));
        Some(id)
    }

    /// Removes a subscription. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.global_stats.unsubscribe(id)
            || self.selection.unsubscribe(id)
            || self.selection_stats.unsubscribe(id)
            || self.diff_group.unsubscribe(id)
            || self.diff_stats.unsubscribe(id)
            || self.general_analyses.unsubscribe(id)
            || self.comparison_analyses.unsubscribe(id)
    }

    // Scheduling

    /// Runs the pending trailing analysis wave if it is due.
    ///
    /// Returns whether a wave ran. Hosts call this from their event loop,
    /// waking up at [`next_deadline`](Self::next_deadline).
    pub fn poll(&mut self) -> bool {
        if self.destroyed || !self.throttle.poll(self.clock.now()) {
            return false;
        }
        self.run_cheap_stages();
        self.run_analyses();
        true
    }

    /// Returns when the pending trailing wave is due, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    /// Blocks until every pending analysis wave has run.
    pub fn settle(&mut self) {
        while let Some(deadline) = self.throttle.deadline() {
            self.clock.sleep_until(deadline);
            self.poll();
        }
    }

    // Persistence

    /// Exports the inputs, annotated with their resolved fields.
    ///
    /// A main field that does not resolve, and filters on unknown fields,
    /// are left out.
    #[must_use]
    pub fn export(&self) -> StoreSnapshot {
        let main_field = self.main_field.value.as_ref().and_then(|main_field| {
            let target = self.resolver.resolve(main_field, &self.fields)?;
            Some(ExportedMainField::new(main_field, &target.field))
        });
        StoreSnapshot {
            main_field,
            main_field_filters: export_filters(&self.main_field_filters.value, &self.fields),
            comparison_filters: export_filters(&self.comparison_filters.value, &self.fields),
        }
    }

    /// Replaces all three inputs from a snapshot, in a single update.
    pub fn restore(&mut self, snapshot: &StoreSnapshot) {
        if self.reject_after_destroy("restore") {
            return;
        }
        let version = self.bump_version();
        self.main_field = Input {
            value: snapshot.main_field.as_ref().map(|e| e.main_field.clone()),
            version,
        };
        self.main_field_filters = Input {
            value: StoreSnapshot::filters(&snapshot.main_field_filters),
            version,
        };
        self.comparison_filters = Input {
            value: StoreSnapshot::filters(&snapshot.comparison_filters),
            version,
        };
        self.refresh();
    }

    /// Tears the store down: drops every subscriber and the pending wave.
    ///
    /// Later mutations are ignored. Calling this again has no effect.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.throttle.cancel();
        self.global_stats.clear();
        self.selection.clear();
        self.selection_stats.clear();
        self.diff_group.clear();
        self.diff_stats.clear();
        self.general_analyses.clear();
        self.comparison_analyses.clear();
        log::info!("breakout store destroyed");
    }

    fn reject_after_destroy(&self, operation: &str) -> bool {
        if self.destroyed {
            log::warn!("{operation} called on a destroyed breakout store, ignoring");
        }
        self.destroyed
    }

    fn bump_version(&mut self) -> Version {
        self.last_version += 1;
        self.last_version
    }

    // Dataflow

    fn refresh(&mut self) {
        self.run_cheap_stages();
        if self.throttle.request(self.clock.now()) {
            self.run_analyses();
        } else {
            log::debug!(
                "analyses deferred until {:?}",
                self.throttle
                    .deadline()
                    .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
            );
        }
    }

    fn run_cheap_stages(&mut self) {
        self.run_global();
        self.run_main_group();
        self.run_compare_group();
    }

    fn run_analyses(&mut self) {
        let general_key = self.main_group_key();
        if !self.general_memo.is_current(&general_key) {
            if !(self.global_is_current() && self.main_group_is_current()) {
                log::debug!("general analyses wait for their upstream stages");
            } else if let Some(results) = guarded("general_analyses", || self.compute_general()) {
                log::debug!("publishing {} general analyses", results.len());
                self.general_memo.record(general_key);
                self.general_analyses.publish(results);
            }
        }

        let comparison_key = self.comparison_key();
        if !self.comparison_memo.is_current(&comparison_key) {
            if !(self.global_is_current()
                && self.main_group_is_current()
                && self.compare_group_is_current())
            {
                log::debug!("comparison analyses wait for their upstream stages");
            } else if let Some(results) =
                guarded("comparison_analyses", || self.compute_comparison())
            {
                log::debug!("publishing {} comparison analyses", results.len());
                self.comparison_memo.record(comparison_key);
                self.comparison_analyses.publish(results);
            }
        }
    }

    fn comparison_key(&self) -> (Version, Version, Version) {
        (
            self.main_field.version,
            self.main_field_filters.version,
            self.comparison_filters.version,
        )
    }

    fn main_group_key(&self) -> (Version, Version) {
        (self.main_field.version, self.main_field_filters.version)
    }

    fn compare_group_key(&self) -> (Version, Version) {
        (self.main_field.version, self.comparison_filters.version)
    }

    fn global_is_current(&self) -> bool {
        self.global_memo.is_current(&self.main_field.version)
    }

    fn main_group_is_current(&self) -> bool {
        self.main_group_memo.is_current(&self.main_group_key())
    }

    fn compare_group_is_current(&self) -> bool {
        self.compare_group_memo.is_current(&self.compare_group_key())
    }

    // A stage whose guard fails keeps its previous output and leaves its key
    // unrecorded. Its downstream stages then stay put until a later wave
    // succeeds.

    fn run_global(&mut self) {
        if self.global_is_current() {
            return;
        }
        if let Some(stats) = guarded("global", || self.compute_global()) {
            let key = self.main_field.version;
            self.global_memo.record(key);
            self.global_stats.publish(stats);
        }
    }

    fn run_main_group(&mut self) {
        if self.main_group_is_current() {
            return;
        }
        if !self.global_is_current() {
            log::debug!("main group waits for the global stage");
            return;
        }
        if let Some((selection, stats)) = guarded("main_group", || self.compute_main_group()) {
            let key = self.main_group_key();
            self.main_group_memo.record(key);
            self.selection.publish(selection);
            self.selection_stats.publish(stats);
        }
    }

    fn run_compare_group(&mut self) {
        if self.compare_group_is_current() {
            return;
        }
        if !self.global_is_current() {
            log::debug!("compare group waits for the global stage");
            return;
        }
        if let Some((diff_group, stats)) = guarded("compare_group", || self.compute_compare_group())
        {
            let key = self.compare_group_key();
            self.compare_group_memo.record(key);
            self.diff_group.publish(diff_group);
            self.diff_stats.publish(stats);
        }
    }

    fn compute_global(&self) -> Option<FieldStats> {
        let main_field = self.main_field.value.as_ref()?;
        let Some(target) = self.resolver.resolve(main_field, &self.fields) else {
            log::debug!("main field {main_field} does not resolve to a known field");
            return None;
        };
        let stats = aggregate_field(&self.data, &target.field.fid);
        log::debug!(
            "global {main_field} over '{}': {:?}",
            target.field.fid,
            stats.get(main_field.aggregator)
        );
        Some(FieldStats {
            definition: main_field.clone(),
            field: target.field,
            stats,
        })
    }

    fn compute_main_group(&self) -> (Vec<Row>, Option<FieldStats>) {
        let filters = &self.main_field_filters.value;
        let selection = apply_dividers(&self.data, filters).matched;
        let stats = self.subset_stats("selection", &selection, filters);
        (selection, stats)
    }

    fn compute_compare_group(&self) -> (Vec<Row>, Option<FieldStats>) {
        let filters = &self.comparison_filters.value;
        if filters.is_empty() || self.global_stats.get().is_none() {
            return (vec![], None);
        }
        let diff_group = apply_dividers(&self.data, filters).matched;
        let stats = self.subset_stats("comparison", &diff_group, filters);
        (diff_group, stats)
    }

    fn subset_stats(&self, name: &str, subset: &[Row], filters: &[Filter]) -> Option<FieldStats> {
        if filters.is_empty() {
            return None;
        }
        let global = self.global_stats.get().as_ref()?;
        let division = stat_division(&self.data, subset, &self.fields, &global.field.fid)?;
        log::debug!(
            "{name} group of {} rows: (global, subset) = {:?}",
            subset.len(),
            division.get(global.definition.aggregator)
        );
        Some(FieldStats {
            definition: global.definition.clone(),
            field: global.field.clone(),
            stats: division.subset,
        })
    }

    fn target(global: &FieldStats) -> MainField {
        MainField::new(global.field.fid.clone(), global.definition.aggregator)
    }

    fn compute_general(&self) -> Vec<SubgroupResult> {
        let Some(global) = self.global_stats.get() else {
            return vec![];
        };
        analyze_contributions(
            self.selection.get(),
            &self.fields,
            &Self::target(global),
            &global.stats,
            &self.config.bucket_policy,
        )
        .unwrap_or_else(|err| {
            log::warn!("general analysis of {} failed: {err}", global.definition);
            vec![]
        })
    }

    fn compute_comparison(&self) -> Vec<SubgroupResult> {
        let Some(global) = self.global_stats.get() else {
            return vec![];
        };
        if self.comparison_filters.value.is_empty() {
            return vec![];
        }
        analyze_comparisons(
            self.selection.get(),
            self.diff_group.get(),
            &self.fields,
            &Self::target(global),
            &self.config.bucket_policy,
        )
        .unwrap_or_else(|err| {
            log::warn!("comparison analysis of {} failed: {err}", global.definition);
            vec![]
        })
    }
}

impl Drop for BreakoutStore {
    fn drop(&mut self) {
        self.destroy();
    }
}
