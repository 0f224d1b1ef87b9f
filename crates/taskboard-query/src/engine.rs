//! Cached query engine for one list view.
//!
//! [`QueryEngine`] owns a view's item snapshot, its [`SearchConfig`] and its
//! [`QueryState`], and hands out the ordered result set. Results are derived
//! from scratch, but only when an input has changed since the last
//! derivation: every change bumps a revision counter, and the cached
//! ordering is reused while the revision stays the same.
//!
//! ```
//! use taskboard_query::{QueryEngine, Record, SearchConfig};
//!
//! let mut engine = QueryEngine::new(SearchConfig::new(["title"]));
//! engine.set_items(vec![
//!     Record::new().with("title", "Fix bug").with("created", "2024-01-01"),
//!     Record::new().with("title", "Write docs").with("created", "2024-02-01"),
//! ]);
//! engine.set_query("fix");
//!
//! let result = engine.results();
//! assert_eq!(result.result_count, 1);
//! assert_eq!(result.total_count, 2);
//! ```

use chrono::{DateTime, FixedOffset, Local};

use crate::config::SearchConfig;
use crate::filter::FilterMap;
use crate::ordering::{Dir, SortDirective};
use crate::query::{run_query, QueryResult, QueryState};
use crate::traits::{Indexed, Seekable};

/// Source of "now" for due date buckets.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Derived {
    revision: u64,
    order: Vec<usize>,
}

/// Search, filter and sort state for one view, with cached results.
#[derive(Debug)]
pub struct QueryEngine<T, C = SystemClock> {
    items: Vec<T>,
    config: SearchConfig,
    state: QueryState,
    clock: C,
    revision: u64,
    derived: Option<Derived>,
}

impl<T: Seekable> QueryEngine<T, SystemClock> {
    /// Creates an engine with no items, reading time from the local clock.
    ///
    /// The state starts empty and sorted by the config's default directive.
    pub fn new(config: SearchConfig) -> Self {
        QueryEngine::with_clock(config, SystemClock)
    }
}

impl<T: Seekable, C: Clock> QueryEngine<T, C> {
    /// Creates an engine with no items and the given clock.
    pub fn with_clock(config: SearchConfig, clock: C) -> Self {
        QueryEngine {
            items: Vec::new(),
            state: QueryState::sorted_by(config.default_sort.clone()),
            config,
            clock,
            revision: 0,
            derived: None,
        }
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Replaces the item snapshot. Always counts as a change.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.bump();
    }

    /// Replaces the configuration. Always counts as a change.
    ///
    /// The current query state is kept, including its sort directive.
    pub fn set_config(&mut self, config: SearchConfig) {
        self.config = config;
        self.bump();
    }

    /// Sets the free-text query.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if self.state.query != query {
            self.state.query = query;
            self.bump();
        }
    }

    /// Replaces every filter.
    pub fn set_filters(&mut self, filters: FilterMap) {
        if self.state.filters != filters {
            self.state.filters = filters;
            self.bump();
        }
    }

    /// Sets or clears a single filter.
    pub fn set_filter(&mut self, key: impl Into<String>, value: Option<String>) {
        let mut filters = self.state.filters.clone();
        filters.set(key, value);
        self.set_filters(filters);
    }

    /// Sets the sort field.
    pub fn set_sort_by(&mut self, field: impl Into<String>) {
        let field = field.into();
        if self.state.sort_by != field {
            self.state.sort_by = field;
            self.bump();
        }
    }

    /// Sets the sort direction.
    pub fn set_sort_order(&mut self, order: Dir) {
        if self.state.sort_order != order {
            self.state.sort_order = order;
            self.bump();
        }
    }

    /// Sets sort field and direction together.
    pub fn set_sort(&mut self, directive: SortDirective) {
        self.set_sort_by(directive.field);
        self.set_sort_order(directive.order);
    }

    /// Resets the query **and** the filters in one step. The sort directive
    /// is left alone.
    pub fn clear_filters(&mut self) {
        if !self.state.query.is_empty() || !self.state.filters.is_empty() {
            self.state.clear();
            self.bump();
        }
    }

    // ========================================================================
    // Derivation
    // ========================================================================

    /// Forces the next [`results`](Self::results) call to derive again,
    /// e.g. after the calendar day has rolled over.
    pub fn invalidate(&mut self) {
        self.bump();
    }

    /// Returns `true` if the cached results no longer match the inputs.
    pub fn is_stale(&self) -> bool {
        self.derived
            .as_ref()
            .map_or(true, |derived| derived.revision != self.revision)
    }

    /// Returns the ordered results, deriving them only if an input changed.
    pub fn results(&mut self) -> QueryResult<'_, T> {
        if self.is_stale() {
            self.derive();
        } else {
            tracing::trace!(revision = self.revision, "query results cached");
        }
        let order = self.derived.as_ref().map_or(&[][..], |d| d.order.as_slice());
        QueryResult::new(
            order.iter().map(|&i| &self.items[i]).collect(),
            self.items.len(),
        )
    }

    /// Invalidates and derives immediately.
    pub fn recompute(&mut self) -> QueryResult<'_, T> {
        self.invalidate();
        self.results()
    }

    fn derive(&mut self) {
        let now = self.clock.now();
        let indexed = Indexed::all(&self.items);
        let result = run_query(&indexed, &self.state, &self.config, &now);
        let order: Vec<usize> = result.iter().map(|entry| entry.index).collect();

        tracing::debug!(
            revision = self.revision,
            total = result.total_count,
            matched = result.result_count,
            sort_by = %self.state.sort_by,
            sort_order = %self.state.sort_order,
            "recomputed query results"
        );

        self.derived = Some(Derived {
            revision: self.revision,
            order,
        });
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the item snapshot in input order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns the current query state.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Returns the input revision. It increases on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use chrono::TimeZone;

    fn clock() -> FixedClock {
        let utc = FixedOffset::east_opt(0).unwrap();
        FixedClock(utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap())
    }

    fn engine() -> QueryEngine<Record, FixedClock> {
        let mut engine = QueryEngine::with_clock(SearchConfig::new(["title"]), clock());
        engine.set_items(vec![
            Record::new()
                .with("title", "Fix bug")
                .with("status", "pending")
                .with("priority", "High")
                .with("dueDate", "2024-06-12")
                .with("created", "2024-01-01"),
            Record::new()
                .with("title", "Write docs")
                .with("status", "done")
                .with("priority", "Low")
                .with("created", "2024-02-01"),
            Record::new()
                .with("title", "Fix flaky test")
                .with("status", "pending")
                .with("priority", "Urgent")
                .with("dueDate", "2024-06-13")
                .with("created", "2024-03-01"),
        ]);
        engine
    }

    fn titles(engine: &mut QueryEngine<Record, FixedClock>) -> Vec<String> {
        engine
            .results()
            .iter()
            .map(|r| r.field_value("title").as_str().unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn starts_sorted_by_config_default() {
        let mut engine = engine();
        assert_eq!(engine.state().directive(), SortDirective::desc("created"));
        assert_eq!(titles(&mut engine), ["Fix flaky test", "Write docs", "Fix bug"]);
    }

    #[test]
    fn custom_default_sort() {
        let config = SearchConfig::new(["title"]).with_default_sort(SortDirective::asc("title"));
        let engine: QueryEngine<Record, _> = QueryEngine::with_clock(config, clock());
        assert_eq!(engine.state().directive(), SortDirective::asc("title"));
    }

    #[test]
    fn setters_drive_results() {
        let mut engine = engine();
        engine.set_query("fix");
        engine.set_sort_by("priority");
        assert_eq!(titles(&mut engine), ["Fix flaky test", "Fix bug"]);

        engine.set_sort_order(Dir::Asc);
        assert_eq!(titles(&mut engine), ["Fix bug", "Fix flaky test"]);

        engine.set_filter("dueDate", Some("today".to_string()));
        assert_eq!(titles(&mut engine), ["Fix bug"]);

        let result = engine.results();
        assert_eq!(result.result_count, 1);
        assert_eq!(result.total_count, 3);
    }

    #[test]
    fn unchanged_inputs_reuse_cache() {
        let mut engine = engine();
        engine.results();
        let revision = engine.revision();
        assert!(!engine.is_stale());

        engine.set_query("");
        engine.set_sort(SortDirective::desc("created"));
        engine.set_filters(FilterMap::new());
        engine.clear_filters();

        assert_eq!(engine.revision(), revision);
        assert!(!engine.is_stale());
    }

    #[test]
    fn changes_mark_results_stale() {
        let mut engine = engine();
        engine.results();

        engine.set_query("docs");
        assert!(engine.is_stale());
        engine.results();
        assert!(!engine.is_stale());

        engine.invalidate();
        assert!(engine.is_stale());
        assert_eq!(engine.recompute().result_count, 1);
        assert!(!engine.is_stale());
    }

    #[test]
    fn new_items_always_recompute() {
        let mut engine = engine();
        engine.results();

        let items = engine.items().to_vec();
        engine.set_items(items);
        assert!(engine.is_stale());
    }

    #[test]
    fn clear_filters_resets_query_too() {
        let mut engine = engine();
        engine.set_query("fix");
        engine.set_filter("status", Some("pending".to_string()));
        engine.set_sort(SortDirective::asc("title"));

        engine.clear_filters();

        assert_eq!(engine.state().query, "");
        assert!(engine.state().filters.is_empty());
        assert_eq!(engine.state().directive(), SortDirective::asc("title"));
        assert_eq!(engine.results().result_count, 3);
    }

    #[test]
    fn empty_engine() {
        let mut engine: QueryEngine<Record, _> =
            QueryEngine::with_clock(SearchConfig::default(), clock());
        let result = engine.results();
        assert!(result.is_empty());
        assert_eq!(result.total_count, 0);
    }

    #[test]
    fn items_are_not_reordered() {
        let mut engine = engine();
        engine.set_sort(SortDirective::asc("title"));
        engine.results();

        let first = engine.items()[0].field_value("title");
        assert_eq!(first.as_str(), Some("Fix bug"));
    }
}
