//! Query state and the composed search, filter, sort pipeline.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::filter::{apply_filters, FilterMap};
use crate::ordering::{sort, Dir, SortDirective};
use crate::search::search;
use crate::traits::Seekable;

/// Everything a list view's controls feed into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryState {
    /// Free-text query from the search box.
    pub query: String,
    /// Filter panel selections.
    pub filters: FilterMap,
    /// Field to sort by.
    pub sort_by: String,
    /// Sort direction.
    pub sort_order: Dir,
}

impl Default for QueryState {
    fn default() -> Self {
        QueryState::sorted_by(SortDirective::default())
    }
}

impl QueryState {
    /// Creates an empty state with the given sort directive.
    pub fn sorted_by(directive: SortDirective) -> Self {
        QueryState {
            query: String::new(),
            filters: FilterMap::new(),
            sort_by: directive.field,
            sort_order: directive.order,
        }
    }

    /// Sets the free-text query, returning the state for chaining.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Sets one filter, returning the state for chaining.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters = self.filters.with(key, value);
        self
    }

    /// Sets the sort directive, returning the state for chaining.
    pub fn with_sort(mut self, field: impl Into<String>, order: Dir) -> Self {
        self.sort_by = field.into();
        self.sort_order = order;
        self
    }

    /// Returns the current sort directive.
    pub fn directive(&self) -> SortDirective {
        SortDirective::new(self.sort_by.clone(), self.sort_order)
    }

    /// Returns `true` when neither the query nor any filter narrows results.
    pub fn is_unfiltered(&self) -> bool {
        self.query.is_empty() && !self.filters.has_active()
    }

    /// Clears the query and every filter. The sort directive is kept.
    pub fn clear(&mut self) {
        self.query.clear();
        self.filters = FilterMap::new();
    }
}

/// Ordered results plus the counts a view shows as "X of Y".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<'a, T> {
    pub results: Vec<&'a T>,
    pub result_count: usize,
    pub total_count: usize,
}

impl<'a, T> QueryResult<'a, T> {
    /// Wraps an ordered result set drawn from a collection of `total_count`
    /// items.
    pub fn new(results: Vec<&'a T>, total_count: usize) -> Self {
        QueryResult {
            result_count: results.len(),
            results,
            total_count,
        }
    }

    /// Returns `true` if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates over results in order.
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.results.iter().copied()
    }
}

/// Runs search, then filters, then sort.
///
/// Sorting always applies: with an empty query and no active filters the
/// result is the whole collection ordered by the state's directive, not the
/// input order.
pub fn run_query<'a, T, Tz>(
    items: &'a [T],
    state: &QueryState,
    config: &SearchConfig,
    now: &DateTime<Tz>,
) -> QueryResult<'a, T>
where
    T: Seekable,
    Tz: TimeZone,
{
    let found = search(items, &state.query, &config.search_fields);
    let filtered = apply_filters(found, &state.filters, now);
    let sorted = sort(filtered, &state.directive(), &config.date_fields);
    QueryResult::new(sorted, items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 9, 0, 0).unwrap()
    }

    fn tasks() -> Vec<Record> {
        vec![
            Record::new()
                .with("title", "Fix bug")
                .with("status", "pending")
                .with("priority", "High")
                .with("created", "2024-01-01"),
            Record::new()
                .with("title", "Write docs")
                .with("status", "done")
                .with("priority", "Low")
                .with("created", "2024-02-01"),
        ]
    }

    fn titles<'a>(result: &QueryResult<'a, Record>) -> Vec<&'a str> {
        result
            .iter()
            .map(|r| r.field_value("title").as_str().unwrap_or(""))
            .collect()
    }

    #[test]
    fn text_query_scenario() {
        let items = tasks();
        let state = QueryState::default().with_query("fix");
        let result = run_query(&items, &state, &SearchConfig::new(["title"]), &now());

        assert_eq!(titles(&result), ["Fix bug"]);
        assert_eq!(result.result_count, 1);
        assert_eq!(result.total_count, 2);
    }

    #[test]
    fn unfiltered_result_is_still_sorted() {
        let items = tasks();
        let state = QueryState::default();
        let result = run_query(&items, &state, &SearchConfig::new(["title"]), &now());

        assert!(state.is_unfiltered());
        assert_eq!(titles(&result), ["Write docs", "Fix bug"]);
        assert_eq!(result.result_count, result.total_count);
    }

    #[test]
    fn query_and_filters_compose() {
        let items = tasks();
        let state = QueryState::default()
            .with_query("i")
            .with_filter("status", "done")
            .with_sort("title", Dir::Asc);
        let result = run_query(&items, &state, &SearchConfig::new(["title"]), &now());

        assert_eq!(titles(&result), ["Write docs"]);
        assert_eq!(result.total_count, 2);
    }

    #[test]
    fn clear_keeps_sort() {
        let mut state = QueryState::default()
            .with_query("x")
            .with_filter("status", "done")
            .with_sort("priority", Dir::Asc);
        state.clear();

        assert!(state.is_unfiltered());
        assert_eq!(state.directive(), SortDirective::asc("priority"));
    }

    #[test]
    fn state_serde_uses_camel_case() {
        let state: QueryState = serde_json::from_str(
            r#"{"query": "fix", "filters": {"status": "all"}, "sortBy": "title", "sortOrder": "asc"}"#,
        )
        .unwrap();

        assert_eq!(state.query, "fix");
        assert!(!state.filters.has_active());
        assert_eq!(state.directive(), SortDirective::asc("title"));
    }

    #[test]
    fn result_serializes_counts() {
        let items = tasks();
        let state = QueryState::default().with_query("docs");
        let result = run_query(&items, &state, &SearchConfig::new(["title"]), &now());
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["resultCount"], 1);
        assert_eq!(json["totalCount"], 2);
        assert_eq!(json["results"][0]["title"], "Write docs");
    }
}
