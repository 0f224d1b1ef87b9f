//! Taskboard query engine: search, filter and sort for in-memory list views.
//!
//! Every list view of the dashboard (tasks, members, activity) turns a raw
//! collection into the ordered subset it renders the same way:
//!
//! ```text
//! results = sort(apply_filters(search(items, query, search_fields), filters), sort_by, sort_order)
//! ```
//!
//! - **Search**: case-insensitive substring match over the view's configured
//!   search fields. An empty query keeps everything.
//! - **Filters**: AND over active filters. A filter whose value is absent or
//!   `"all"` is inactive. `status`, `priority`, `assignee`, `dueDate` and
//!   `tags` have their own predicates; other keys are exact matches.
//! - **Sort**: always applied. Priorities sort by rank, date fields by time,
//!   everything else by lower-cased text. Ties keep their input order.
//!
//! # Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use taskboard_query::{run_query, QueryState, Record, SearchConfig};
//!
//! let items = vec![
//!     Record::new().with("title", "Fix bug").with("status", "pending"),
//!     Record::new().with("title", "Write docs").with("status", "done"),
//! ];
//! let config = SearchConfig::new(["title"]);
//! let state = QueryState::default().with_query("fix");
//!
//! let result = run_query(&items, &state, &config, &Utc::now());
//! assert_eq!(result.result_count, 1);
//! assert_eq!(result.total_count, 2);
//! ```
//!
//! Views that re-render often hold a [`QueryEngine`], which caches the
//! derived ordering until one of its inputs changes.
//!
//! # Items
//!
//! The engine reads items only through [`Seekable`]. Typed structs implement
//! it by hand; schema-less payloads deserialize into [`Record`]. Missing
//! fields never raise: they fail to match in search, fail filters, and get
//! the minimum key when sorting.

mod config;
mod engine;
mod error;
mod filter;
mod ordering;
mod query;
mod record;
mod search;
mod traits;
mod value;

// Re-export public API
pub use config::{read_to_string, Format, SearchConfig, DEFAULT_DATE_FIELDS};
pub use engine::{Clock, FixedClock, QueryEngine, SystemClock};
pub use error::{QueryError, Result};
pub use filter::{apply_filters, DueBucket, Filter, FilterMap, ALL};
pub use ordering::{priority_rank, sort, Dir, KeyKind, SortDirective, SortKey};
pub use query::{run_query, QueryResult, QueryState};
pub use record::Record;
pub use search::{matches_text, search};
pub use traits::{Indexed, Seekable};
pub use value::{Number, Timestamp, Value};

/// Field and filter names with built-in meaning.
pub mod fields {
    pub use crate::filter::{ASSIGNEE, ASSIGNEE_FIELD, DUE_DATE, PRIORITY, STATUS, TAGS};
    pub use crate::ordering::DEFAULT_SORT_FIELD;
}
