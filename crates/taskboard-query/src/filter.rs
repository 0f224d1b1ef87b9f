//! Structured filter stage.
//!
//! A [`FilterMap`] holds the filter panel's current selections. Active entries
//! compile into [`Filter`] predicates which are AND-ed together. A handful of
//! keys carry their own semantics; every other key is an exact match on the
//! field of the same name.
//!
//! | key | predicate |
//! |-----|-----------|
//! | `status` | `item.status == value` |
//! | `priority` | `item.priority == value` |
//! | `assignee` | `item.assigneeId == value` |
//! | `dueDate` | [`DueBucket`] classification relative to now |
//! | `tags` | `item.tags` contains `value` |
//! | other | `item[key] == value` |

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::traits::Seekable;
use crate::value::{Timestamp, Value};

/// Filter value meaning "no constraint".
pub const ALL: &str = "all";

pub const STATUS: &str = "status";
pub const PRIORITY: &str = "priority";
pub const ASSIGNEE: &str = "assignee";
pub const DUE_DATE: &str = "dueDate";
pub const TAGS: &str = "tags";

/// Item field read by the `assignee` filter.
pub const ASSIGNEE_FIELD: &str = "assigneeId";

/// Current filter selections, keyed by filter name.
///
/// A key with no value, or with the value `"all"`, is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterMap(BTreeMap<String, Option<String>>);

impl FilterMap {
    /// Creates an empty filter map.
    pub fn new() -> Self {
        FilterMap::default()
    }

    /// Sets a filter value, returning the map for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), Some(value.into()));
        self
    }

    /// Sets or clears a filter. `None` keeps the key but makes it inactive.
    pub fn set(&mut self, key: impl Into<String>, value: Option<String>) {
        self.0.insert(key.into(), value);
    }

    /// Returns the raw value of a filter, active or not.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    /// Iterates over active `(key, value)` pairs in key order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().filter_map(|(key, value)| match value.as_deref() {
            Some(value) if value != ALL => Some((key.as_str(), value)),
            _ => None,
        })
    }

    /// Returns `true` if any filter constrains the result.
    pub fn has_active(&self) -> bool {
        self.active().next().is_some()
    }

    /// Returns `true` if no key is present at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compiles the active entries into predicates.
    pub fn compile(&self) -> Vec<Filter> {
        self.active()
            .map(|(key, value)| Filter::new(key, value))
            .collect()
    }

    /// Parses a `key=value` expression as typed on a command line.
    ///
    /// The value may be empty or contain further `=` characters; the key may
    /// not be empty.
    pub fn parse_assignment(expr: &str) -> Result<(String, String)> {
        match expr.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(QueryError::InvalidFilter(expr.to_string())),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FilterMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FilterMap(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}

/// One active filter predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Status(String),
    Priority(String),
    Assignee(String),
    DueDate(DueBucket),
    Tag(String),
    /// Exact match on an arbitrary field.
    Field { key: String, value: String },
}

impl Filter {
    /// Builds the predicate for a filter key and its value.
    pub fn new(key: &str, value: &str) -> Filter {
        match key {
            STATUS => Filter::Status(value.to_string()),
            PRIORITY => Filter::Priority(value.to_string()),
            ASSIGNEE => Filter::Assignee(value.to_string()),
            DUE_DATE => Filter::DueDate(DueBucket::parse(value)),
            TAGS => Filter::Tag(value.to_string()),
            _ => Filter::Field {
                key: key.to_string(),
                value: value.to_string(),
            },
        }
    }

    /// Tests an item against this predicate.
    ///
    /// `now` only matters for due date buckets.
    pub fn matches<T, Tz>(&self, item: &T, now: &DateTime<Tz>) -> bool
    where
        T: Seekable + ?Sized,
        Tz: TimeZone,
    {
        match self {
            Filter::Status(value) => item.field_value(STATUS).is_str(value),
            Filter::Priority(value) => item.field_value(PRIORITY).is_str(value),
            Filter::Assignee(value) => item.field_value(ASSIGNEE_FIELD).is_str(value),
            Filter::DueDate(bucket) => bucket.matches(&item.field_value(DUE_DATE), now),
            Filter::Tag(value) => item.field_value(TAGS).contains_str(value),
            Filter::Field { key, value } => item.field_value(key).is_str(value),
        }
    }
}

/// Named classification of a due date relative to now.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DueBucket {
    /// Due strictly before now.
    Overdue,
    /// Due on now's calendar day.
    Today,
    /// Due on the calendar day after now's.
    Tomorrow,
    /// Due between Sunday and Saturday of now's week, inclusive.
    ThisWeek,
    /// No due date set.
    NoDueDate,
    /// Unrecognized bucket name. Any item with a due date passes.
    Other(String),
}

impl DueBucket {
    /// Parses a bucket name. Unknown names become [`DueBucket::Other`].
    pub fn parse(value: &str) -> DueBucket {
        match value {
            "overdue" => DueBucket::Overdue,
            "today" => DueBucket::Today,
            "tomorrow" => DueBucket::Tomorrow,
            "this-week" => DueBucket::ThisWeek,
            "none" => DueBucket::NoDueDate,
            other => DueBucket::Other(other.to_string()),
        }
    }

    /// Returns the bucket name.
    pub fn as_str(&self) -> &str {
        match self {
            DueBucket::Overdue => "overdue",
            DueBucket::Today => "today",
            DueBucket::Tomorrow => "tomorrow",
            DueBucket::ThisWeek => "this-week",
            DueBucket::NoDueDate => "none",
            DueBucket::Other(name) => name,
        }
    }

    /// Tests a due date value against this bucket.
    ///
    /// Calendar days are taken in `now`'s time zone. A bare `YYYY-MM-DD` due
    /// date names that day wherever `now` is, and falls overdue once its
    /// midnight in `now`'s zone has passed. A missing or empty due date only
    /// matches [`DueBucket::NoDueDate`]; one that is present but unparsable
    /// only matches [`DueBucket::Other`].
    pub fn matches<Tz: TimeZone>(&self, due: &Value<'_>, now: &DateTime<Tz>) -> bool {
        if due.is_blank() {
            return matches!(self, DueBucket::NoDueDate);
        }
        let today = now.date_naive();
        let (due_day, overdue) = if let Some(day) = due.to_date() {
            let midnight = day
                .and_hms_opt(0, 0, 0)
                .and_then(|start| now.timezone().from_local_datetime(&start).earliest());
            let overdue = midnight.map_or(day < today, |start| {
                start.timestamp_millis() < now.timestamp_millis()
            });
            (day, overdue)
        } else if let Some(at) = due.to_timestamp().and_then(Timestamp::to_datetime) {
            let day = at.with_timezone(&now.timezone()).date_naive();
            (day, at.timestamp_millis() < now.timestamp_millis())
        } else {
            return matches!(self, DueBucket::Other(_));
        };

        match self {
            DueBucket::Overdue => overdue,
            DueBucket::Today => due_day == today,
            DueBucket::Tomorrow => today.succ_opt() == Some(due_day),
            DueBucket::ThisWeek => {
                let back = Days::new(u64::from(today.weekday().num_days_from_sunday()));
                let Some(sunday) = today.checked_sub_days(back) else {
                    return false;
                };
                let Some(saturday) = sunday.checked_add_days(Days::new(6)) else {
                    return false;
                };
                sunday <= due_day && due_day <= saturday
            }
            DueBucket::NoDueDate => false,
            DueBucket::Other(_) => true,
        }
    }
}

impl std::fmt::Display for DueBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps the items that satisfy every active filter.
pub fn apply_filters<'a, T, I, Tz>(
    items: I,
    filters: &FilterMap,
    now: &DateTime<Tz>,
) -> Vec<&'a T>
where
    T: Seekable + 'a,
    I: IntoIterator<Item = &'a T>,
    Tz: TimeZone,
{
    let active = filters.compile();
    items
        .into_iter()
        .filter(|item| active.iter().all(|filter| filter.matches(*item, now)))
        .collect()
}
