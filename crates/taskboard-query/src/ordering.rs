//! Sort stage.
//!
//! Provides [`Dir`] for sort direction, [`SortDirective`] for the active
//! `(field, order)` pair and [`sort`], which orders a result set by one field
//! after normalizing its values into a [`SortKey`].

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::filter::PRIORITY;
use crate::traits::Seekable;
use crate::value::Value;

/// Field a fresh view sorts by.
pub const DEFAULT_SORT_FIELD: &str = "created";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    Asc,
    /// Descending order (largest first).
    #[default]
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dir {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Dir::Asc),
            "desc" => Ok(Dir::Desc),
            _ => Err(QueryError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// The active sort field and direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortDirective {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    pub order: Dir,
}

impl SortDirective {
    /// Creates a directive with the given direction.
    pub fn new(field: impl Into<String>, order: Dir) -> Self {
        SortDirective {
            field: field.into(),
            order,
        }
    }

    /// Creates an ascending directive for the given field.
    pub fn asc(field: impl Into<String>) -> Self {
        SortDirective::new(field, Dir::Asc)
    }

    /// Creates a descending directive for the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        SortDirective::new(field, Dir::Desc)
    }
}

impl Default for SortDirective {
    fn default() -> Self {
        SortDirective::desc(DEFAULT_SORT_FIELD)
    }
}

/// How values of a sort field are normalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Priority names mapped through [`priority_rank`].
    Priority,
    /// Date-like values as epoch milliseconds.
    Date,
    /// Lower-cased text.
    Text,
}

impl KeyKind {
    /// Picks the normalization for `field`, given the configured date fields.
    pub fn for_field(field: &str, date_fields: &[String]) -> KeyKind {
        if field == PRIORITY {
            KeyKind::Priority
        } else if date_fields.iter().any(|f| f == field) {
            KeyKind::Date
        } else {
            KeyKind::Text
        }
    }

    /// Normalizes a field value. Missing or unusable values get the minimum
    /// key of their kind.
    pub fn key(self, value: &Value<'_>) -> SortKey {
        match self {
            KeyKind::Priority => SortKey::Rank(value.as_str().map_or(0, priority_rank)),
            KeyKind::Date => SortKey::Time(value.to_timestamp().map_or(0, |ts| ts.as_millis())),
            KeyKind::Text => {
                SortKey::Text(value.text().map_or_else(String::new, |t| t.to_lowercase()))
            }
        }
    }
}

/// A normalized sort key. Keys produced for one field share a variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Rank(u8),
    Time(i64),
    Text(String),
}

/// Rank of a priority name: `Urgent` 4, `High` 3, `Medium` 2, `Low` 1,
/// anything else 0.
pub fn priority_rank(name: &str) -> u8 {
    match name {
        "Urgent" => 4,
        "High" => 3,
        "Medium" => 2,
        "Low" => 1,
        _ => 0,
    }
}

/// Orders items by one field.
///
/// Keys are computed once per item. Items with equal keys keep their input
/// order in both directions: ties fall back to the input position, not to
/// the sort algorithm.
pub fn sort<'a, T>(
    items: Vec<&'a T>,
    directive: &SortDirective,
    date_fields: &[String],
) -> Vec<&'a T>
where
    T: Seekable + ?Sized,
{
    let kind = KeyKind::for_field(&directive.field, date_fields);
    let mut keyed: Vec<(SortKey, usize, &'a T)> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| (kind.key(&item.field_value(&directive.field)), index, item))
        .collect();

    keyed.sort_unstable_by(|(a, ia, _), (b, ib, _)| {
        directive.order.apply(a.cmp(b)).then(ia.cmp(ib))
    });

    keyed.into_iter().map(|(_, _, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn dates() -> Vec<String> {
        vec!["dueDate".to_string(), "created".to_string(), "updated".to_string()]
    }

    fn field<'a>(items: &[&'a Record], name: &str) -> Vec<&'a str> {
        items
            .iter()
            .copied()
            .map(|r| r.field_value(name).as_str().unwrap_or("-"))
            .collect()
    }

    #[test]
    fn dir_apply() {
        assert_eq!(Dir::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Dir::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Dir::Desc.apply(Ordering::Equal), Ordering::Equal);
    }

    #[test]
    fn dir_parse_and_display() {
        assert_eq!("asc".parse::<Dir>().unwrap(), Dir::Asc);
        assert_eq!(" DESC ".parse::<Dir>().unwrap(), Dir::Desc);
        assert!(matches!(
            "up".parse::<Dir>(),
            Err(QueryError::InvalidSortOrder(s)) if s == "up"
        ));
        assert_eq!(Dir::Asc.to_string(), "asc");
    }

    #[test]
    fn default_directive_is_created_desc() {
        let directive = SortDirective::default();
        assert_eq!(directive.field, "created");
        assert_eq!(directive.order, Dir::Desc);
    }

    #[test]
    fn key_kinds() {
        assert_eq!(KeyKind::for_field("priority", &dates()), KeyKind::Priority);
        assert_eq!(KeyKind::for_field("dueDate", &dates()), KeyKind::Date);
        assert_eq!(KeyKind::for_field("title", &dates()), KeyKind::Text);
        assert_eq!(KeyKind::for_field("created", &[]), KeyKind::Text);
    }

    #[test]
    fn missing_values_get_minimum_keys() {
        assert_eq!(KeyKind::Priority.key(&Value::None), SortKey::Rank(0));
        assert_eq!(KeyKind::Priority.key(&Value::String("urgent")), SortKey::Rank(0));
        assert_eq!(KeyKind::Date.key(&Value::None), SortKey::Time(0));
        assert_eq!(KeyKind::Date.key(&Value::String("whenever")), SortKey::Time(0));
        assert_eq!(KeyKind::Text.key(&Value::None), SortKey::Text(String::new()));
    }

    #[test]
    fn priority_desc_uses_rank_table() {
        let items = vec![
            Record::new().with("priority", "Low"),
            Record::new().with("priority", "Urgent"),
            Record::new().with("priority", "Medium"),
        ];
        let sorted = sort(items.iter().collect(), &SortDirective::desc("priority"), &dates());
        assert_eq!(field(&sorted, "priority"), ["Urgent", "Medium", "Low"]);
    }

    #[test]
    fn dates_sort_chronologically_with_missing_first_ascending() {
        let items = vec![
            Record::new().with("id", "b").with("created", "2024-02-01"),
            Record::new().with("id", "none"),
            Record::new().with("id", "a").with("created", "2024-01-01T10:00:00Z"),
        ];
        let sorted = sort(items.iter().collect(), &SortDirective::asc("created"), &dates());
        assert_eq!(field(&sorted, "id"), ["none", "a", "b"]);
    }

    #[test]
    fn text_sort_is_case_insensitive() {
        let items = vec![
            Record::new().with("title", "beta"),
            Record::new().with("title", "Alpha"),
            Record::new().with("title", "gamma"),
        ];
        let sorted = sort(items.iter().collect(), &SortDirective::asc("title"), &dates());
        assert_eq!(field(&sorted, "title"), ["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn numbers_outside_date_fields_compare_as_text() {
        let items = vec![
            Record::new().with("id", "nine").with("points", 9),
            Record::new().with("id", "ten").with("points", 10),
        ];
        let sorted = sort(items.iter().collect(), &SortDirective::asc("points"), &dates());
        assert_eq!(field(&sorted, "id"), ["ten", "nine"]);
    }

    #[test]
    fn ties_keep_input_order_in_both_directions() {
        let items = vec![
            Record::new().with("id", "1").with("priority", "High"),
            Record::new().with("id", "2").with("priority", "Low"),
            Record::new().with("id", "3").with("priority", "High"),
            Record::new().with("id", "4").with("priority", "Low"),
        ];

        let desc = sort(items.iter().collect(), &SortDirective::desc("priority"), &dates());
        assert_eq!(field(&desc, "id"), ["1", "3", "2", "4"]);

        let asc = sort(items.iter().collect(), &SortDirective::asc("priority"), &dates());
        assert_eq!(field(&asc, "id"), ["2", "4", "1", "3"]);
    }

    #[test]
    fn directive_serde_shape() {
        let directive: SortDirective =
            serde_json::from_str(r#"{"field": "dueDate", "order": "asc"}"#).unwrap();
        assert_eq!(directive, SortDirective::asc("dueDate"));
    }
}
