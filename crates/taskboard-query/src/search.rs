//! Free-text search stage.

use crate::traits::Seekable;

/// Keeps the items where at least one of `fields` contains `query`,
/// ignoring case.
///
/// Fields are checked in the order given and the first hit wins. Missing
/// fields never match. An empty query keeps every item. This is a plain
/// substring test: no tokenizing and no ranking.
pub fn search<'a, T, I>(items: I, query: &str, fields: &[String]) -> Vec<&'a T>
where
    T: Seekable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    if query.is_empty() {
        return items.into_iter().collect();
    }
    let needle = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| matches_text(*item, &needle, fields))
        .collect()
}

/// Returns `true` if any of `fields` contains `needle`, which must already be
/// lower-cased.
pub fn matches_text<T: Seekable + ?Sized>(item: &T, needle: &str, fields: &[String]) -> bool {
    fields.iter().any(|field| {
        item.field_value(field)
            .text()
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}
