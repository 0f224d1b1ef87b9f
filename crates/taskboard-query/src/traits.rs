//! The accessor trait items implement to be queried.

use crate::value::Value;

/// Trait for types that can be searched, filtered and sorted.
///
/// The engine never assumes a schema: it asks for fields by name and treats
/// [`Value::None`] as "field missing".
///
/// # Example
///
/// ```
/// use taskboard_query::{Seekable, Value};
///
/// struct Task {
///     title: String,
///     status: String,
///     tags: Vec<String>,
/// }
///
/// impl Seekable for Task {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "title" => Value::String(&self.title),
///             "status" => Value::String(&self.status),
///             "tags" => self.tags.as_slice().into(),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
pub trait Seekable {
    /// Returns the value of a field, or [`Value::None`] if the item has no
    /// such field.
    fn field_value(&self, field: &str) -> Value<'_>;
}

impl<T: Seekable + ?Sized> Seekable for &T {
    fn field_value(&self, field: &str) -> Value<'_> {
        (**self).field_value(field)
    }
}

/// An item paired with its position in the source collection.
///
/// Lets the stages run over borrowed items while the caller keeps track of
/// where each result came from.
#[derive(Debug, Clone, Copy)]
pub struct Indexed<'a, T> {
    pub index: usize,
    pub item: &'a T,
}

impl<'a, T> Indexed<'a, T> {
    /// Pairs every item of `items` with its index.
    pub fn all(items: &'a [T]) -> Vec<Indexed<'a, T>> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| Indexed { index, item })
            .collect()
    }
}

impl<T: Seekable> Seekable for Indexed<'_, T> {
    fn field_value(&self, field: &str) -> Value<'_> {
        self.item.field_value(field)
    }
}
