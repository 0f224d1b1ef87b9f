//! Schema-less items backed by JSON objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::traits::Seekable;
use crate::value::{Number, Value};

/// A dynamic item: a JSON object read field by field.
///
/// This is what service payloads deserialize into when the caller has no
/// typed struct for them. `null` and nested objects read as [`Value::None`].
///
/// ```
/// use taskboard_query::{Record, Seekable, Value};
///
/// let record: Record = serde_json::from_str(r#"{"title": "Fix bug", "tags": ["ui"]}"#).unwrap();
/// assert_eq!(record.field_value("title"), Value::String("Fix bug"));
/// assert!(record.field_value("tags").contains_str("ui"));
/// assert!(record.field_value("dueDate").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Json>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Record::default()
    }

    /// Sets a field, returning the record for chaining.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Json>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Returns the raw JSON value of a field.
    pub fn get(&self, field: &str) -> Option<&Json> {
        self.0.get(field)
    }
}

impl Seekable for Record {
    fn field_value(&self, field: &str) -> Value<'_> {
        self.0.get(field).map_or(Value::None, json_value)
    }
}

fn json_value(json: &Json) -> Value<'_> {
    match json {
        Json::String(s) => Value::String(s),
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => json_number(n).map_or(Value::None, Value::Number),
        Json::Array(items) => Value::List(items.iter().map(json_value).collect()),
        Json::Null | Json::Object(_) => Value::None,
    }
}

fn json_number(n: &serde_json::Number) -> Option<Number> {
    if let Some(i) = n.as_i64() {
        Some(Number::I64(i))
    } else if let Some(u) = n.as_u64() {
        Some(Number::U64(u))
    } else {
        n.as_f64().map(Number::F64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Json) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn reads_scalar_fields() {
        let r = record(json!({
            "title": "Ship it",
            "points": 3,
            "ratio": 0.5,
            "done": false,
        }));

        assert_eq!(r.field_value("title"), Value::String("Ship it"));
        assert_eq!(r.field_value("points"), Value::Number(Number::I64(3)));
        assert_eq!(r.field_value("ratio"), Value::Number(Number::F64(0.5)));
        assert_eq!(r.field_value("done"), Value::Bool(false));
    }

    #[test]
    fn null_and_objects_are_missing() {
        let r = record(json!({ "dueDate": null, "owner": { "id": 1 } }));

        assert!(r.field_value("dueDate").is_none());
        assert!(r.field_value("owner").is_none());
        assert!(r.field_value("absent").is_none());
    }

    #[test]
    fn arrays_become_lists() {
        let r = record(json!({ "tags": ["ui", 2, null] }));

        assert_eq!(
            r.field_value("tags"),
            Value::List(vec![
                Value::String("ui"),
                Value::Number(Number::I64(2)),
                Value::None,
            ])
        );
    }

    #[test]
    fn builder_and_serde_round_trip() {
        let r = Record::new().with("title", "Write docs").with("tags", json!(["docs"]));
        let text = serde_json::to_string(&r).unwrap();

        assert!(text.contains(r#""title":"Write docs""#));
        assert_eq!(serde_json::from_str::<Record>(&text).unwrap(), r);
        assert_eq!(r.get("tags"), Some(&json!(["docs"])));
    }
}
