//! Runtime value types for field access.
//!
//! The [`Value`] enum represents the value of a field read from an item. It is
//! what the search, filter and sort stages see; they never look at items
//! directly.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Runtime value of a field, borrowed from the source item.
///
/// # Example
///
/// ```
/// use taskboard_query::Value;
///
/// struct Member {
///     name: String,
///     role: Option<String>,
/// }
///
/// fn field<'a>(member: &'a Member, field: &str) -> Value<'a> {
///     match field {
///         "name" => Value::String(&member.name),
///         "role" => member.role.as_deref().into(),
///         _ => Value::None,
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Point in time.
    Timestamp(Timestamp),
    /// Boolean value.
    Bool(bool),
    /// Sequence of values, e.g. tags.
    List(Vec<Value<'a>>),
    /// Field not present, null, or unsupported.
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `None` value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns `true` for values that count as "not set": `None` and the
    /// empty string.
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::None | Value::String(""))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(*s),
            _ => None,
        }
    }

    /// Extracts the list elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Value<'a>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Strict equality against a string: only a `String` value with exactly
    /// the same contents matches. A number `1` is not equal to `"1"`.
    pub fn is_str(&self, expected: &str) -> bool {
        self.as_str() == Some(expected)
    }

    /// Returns `true` if this is a list holding the string `expected`.
    pub fn contains_str(&self, expected: &str) -> bool {
        self.as_list()
            .is_some_and(|items| items.iter().any(|v| v.is_str(expected)))
    }

    /// Returns the string form used for text matching and text sorting.
    ///
    /// Lists join their elements' forms with `,`. `None` has no text form.
    pub fn text(&self) -> Option<Cow<'a, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(*s)),
            Value::Number(n) => Some(Cow::Owned(n.to_text())),
            Value::Timestamp(ts) => Some(Cow::Owned(ts.to_string())),
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::List(items) => {
                let parts: Vec<Cow<'a, str>> = items
                    .iter()
                    .map(|v| v.text().unwrap_or(Cow::Borrowed("")))
                    .collect();
                Some(Cow::Owned(parts.join(",")))
            }
            Value::None => None,
        }
    }

    /// Returns the calendar date of a bare `YYYY-MM-DD` string.
    ///
    /// Such a value names a whole day with no zone attached. Anything with a
    /// time part, and any non-string, returns `None`.
    pub fn to_date(&self) -> Option<NaiveDate> {
        self.as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
    }

    /// Interprets this value as a point in time.
    ///
    /// Strings are parsed with [`Timestamp::parse`], numbers are read as
    /// milliseconds since the Unix epoch.
    pub fn to_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::String(s) => Timestamp::parse(s),
            Value::Number(n) => n.to_millis().map(Timestamp),
            _ => None,
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::String(s)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(s: &'a String) -> Self {
        Value::String(s)
    }
}

impl<'a> From<Option<&'a str>> for Value<'a> {
    fn from(s: Option<&'a str>) -> Self {
        s.map_or(Value::None, Value::String)
    }
}

impl<'a> From<&'a [String]> for Value<'a> {
    fn from(items: &'a [String]) -> Self {
        Value::List(items.iter().map(Value::from).collect())
    }
}

impl From<Timestamp> for Value<'_> {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

/// Numeric value.
///
/// Numbers are stored in one of three variants to preserve precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Returns the decimal text form. Integral floats print without a
    /// fractional part, so `3.0` reads as `"3"`.
    pub fn to_text(self) -> String {
        match self {
            Number::I64(n) => n.to_string(),
            Number::U64(n) => n.to_string(),
            Number::F64(n) if n.is_nan() => "NaN".to_string(),
            Number::F64(n) if n.is_infinite() => {
                let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
                text.to_string()
            }
            Number::F64(n) if n.fract() == 0.0 && n.abs() < 1e15 => (n as i64).to_string(),
            Number::F64(n) => n.to_string(),
        }
    }

    /// Reads the number as whole milliseconds, if it fits.
    pub fn to_millis(self) -> Option<i64> {
        match self {
            Number::I64(n) => Some(n),
            Number::U64(n) => i64::try_from(n).ok(),
            Number::F64(n) if n.is_finite() => Some(n.trunc() as i64),
            Number::F64(_) => None,
        }
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::I64(n)
    }
}

impl From<u32> for Number {
    fn from(n: u32) -> Self {
        Number::U64(n as u64)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::U64(n)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::F64(n)
    }
}

/// Timestamp represented as milliseconds since the Unix epoch.
///
/// ```
/// use taskboard_query::Timestamp;
///
/// let due = Timestamp::parse("2024-06-12").unwrap();
/// assert_eq!(due.to_string(), "2024-06-12T00:00:00.000Z");
/// assert!(Timestamp(1000) < Timestamp(2000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub i64);

/// Layout of a bare calendar date.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Naive layouts accepted after RFC 3339. They carry no offset and are read
/// as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

impl Timestamp {
    /// Returns milliseconds since the Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Parses date-like text.
    ///
    /// Accepts RFC 3339, a bare `YYYY-MM-DD` (midnight UTC) and naive
    /// `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]` (UTC). Returns `None` for anything
    /// else.
    pub fn parse(text: &str) -> Option<Timestamp> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Timestamp(dt.timestamp_millis()));
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| Timestamp(dt.and_utc().timestamp_millis()));
        }
        NAIVE_DATETIME_FORMATS.iter().find_map(|fmt| {
            NaiveDateTime::parse_from_str(text, fmt)
                .ok()
                .map(|dt| Timestamp(dt.and_utc().timestamp_millis()))
        })
    }

    /// Converts to a UTC date-time, if the value is in chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}", self.0),
        }
    }
}
