//! Raw filter values as they arrive on the wire.
//!
//! A [`FilterValue`] is the untrusted, JSON-shaped value attached to a filter
//! key or an advanced condition. It is kept verbatim until the condition
//! compiler formats it into a [`Literal`](crate::Literal), and it is what
//! custom contributors receive.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

static NULL: FilterValue = FilterValue::Null;

/// Untyped filter value: null, bool, number, string, or a list of those.
///
/// # Example
///
/// ```
/// use standout_grid::FilterValue;
///
/// let value: FilterValue = serde_json::from_str("[6, 7, 8]").unwrap();
/// assert_eq!(value.elements().len(), 3);
///
/// // Scalars behave as one-element lists
/// let value = FilterValue::from("String 1");
/// assert_eq!(value.elements(), &[FilterValue::from("String 1")]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// JSON `null`.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
    /// List of values, used by multi-value operators.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Returns `true` if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    /// Returns `true` if this is a `List`.
    pub fn is_list(&self) -> bool {
        matches!(self, FilterValue::List(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            FilterValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FilterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value viewed as a 0-indexed list.
    ///
    /// Lists are returned as-is; any scalar (including `Null`) becomes a
    /// one-element slice.
    pub fn elements(&self) -> &[FilterValue] {
        match self {
            FilterValue::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// The element at `index` of [`elements`](Self::elements), or `Null`.
    pub fn element(&self, index: usize) -> &FilterValue {
        self.elements().get(index).unwrap_or(&NULL)
    }

    /// Plain-text rendering used to build `LIKE` patterns and header params.
    ///
    /// Null renders as the empty string and lists are comma-joined.
    pub fn text(&self) -> String {
        match self {
            FilterValue::Null => String::new(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Number(n) => n.to_string(),
            FilterValue::String(s) => s.clone(),
            FilterValue::List(items) => items
                .iter()
                .map(FilterValue::text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Converts a JSON value, rejecting objects.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(FilterValue::Null),
            serde_json::Value::Bool(b) => Some(FilterValue::Bool(b)),
            serde_json::Value::Number(n) => Number::from_json(&n).map(FilterValue::Number),
            serde_json::Value::String(s) => Some(FilterValue::String(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(FilterValue::from_json)
                .collect::<Option<Vec<_>>>()
                .map(FilterValue::List),
            serde_json::Value::Object(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Null => write!(f, "null"),
            FilterValue::String(s) => write!(f, "{s:?}"),
            FilterValue::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            other => write!(f, "{}", other.text()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<Number> for FilterValue {
    fn from(n: Number) -> Self {
        FilterValue::Number(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Number(Number::from(n))
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Number(Number::from(n))
    }
}

impl From<u32> for FilterValue {
    fn from(n: u32) -> Self {
        FilterValue::Number(Number::from(n))
    }
}

impl From<u64> for FilterValue {
    fn from(n: u64) -> Self {
        FilterValue::Number(Number::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Number(Number::from(n))
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(items: Vec<T>) -> Self {
        FilterValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision.
/// Comparisons between different variants go through `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            // Integers compare exactly; f64 loses precision past 2^53.
            (Number::I64(a), Number::U64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            (Number::U64(a), Number::I64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Parses a decimal string the way a SQL engine coerces text to numbers.
    pub fn parse(text: &str) -> Option<Number> {
        let text = text.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Some(Number::I64(n));
        }
        if let Ok(n) = text.parse::<u64>() {
            return Some(Number::U64(n));
        }
        text.parse::<f64>().ok().map(Number::F64)
    }

    fn from_json(n: &serde_json::Number) -> Option<Number> {
        n.as_i64()
            .map(Number::I64)
            .or_else(|| n.as_u64().map(Number::U64))
            .or_else(|| n.as_f64().map(Number::F64))
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
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
