#![deny(unsafe_code, rust_2018_idioms)]

mod document;
mod error;

use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use chrono::prelude::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, convert::TryFrom, fmt};
use uuid::Uuid;

pub use document::{contains_structure, deep_merge};
pub use error::ConversionFailure;

pub type FieldValueResult<T> = std::result::Result<T, ConversionFailure>;
pub type FieldList = Vec<FieldValue>;
pub type FieldObject = IndexMap<String, FieldValue>;

/// A value flowing through filters, write payloads and in-memory records.
///
/// Objects keep their insertion order, so two payloads built from the same input
/// compare and serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "serde_json::Value", from = "serde_json::Value")]
pub enum FieldValue {
    String(String),
    Boolean(bool),
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    DateTime(DateTime<FixedOffset>),
    Uuid(Uuid),
    List(FieldList),
    /// A collection of key-value pairs constituting an object or a document.
    Object(FieldObject),
    Null,
}

/// Stringify a date to the following format
/// 1999-05-01T00:00:00.000Z
pub fn stringify_datetime(datetime: &DateTime<FixedOffset>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 date and time string such as 1996-12-19T16:39:57-08:00.
pub fn parse_datetime(datetime: &str) -> chrono::ParseResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(datetime)
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Boolean(b),
            serde_json::Value::String(s) => FieldValue::String(s),
            serde_json::Value::Number(num) => match num.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(num.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::Array(values) => FieldValue::List(values.into_iter().map(FieldValue::from).collect()),
            serde_json::Value::Object(obj) => {
                FieldValue::Object(obj.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect())
            }
        }
    }
}

impl From<FieldValue> for serde_json::Value {
    fn from(v: FieldValue) -> Self {
        match v {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Boolean(b) => serde_json::Value::Bool(b),
            FieldValue::String(s) => serde_json::Value::String(s),
            FieldValue::Int(i) => serde_json::Value::from(i),
            FieldValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Decimal(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::DateTime(dt) => serde_json::Value::String(stringify_datetime(&dt)),
            FieldValue::Uuid(u) => serde_json::Value::String(u.to_string()),
            FieldValue::List(values) => serde_json::Value::Array(values.into_iter().map(Into::into).collect()),
            FieldValue::Object(obj) => serde_json::Value::Object(obj.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, FieldValue::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view used for comparisons between ints, floats and decimals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&FieldList> {
        match self {
            FieldValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&FieldObject> {
        match self {
            FieldValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<FieldList> {
        match self {
            FieldValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<FieldObject> {
        match self {
            FieldValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Looks up a key on an object value.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// The non-null `id` of an object value, if any.
    pub fn id(&self) -> Option<&FieldValue> {
        self.get("id").filter(|id| !id.is_null())
    }

    pub fn new_float(float: f64) -> FieldValue {
        FieldValue::Float(float)
    }

    pub fn new_decimal(float: f64) -> FieldValueResult<FieldValue> {
        BigDecimal::from_f64(float)
            .map(FieldValue::Decimal)
            .ok_or_else(|| ConversionFailure::new("f64", "Decimal"))
    }

    pub fn new_datetime(datetime: &str) -> FieldValueResult<FieldValue> {
        parse_datetime(datetime)
            .map(FieldValue::DateTime)
            .map_err(|_| ConversionFailure::new("String", "DateTime"))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::String(_) => "String",
            FieldValue::Boolean(_) => "Boolean",
            FieldValue::Int(_) => "Int",
            FieldValue::Float(_) => "Float",
            FieldValue::Decimal(_) => "Decimal",
            FieldValue::DateTime(_) => "DateTime",
            FieldValue::Uuid(_) => "Uuid",
            FieldValue::List(_) => "List",
            FieldValue::Object(_) => "Object",
            FieldValue::Null => "Null",
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => a.partial_cmp(b),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.partial_cmp(b),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.partial_cmp(b),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => a.partial_cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.partial_cmp(b),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.partial_cmp(b),
            (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(x) => x.fmt(f),
            FieldValue::Boolean(x) => x.fmt(f),
            FieldValue::Int(x) => x.fmt(f),
            FieldValue::Float(x) => x.fmt(f),
            FieldValue::Decimal(x) => x.fmt(f),
            FieldValue::DateTime(x) => stringify_datetime(x).fmt(f),
            FieldValue::Uuid(x) => x.fmt(f),
            FieldValue::Null => "null".fmt(f),
            FieldValue::List(values) => {
                let joined = values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");

                write!(f, "[{joined}]")
            }
            FieldValue::Object(pairs) => {
                let joined = pairs
                    .iter()
                    .map(|(key, value)| format!(r#""{key}": {value}"#))
                    .collect::<Vec<_>>()
                    .join(", ");

                write!(f, "{{ {joined} }}")
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::from(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<Uuid> for FieldValue {
    fn from(u: Uuid) -> Self {
        FieldValue::Uuid(u)
    }
}

impl From<FieldList> for FieldValue {
    fn from(l: FieldList) -> Self {
        FieldValue::List(l)
    }
}

impl From<FieldObject> for FieldValue {
    fn from(obj: FieldObject) -> Self {
        FieldValue::Object(obj)
    }
}

impl TryFrom<FieldValue> for i64 {
    type Error = ConversionFailure;

    fn try_from(value: FieldValue) -> FieldValueResult<i64> {
        match value {
            FieldValue::Int(i) => Ok(i),
            _ => Err(ConversionFailure::new("FieldValue", "i64")),
        }
    }
}

impl TryFrom<FieldValue> for String {
    type Error = ConversionFailure;

    fn try_from(value: FieldValue) -> FieldValueResult<String> {
        match value {
            FieldValue::String(s) => Ok(s),
            _ => Err(ConversionFailure::new("FieldValue", "String")),
        }
    }
}
