//! Runtime-typed values flowing between entities, the formatter and queries.
//!
//! Capabilities the mapper dispatches on are explicit variants:
//! [`Value::Enum`] for enumerated values, [`Value::Datetime`] for date/time
//! values and [`Value::Object`] for nested objects.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::{Entity, MapperError, Timestamp};

/// A value read from an entity field or bound to a query parameter.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// Structured document (arrays, maps) carried as JSON.
    Json(serde_json::Value),
    Datetime(Timestamp),
    /// Enumerated value; holds the underlying scalar.
    Enum(Box<Value>),
    Object(Arc<dyn Entity>),
}

impl Value {
    /// Wrap an underlying scalar as an enumerated value.
    pub fn enumerated(underlying: impl Into<Value>) -> Self {
        Value::Enum(Box::new(underlying.into()))
    }

    /// Wrap an entity as a nested object value.
    pub fn object<T: Entity + 'static>(entity: T) -> Self {
        Value::Object(Arc::new(entity))
    }

    /// Convert a JSON scalar into the matching variant; arrays and maps stay `Json`.
    pub fn from_json_scalar(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(u)) => Value::UInt(u),
                _ => Value::Float(n.as_f64().unwrap_or_default()),
            },
            Json::String(s) => Value::String(s.clone()),
            other => Value::Json(other.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Json(_) => "json",
            Value::Datetime(_) => "datetime",
            Value::Enum(_) => "enum",
            Value::Object(_) => "object",
        }
    }

    /// Bool, number or string (including JSON scalars).
    pub fn is_scalar(&self) -> bool {
        match self {
            Value::Bool(_)
            | Value::Int(_)
            | Value::UInt(_)
            | Value::Float(_)
            | Value::String(_) => true,
            Value::Json(json) => json.is_boolean() || json.is_number() || json.is_string(),
            _ => false,
        }
    }

    /// Text of a scalar or stringable value; `None` for null, sequences and objects.
    ///
    /// Booleans render as `1`/`0`.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::UInt(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Json(serde_json::Value::Bool(b)) => Value::Bool(*b).scalar_text(),
            Value::Json(serde_json::Value::Number(n)) => Some(n.to_string()),
            Value::Json(serde_json::Value::String(s)) => Some(s.clone()),
            Value::Datetime(ts) => Some(ts.to_string()),
            Value::Enum(inner) => inner.scalar_text(),
            _ => None,
        }
    }

    /// JSON form used when sequences are encoded as column text.
    ///
    /// Nested objects encode as their identifier, or `null` without one.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::UInt(n) => Json::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Json(json) => json.clone(),
            Value::Datetime(ts) => Json::String(ts.to_string()),
            Value::Enum(inner) => inner.to_json(),
            Value::Object(entity) => entity
                .identifier()
                .map(|id| id.to_json())
                .unwrap_or(Json::Null),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Datetime(a), Value::Datetime(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            // Objects compare by identity
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<'a> From<&[&'a str]> for Value {
    fn from(v: &[&'a str]) -> Self {
        Value::List(v.iter().map(|s| Value::from(*s)).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Datetime(ts)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Datetime(Timestamp::from(dt))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Datetime(Timestamp::from(dt))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

impl<T: Entity + 'static> From<Arc<T>> for Value {
    fn from(entity: Arc<T>) -> Self {
        Value::Object(entity)
    }
}

/// Conversion from an entity field into a [`Value`].
///
/// Implement this for enumerations (returning [`Value::enumerated`]) and for
/// custom date types (returning [`Value::Datetime`]).
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Conversion from a [`Value`] back into a field, used for identifier writes.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, MapperError>;
}

macro_rules! to_value_via_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$variant(<$target>::from(*self))
                }
            }
        )*
    };
}

to_value_via_from!(
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
);

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: Entity + 'static> ToValue for Arc<T> {
    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl ToValue for Timestamp {
    fn to_value(&self) -> Value {
        Value::Datetime(*self)
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Datetime(Timestamp::from(*self))
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Datetime(Timestamp::from(*self))
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Datetime(Timestamp::from(*self))
    }
}

impl ToValue for DateTime<FixedOffset> {
    fn to_value(&self) -> Value {
        Value::Datetime(Timestamp::from(*self))
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

fn mismatch(expected: &'static str, value: &Value) -> MapperError {
    MapperError::TypeMismatch {
        expected,
        found: value.type_name(),
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        match value {
            Value::Int(n) => Ok(n),
            Value::UInt(n) => i64::try_from(n).map_err(|_| mismatch("i64", &value)),
            other => Err(mismatch("i64", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        let wide = i64::from_value(value.clone()).map_err(|_| mismatch("i32", &value))?;
        i32::try_from(wide).map_err(|_| mismatch("i32", &value))
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        match value {
            Value::UInt(n) => Ok(n),
            Value::Int(n) => u64::try_from(n).map_err(|_| mismatch("u64", &value)),
            other => Err(mismatch("u64", &other)),
        }
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        let wide = u64::from_value(value.clone()).map_err(|_| mismatch("u32", &value))?;
        u32::try_from(wide).map_err(|_| mismatch("u32", &value))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(n) => Ok(n as f64),
            Value::UInt(n) => Ok(n as f64),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Timestamp {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        match value {
            Value::Datetime(ts) => Ok(ts),
            other => Err(mismatch("datetime", &other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, MapperError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".to_string()));
        assert_eq!(Some(5_i32).to_value(), Value::Int(5));
        assert_eq!(None::<String>.to_value(), Value::Null);
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(Value::Bool(true).scalar_text().as_deref(), Some("1"));
        assert_eq!(Value::Bool(false).scalar_text().as_deref(), Some("0"));
        assert_eq!(Value::Float(2.5).scalar_text().as_deref(), Some("2.5"));
        assert_eq!(
            Value::enumerated("active").scalar_text().as_deref(),
            Some("active")
        );
        assert_eq!(Value::Null.scalar_text(), None);
        assert_eq!(Value::from(vec!["a"]).scalar_text(), None);
    }

    #[test]
    fn test_to_json_nested() {
        let value = Value::List(vec![
            Value::from("a"),
            Value::Int(1),
            Value::Float(f64::NAN),
            Value::enumerated(3_i64),
        ]);
        assert_eq!(value.to_json(), serde_json::json!(["a", 1, null, 3]));
    }

    #[test]
    fn test_from_value_option_and_mismatch() {
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(Value::Int(9)).unwrap(), Some(9));
        assert_eq!(u32::from_value(Value::Int(42)).unwrap(), 42);

        let err = String::from_value(Value::Int(1)).unwrap_err();
        assert!(matches!(
            err,
            MapperError::TypeMismatch {
                expected: "string",
                found: "int"
            }
        ));
        assert!(u64::from_value(Value::Int(-1)).is_err());
    }
}
