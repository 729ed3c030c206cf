//! Value formatting for column maps and inline SQL literals.
//!
//! Both modes classify values in the same order, first match wins:
//! null, enum, datetime, object, bool, sequence, integer, other scalar.
//! Booleans are handled before numbers so they never render as text, and
//! classification is by variant only.

use std::sync::Arc;

use crate::{Entity, MapperError, MetadataSource, PrimaryKeyResolver, Value};

/// Converts field values into column values (map mode).
#[derive(Clone, Copy)]
pub struct ValueFormatter<'a> {
    source: &'a dyn MetadataSource,
}

impl<'a> ValueFormatter<'a> {
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self { source }
    }

    /// Column value for a field value.
    ///
    /// - enums become their underlying value as a string
    /// - datetimes become `YYYY-MM-DD HH:MM:SS`
    /// - mapped objects become their first identifier value; objects without
    ///   metadata or without identifiers are passed through unchanged
    /// - booleans become `1`/`0`
    /// - sequences become JSON text
    pub fn to_column_value(&self, value: &Value) -> Result<Value, MapperError> {
        let formatted = match value {
            Value::Null => Value::Null,
            Value::Json(json) if !json.is_array() && !json.is_object() => {
                return self.to_column_value(&Value::from_json_scalar(json));
            }
            Value::Enum(inner) => Value::String(inner.scalar_text().unwrap_or_default()),
            Value::Datetime(ts) => Value::String(ts.to_string()),
            Value::Object(entity) => self.object_column_value(entity)?,
            Value::Bool(b) => Value::Int(i64::from(*b)),
            Value::List(_) | Value::Json(_) => {
                Value::String(serde_json::to_string(&value.to_json())?)
            }
            Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::String(_) => value.clone(),
        };
        Ok(formatted)
    }

    /// Inline SQL literal for a value (see [`to_sql_literal`]).
    pub fn to_sql_literal(&self, value: &Value) -> String {
        to_sql_literal(value)
    }

    fn object_column_value(&self, entity: &Arc<dyn Entity>) -> Result<Value, MapperError> {
        let resolver = PrimaryKeyResolver::new(self.source);
        match resolver.primary_key_values(entity.as_ref()) {
            Ok(values) => Ok(values
                .into_values()
                .into_iter()
                .next()
                .unwrap_or_else(|| Value::Object(entity.clone()))),
            Err(e) if e.is_metadata_not_found() => {
                tracing::debug!(
                    class = entity.class_id().name(),
                    "No metadata for nested object, passing it through"
                );
                Ok(Value::Object(entity.clone()))
            }
            Err(e) => Err(e),
        }
    }
}

/// Inline SQL literal for a value, for logging and debugging.
///
/// - null is `null`
/// - enums and datetimes are quoted strings
/// - objects render their identifier unquoted (`0` when it is not a scalar,
///   `''` when the object has no identifier accessor)
/// - booleans are `1`/`0`, integers are unquoted digits
/// - sequences are comma-joined quoted elements, `''` when empty; elements
///   without a scalar form are dropped
/// - other scalars are quoted, embedded quotes doubled
pub fn to_sql_literal(value: &Value) -> String {
    use serde_json::Value as Json;

    match value {
        Value::Null => "null".to_string(),
        Value::Json(json) if !json.is_array() && !json.is_object() => {
            to_sql_literal(&Value::from_json_scalar(json))
        }
        Value::Enum(inner) => quote(&inner.scalar_text().unwrap_or_default()),
        Value::Datetime(ts) => quote(&ts.to_string()),
        Value::Object(entity) => object_literal(entity.as_ref()),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::List(items) => sequence_literal(items),
        Value::Json(Json::Array(items)) => {
            sequence_literal(&items.iter().map(Value::from_json_scalar).collect::<Vec<_>>())
        }
        Value::Json(Json::Object(map)) => {
            sequence_literal(&map.values().map(Value::from_json_scalar).collect::<Vec<_>>())
        }
        Value::Int(n) => n.to_string(),
        Value::UInt(n) => n.to_string(),
        Value::Float(_) | Value::String(_) | Value::Json(_) => {
            value.scalar_text().map(|s| quote(&s)).unwrap_or_else(empty_literal)
        }
    }
}

fn object_literal(entity: &dyn Entity) -> String {
    match entity.identifier() {
        Some(id) if id.is_scalar() => id.scalar_text().unwrap_or_else(|| "0".to_string()),
        Some(_) => "0".to_string(),
        None => empty_literal(),
    }
}

fn sequence_literal(items: &[Value]) -> String {
    if items.is_empty() {
        return empty_literal();
    }

    items
        .iter()
        .filter_map(Value::scalar_text)
        .map(|text| quote(&text))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn empty_literal() -> String {
    "''".to_string()
}
