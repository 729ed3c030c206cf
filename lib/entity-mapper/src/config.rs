//! Mapper configuration.

use serde::{Deserialize, Serialize};

use crate::{MapperError, Value};

/// How `:name` placeholders are matched during literal substitution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionMode {
    /// Plain textual replacement of every `:name` occurrence.
    ///
    /// A parameter whose name prefixes another (`:id` and `:identifier`)
    /// corrupts the longer token when it is replaced first.
    Verbatim,
    /// Only replace `:name` when it is not followed by an identifier character.
    #[default]
    BoundaryAware,
}

/// When an identifier value counts as "not yet assigned" and is left out of inserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierPolicy {
    /// Numeric `<= 0` comparison for every value. Strings are compared by
    /// their numeric value; non-numeric strings count as assigned.
    NonPositive,
    /// Per-type test: null, non-positive numbers and empty strings are unset.
    #[default]
    Typed,
}

impl IdentifierPolicy {
    pub fn is_unset(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(n) => *n <= 0,
            Value::UInt(n) => *n == 0,
            Value::Float(f) => *f <= 0.0,
            Value::String(s) => match self {
                IdentifierPolicy::NonPositive => s
                    .trim()
                    .parse::<f64>()
                    .map(|n| n <= 0.0)
                    .unwrap_or(s.is_empty()),
                IdentifierPolicy::Typed => s.is_empty(),
            },
            Value::Enum(inner) => self.is_unset(inner),
            Value::Json(json) => match json {
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
                scalar => self.is_unset(&Value::from_json_scalar(scalar)),
            },
            Value::List(_) | Value::Datetime(_) | Value::Object(_) => false,
        }
    }
}

/// Configuration shared by the insert-row builder and query substitution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub substitution: SubstitutionMode,
    pub identifier_policy: IdentifierPolicy,
}

impl MapperConfig {
    pub fn from_json(json: &str) -> Result<Self, MapperError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_substitution(mut self, mode: SubstitutionMode) -> Self {
        self.substitution = mode;
        self
    }

    pub fn with_identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }
}
