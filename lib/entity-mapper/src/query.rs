//! Inline substitution of named parameters for logging and debugging.
//!
//! The output is not safe to execute against untrusted input. Bind the
//! parameters instead.

use crate::format::to_sql_literal;
use crate::{SubstitutionMode, Value};

/// A named query parameter. The name is stored without its leading colon.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let name = match name.strip_prefix(':') {
            Some(stripped) => stripped.to_string(),
            None => name,
        };
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Query text with `:name` placeholders plus its ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedQuery {
    pub template: String,
    pub parameters: Vec<QueryParameter>,
}

impl ParameterizedQuery {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            parameters: Vec::new(),
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push(QueryParameter::new(name, value));
        self
    }

    pub fn to_literal_sql(&self, mode: SubstitutionMode) -> String {
        substitute_parameters(&self.template, &self.parameters, mode)
    }
}

/// Replace each parameter's `:name` token with its SQL literal.
///
/// Parameters are applied in order, so text produced by an earlier
/// replacement is visible to later ones.
pub fn substitute_parameters(
    template: &str,
    parameters: &[QueryParameter],
    mode: SubstitutionMode,
) -> String {
    let mut sql = template.to_string();

    for parameter in parameters {
        if parameter.name.is_empty() {
            continue;
        }

        let token = format!(":{}", parameter.name);
        let literal = to_sql_literal(&parameter.value);
        tracing::trace!(parameter = %parameter.name, literal = %literal, "Substituting parameter");

        sql = match mode {
            SubstitutionMode::Verbatim => sql.replace(&token, &literal),
            SubstitutionMode::BoundaryAware => replace_bounded(&sql, &token, &literal),
        };
    }

    sql
}

fn replace_bounded(text: &str, token: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(token) {
        let end = pos + token.len();
        out.push_str(&rest[..pos]);
        if rest[end..].chars().next().is_none_or(|c| !is_identifier_char(c)) {
            out.push_str(replacement);
        } else {
            out.push_str(token);
        }
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
