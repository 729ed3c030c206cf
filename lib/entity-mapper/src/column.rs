//! Column resolution for declared fields.

use crate::{FieldDescriptor, IdentifierPolicy, RelationshipKind, Value};

/// Column a field maps to, or `None` when the field is not insertable.
///
/// To-many relationships and inverse one-to-one sides have no column.
/// An explicit column name wins; otherwise the field name is converted to
/// snake_case and owning relationships get an `_id` suffix.
pub fn resolve_column(field: &FieldDescriptor) -> Option<String> {
    if field.relationship.is_some_and(|kind| kind.is_collection()) {
        return None;
    }

    if let Some(column) = &field.column {
        return Some(column.clone());
    }

    let name = to_snake_case(&field.name);
    match field.relationship {
        Some(RelationshipKind::ManyToOne) => Some(format!("{}_id", name)),
        Some(RelationshipKind::OneToOne) if field.inverse_side => None,
        Some(RelationshipKind::OneToOne) => Some(format!("{}_id", name)),
        _ => Some(name),
    }
}

/// Whether an identifier field should be left out because it is not yet assigned.
///
/// Uses the default [`IdentifierPolicy`].
pub fn should_skip_identifier_field(field: &FieldDescriptor, value: &Value) -> bool {
    should_skip_identifier_field_with(field, value, IdentifierPolicy::default())
}

pub fn should_skip_identifier_field_with(
    field: &FieldDescriptor,
    value: &Value,
    policy: IdentifierPolicy,
) -> bool {
    field.identifier && policy.is_unset(value)
}

/// Convert camelCase/PascalCase to snake_case.
///
/// Strict: every upper-case letter that follows a letter starts a new word,
/// so `userID` becomes `user_i_d` and `line2Text` becomes `line2text`.
/// Leading and trailing underscores are trimmed.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut previous: Option<char> = None;

    for c in s.chars() {
        if c.is_uppercase() && previous.is_some_and(char::is_alphabetic) {
            result.push('_');
        }
        result.extend(c.to_lowercase());
        previous = Some(c);
    }

    result.trim_matches('_').to_string()
}
