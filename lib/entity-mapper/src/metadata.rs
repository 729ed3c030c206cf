//! Class-level mapping metadata.
//!
//! Descriptors are built once per class (by the derive macro or by hand) and
//! are immutable afterwards.

use crate::ClassId;

/// The type of relationship a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    /// Many-to-one: many `Product`s belong to one `Category`.
    ManyToOne,
    /// One-to-one: `User` has one `Profile`.
    OneToOne,
    /// One-to-many: one `Category` has many `Product`s.
    OneToMany,
    /// Many-to-many: `Product`s have many `Tag`s via a link table.
    ManyToMany,
}

impl RelationshipKind {
    /// To-many sides never map to a column.
    pub fn is_collection(&self) -> bool {
        matches!(self, RelationshipKind::OneToMany | RelationshipKind::ManyToMany)
    }
}

/// Mapping metadata for one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as the entity exposes it.
    pub name: String,

    /// Explicit column name, used verbatim when present.
    pub column: Option<String>,

    /// Relationship kind, `None` for plain columns.
    pub relationship: Option<RelationshipKind>,

    /// Whether the field is (part of) the identifier.
    pub identifier: bool,

    /// One-to-one field without an owning join column.
    pub inverse_side: bool,

    /// Name of a custom identifier generator.
    pub generator: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: None,
            relationship: None,
            identifier: false,
            inverse_side: false,
            generator: None,
        }
    }

    /// Set an explicit column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn relationship(mut self, kind: RelationshipKind) -> Self {
        self.relationship = Some(kind);
        self
    }

    pub fn many_to_one(self) -> Self {
        self.relationship(RelationshipKind::ManyToOne)
    }

    /// Owning one-to-one side (holds the join column).
    pub fn one_to_one(self) -> Self {
        self.relationship(RelationshipKind::OneToOne)
    }

    /// Inverse one-to-one side (no join column).
    pub fn one_to_one_inverse(mut self) -> Self {
        self.inverse_side = true;
        self.relationship(RelationshipKind::OneToOne)
    }

    pub fn one_to_many(self) -> Self {
        self.relationship(RelationshipKind::OneToMany)
    }

    pub fn many_to_many(self) -> Self {
        self.relationship(RelationshipKind::ManyToMany)
    }

    /// Mark the field as an identifier.
    pub fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    /// Mark the field as an identifier filled by the named generator.
    pub fn generated_by(mut self, generator: impl Into<String>) -> Self {
        self.identifier = true;
        self.generator = Some(generator.into());
        self
    }

    pub fn is_relationship(&self, kind: RelationshipKind) -> bool {
        self.relationship == Some(kind)
    }
}

/// Mapping metadata for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    pub class: ClassId,
    pub table_name: String,
    /// Declared fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Identifier field names in declaration order.
    pub identifier_field_names: Vec<String>,
}

impl EntityMetadata {
    pub fn new(
        class: ClassId,
        table_name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        let identifier_field_names = fields
            .iter()
            .filter(|f| f.identifier)
            .map(|f| f.name.clone())
            .collect();

        Self {
            class,
            table_name: table_name.into(),
            fields,
            identifier_field_names,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Descriptors of the identifier fields, in declaration order.
    pub fn identifier_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.identifier)
    }

    /// Value objects and join rows may have no identifier.
    pub fn has_identifier(&self) -> bool {
        !self.identifier_field_names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order;

    #[test]
    fn test_field_descriptor_builder_chain() {
        let field = FieldDescriptor::new("customer")
            .many_to_one()
            .column("buyer_id");

        assert_eq!(field.name, "customer");
        assert_eq!(field.column.as_deref(), Some("buyer_id"));
        assert_eq!(field.relationship, Some(RelationshipKind::ManyToOne));
        assert!(!field.identifier);
        assert!(!field.inverse_side);
        assert_eq!(field.generator, None);
    }

    #[test]
    fn test_generated_by_marks_identifier() {
        let field = FieldDescriptor::new("id").generated_by("snowflake");
        assert!(field.identifier);
        assert_eq!(field.generator.as_deref(), Some("snowflake"));
    }

    #[test]
    fn test_identifier_names_follow_declaration_order() {
        let metadata = EntityMetadata::new(
            ClassId::of::<Order>(),
            "orders",
            vec![
                FieldDescriptor::new("region").identifier(),
                FieldDescriptor::new("total"),
                FieldDescriptor::new("number").identifier(),
            ],
        );

        assert_eq!(metadata.identifier_field_names, vec!["region", "number"]);
        assert!(metadata.has_identifier());
        assert_eq!(metadata.identifier_fields().count(), 2);
        assert!(metadata.field("total").is_some());
        assert!(metadata.field("missing").is_none());
    }

    #[test]
    fn test_collection_kinds() {
        assert!(RelationshipKind::OneToMany.is_collection());
        assert!(RelationshipKind::ManyToMany.is_collection());
        assert!(!RelationshipKind::ManyToOne.is_collection());
        assert!(!RelationshipKind::OneToOne.is_collection());
    }
}
