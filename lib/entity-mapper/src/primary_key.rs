//! Identifier field lookup and extraction.

use crate::{ClassId, Entity, EntityMetadata, MapperError, MetadataSource, Value};

/// Identifier field names and their current values, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryKeyValues(Vec<(String, Value)>);

impl PrimaryKeyValues {
    pub fn first(&self) -> Option<&Value> {
        self.0.first().map(|(_, value)| value)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0.into_iter().map(|(_, value)| value).collect()
    }
}

/// Read the identifier values of `entity` as described by `metadata`.
pub fn primary_key_values(
    metadata: &EntityMetadata,
    entity: &dyn Entity,
) -> Result<PrimaryKeyValues, MapperError> {
    let mut values = Vec::with_capacity(metadata.identifier_field_names.len());
    for field in &metadata.identifier_field_names {
        let value = entity
            .field_value(field)
            .ok_or_else(|| MapperError::FieldNotFound {
                class: metadata.class.name().to_string(),
                field: field.clone(),
            })?;
        values.push((field.clone(), value));
    }
    Ok(PrimaryKeyValues(values))
}

pub fn has_composite_identifier(metadata: &EntityMetadata) -> bool {
    metadata.identifier_field_names.len() > 1
}

pub fn identifier_field_names(metadata: &EntityMetadata) -> &[String] {
    &metadata.identifier_field_names
}

/// Primary key operations keyed by object or class, backed by a metadata source.
///
/// `MetadataNotFound` is always propagated; callers decide whether to recover.
#[derive(Clone, Copy)]
pub struct PrimaryKeyResolver<'a> {
    source: &'a dyn MetadataSource,
}

impl<'a> PrimaryKeyResolver<'a> {
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self { source }
    }

    pub fn primary_key_values(&self, entity: &dyn Entity) -> Result<PrimaryKeyValues, MapperError> {
        let metadata = self.source.metadata_of(entity)?;
        primary_key_values(&metadata, entity)
    }

    pub fn has_composite_identifier(&self, class: ClassId) -> Result<bool, MapperError> {
        Ok(has_composite_identifier(&*self.source.metadata(class)?))
    }

    pub fn identifier_field_names(&self, class: ClassId) -> Result<Vec<String>, MapperError> {
        Ok(self.source.metadata(class)?.identifier_field_names.clone())
    }
}
