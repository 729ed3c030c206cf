//! Insert-row construction for a single entity.

use crate::column::{resolve_column, should_skip_identifier_field_with};
use crate::{
    Entity, EntityMetadata, HookChain, IdentifierPolicy, MapperError, MetadataSource,
    QueryParameter, SubstitutionMode, Value, ValueFormatter, substitute_parameters,
};

/// Table name plus column values ready for a database write.
///
/// Columns keep the order they were first inserted in; inserting an existing
/// column replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRow {
    pub table_name: String,
    columns: Vec<(String, Value)>,
}

impl InsertRow {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// INSERT statement with a named placeholder per column.
    pub fn insert_sql(&self) -> String {
        let names: Vec<&str> = self.column_names().collect();
        let placeholders: Vec<String> = names.iter().map(|name| format!(":{}", name)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_name,
            names.join(", "),
            placeholders.join(", ")
        )
    }

    /// Column values as parameters for the placeholders of [`InsertRow::insert_sql`].
    pub fn parameters(&self) -> Vec<QueryParameter> {
        self.columns
            .iter()
            .map(|(name, value)| QueryParameter::new(name.clone(), value.clone()))
            .collect()
    }

    /// The insert statement with every value inlined, for logs.
    pub fn to_literal_sql(&self, mode: SubstitutionMode) -> String {
        substitute_parameters(&self.insert_sql(), &self.parameters(), mode)
    }
}

/// Turns one entity into an [`InsertRow`].
pub struct InsertRowBuilder<'a> {
    hooks: &'a HookChain,
    source: &'a dyn MetadataSource,
    policy: IdentifierPolicy,
}

impl<'a> InsertRowBuilder<'a> {
    pub fn new(hooks: &'a HookChain, source: &'a dyn MetadataSource) -> Self {
        Self {
            hooks,
            source,
            policy: IdentifierPolicy::default(),
        }
    }

    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the row for an entity whose metadata comes from the metadata source.
    pub fn build_for(&self, entity: &mut dyn Entity) -> Result<InsertRow, MapperError> {
        let metadata = self.source.metadata_of(entity)?;
        self.build(&metadata, entity)
    }

    /// Run the pre-persist hooks, then map every insertable field.
    ///
    /// Hooks mutate the entity, so building twice after an identifier was
    /// generated does not yield the same row.
    pub fn build(
        &self,
        metadata: &EntityMetadata,
        entity: &mut dyn Entity,
    ) -> Result<InsertRow, MapperError> {
        self.hooks.pre_persist(metadata, entity)?;

        let formatter = ValueFormatter::new(self.source);
        let mut row = InsertRow::new(metadata.table_name.clone());

        for field in &metadata.fields {
            let Some(column) = resolve_column(field) else {
                tracing::trace!(field = %field.name, "Field has no column, skipping");
                continue;
            };

            let value = entity
                .field_value(&field.name)
                .ok_or_else(|| MapperError::FieldNotFound {
                    class: metadata.class.name().to_string(),
                    field: field.name.clone(),
                })?;

            if should_skip_identifier_field_with(field, &value, self.policy) {
                tracing::trace!(field = %field.name, "Identifier not assigned, skipping");
                continue;
            }

            row.insert(column, formatter.to_column_value(&value)?);
        }

        tracing::debug!(
            class = metadata.class.name(),
            table = %row.table_name,
            columns = row.len(),
            "Built insert row"
        );
        Ok(row)
    }
}
