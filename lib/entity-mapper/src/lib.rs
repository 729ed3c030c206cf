//! Entity Mapper - metadata-driven object-to-row mapping.
//!
//! Turns a live domain object into a table name plus column values ready for
//! a parameterized insert, and renders named-parameter queries with their
//! values inlined for logging.
//!
//! # Core Concepts
//!
//! - **Entity metadata**: per-class field descriptors (column overrides,
//!   relationship kinds, identifier flags) declared statically, usually via
//!   `#[derive(Entity)]`, and cached in a [`MetadataRegistry`].
//! - **Hook chain**: ordered [`EntityChecker`]s run before mapping, followed by
//!   named [`IdGenerator`]s for identifier fields that declare one.
//! - **Formatting modes**: map mode produces raw column values, literal mode
//!   produces inline SQL text. Both share one classification order.
//!
//! # Example
//!
//! ```text
//! #[derive(Debug, Entity)]
//! #[mapped(table = "widgets")]
//! struct Widget {
//!     #[id]
//!     id: i64,
//!     name: String,
//!     is_active: bool,
//! }
//!
//! let mapper = EntityMapper::default();
//! let row = mapper.insert_row(&mut Widget { id: 0, name: "Widget".into(), is_active: true })?;
//! // row.table_name == "widgets", columns: name = "Widget", is_active = 1
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod column;
mod config;
mod entity;
mod error;
mod format;
mod hooks;
mod insert;
mod mapper;
mod metadata;
mod primary_key;
mod query;
mod registry;
mod time;
mod value;

pub use column::{
    resolve_column, should_skip_identifier_field, should_skip_identifier_field_with, to_snake_case,
};
pub use config::{IdentifierPolicy, MapperConfig, SubstitutionMode};
pub use entity::{ClassId, Entity, Mapped};
pub use error::{HookError, MapperError};
pub use format::{ValueFormatter, to_sql_literal};
pub use hooks::{
    ChangeSet, EntityChecker, FieldChange, GeneratorLookup, HookChain, IdGenerator,
    IdGeneratorRegistry,
};
pub use insert::{InsertRow, InsertRowBuilder};
pub use mapper::EntityMapper;
pub use metadata::{EntityMetadata, FieldDescriptor, RelationshipKind};
pub use primary_key::{
    PrimaryKeyResolver, PrimaryKeyValues, has_composite_identifier, identifier_field_names,
    primary_key_values,
};
pub use query::{ParameterizedQuery, QueryParameter, substitute_parameters};
pub use registry::{MetadataRegistry, MetadataSource};
pub use time::Timestamp;
pub use value::{FromValue, ToValue, Value};

// Re-export derive macro
pub use entity_mapper_derive::Entity;
