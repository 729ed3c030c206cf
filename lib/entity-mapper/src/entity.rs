//! Entity traits for metadata-driven mapping.
//!
//! Types implementing [`Entity`] expose their persistent fields by name so the
//! mapper never needs runtime reflection. Add `#[derive(Entity)]` to a struct
//! to generate both [`Entity`] and [`Mapped`].

use std::any::TypeId;
use std::fmt;

use crate::{EntityMetadata, MapperError, Value};

/// Class identity used to key the metadata registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId {
    type_id: TypeId,
    name: &'static str,
}

impl ClassId {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A live domain object the mapper can read (and, for identifiers, write).
///
/// # Example
///
/// ```text
/// #[derive(Debug, Entity)]
/// #[mapped(table = "products")]
/// pub struct Product {
///     #[id]
///     pub id: Option<i64>,
///     pub name: String,
///     pub is_active: bool,
///     #[many_to_one]
///     pub category: Option<Arc<Category>>,
///     #[one_to_many]
///     pub variants: Vec<Arc<Variant>>,
/// }
/// ```
///
/// # Field names
///
/// `field_value` and `set_field_value` are keyed by the descriptor name,
/// which is the Rust field name for derived entities.
pub trait Entity: fmt::Debug + Send + Sync {
    fn class_id(&self) -> ClassId;

    /// Metadata for this object's class, or `None` when it is not mapped.
    ///
    /// Used by the registry to build metadata lazily on first use.
    fn describe(&self) -> Option<EntityMetadata> {
        None
    }

    /// Current value of a field, `None` if the object has no such field.
    fn field_value(&self, field: &str) -> Option<Value>;

    /// Low-level field write used for generated identifiers.
    fn set_field_value(&mut self, field: &str, _value: Value) -> Result<(), MapperError> {
        Err(MapperError::FieldNotWritable {
            class: self.class_id().name().to_string(),
            field: field.to_string(),
        })
    }

    /// Identifier accessor; `None` when the object exposes no single identifier.
    fn identifier(&self) -> Option<Value> {
        None
    }
}

/// Types with statically declared metadata.
pub trait Mapped: Entity + Sized + 'static {
    fn entity_metadata() -> EntityMetadata;

    fn class() -> ClassId {
        ClassId::of::<Self>()
    }
}
