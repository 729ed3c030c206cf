//! Process-lifetime metadata cache.
//!
//! - `MetadataSource`: read contract the mapper consumes
//! - `MetadataRegistry`: lazily populated, read-mostly implementation

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{ClassId, Entity, EntityMetadata, MapperError, Mapped};

/// Supplies metadata per class.
pub trait MetadataSource: Send + Sync {
    /// Metadata for a class, failing with `MetadataNotFound` if unmapped.
    fn metadata(&self, class: ClassId) -> Result<Arc<EntityMetadata>, MapperError>;

    /// Metadata for the class of a live object.
    fn metadata_of(&self, entity: &dyn Entity) -> Result<Arc<EntityMetadata>, MapperError> {
        self.metadata(entity.class_id())
    }
}

/// Thread-safe metadata cache keyed by class identity.
///
/// Metadata is built on first use and cached for the lifetime of the
/// registry; entries are never evicted. Two callers racing on the first
/// build may both compute it, the last insert wins and both results are
/// identical.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    cache: RwLock<HashMap<ClassId, Arc<EntityMetadata>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapped type up front.
    pub fn register<T: Mapped>(&self) -> Arc<EntityMetadata> {
        self.insert(T::entity_metadata())
    }

    /// Register hand-authored metadata, replacing any previous entry.
    pub fn insert(&self, metadata: EntityMetadata) -> Arc<EntityMetadata> {
        let class = metadata.class;
        let metadata = Arc::new(metadata);
        {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            cache.insert(class, metadata.clone());
        }
        tracing::debug!(
            class = class.name(),
            table = %metadata.table_name,
            fields = metadata.fields.len(),
            "Cached entity metadata"
        );
        metadata
    }

    /// Metadata for a mapped type, built and cached on first use.
    pub fn metadata_for<T: Mapped>(&self) -> Arc<EntityMetadata> {
        match self.cached(T::class()) {
            Some(metadata) => metadata,
            None => self.register::<T>(),
        }
    }

    pub fn contains(&self, class: ClassId) -> bool {
        self.cached(class).is_some()
    }

    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, class: ClassId) -> Option<Arc<EntityMetadata>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(&class).cloned()
    }
}

impl MetadataSource for MetadataRegistry {
    fn metadata(&self, class: ClassId) -> Result<Arc<EntityMetadata>, MapperError> {
        self.cached(class)
            .ok_or_else(|| MapperError::MetadataNotFound(class.name().to_string()))
    }

    fn metadata_of(&self, entity: &dyn Entity) -> Result<Arc<EntityMetadata>, MapperError> {
        let class = entity.class_id();
        if let Some(metadata) = self.cached(class) {
            return Ok(metadata);
        }

        match entity.describe() {
            Some(metadata) => Ok(self.insert(metadata)),
            None => Err(MapperError::MetadataNotFound(class.name().to_string())),
        }
    }
}
