use crate::{
    ChangeSet, Entity, EntityMetadata, HookChain, InsertRow, InsertRowBuilder, MapperConfig,
    MapperError, MetadataRegistry, ParameterizedQuery, PrimaryKeyResolver, ValueFormatter,
};

/// Owns the metadata registry, the hook chain and the configuration.
///
/// Build one at startup and share it by reference; every operation takes
/// `&self`.
pub struct EntityMapper {
    pub registry: MetadataRegistry,
    pub hooks: HookChain,
    pub config: MapperConfig,
}

impl Default for EntityMapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl EntityMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            registry: MetadataRegistry::new(),
            hooks: HookChain::default(),
            config,
        }
    }

    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = hooks;
        self
    }

    fn builder(&self) -> InsertRowBuilder<'_> {
        InsertRowBuilder::new(&self.hooks, &self.registry)
            .identifier_policy(self.config.identifier_policy)
    }

    /// Insert row for an entity, looking its metadata up in the registry.
    pub fn insert_row(&self, entity: &mut dyn Entity) -> Result<InsertRow, MapperError> {
        self.builder().build_for(entity)
    }

    /// Insert row for an entity with caller-supplied metadata.
    pub fn insert_row_for(
        &self,
        metadata: &EntityMetadata,
        entity: &mut dyn Entity,
    ) -> Result<InsertRow, MapperError> {
        self.builder().build(metadata, entity)
    }

    /// Run the `pre_update` side of the hook chain.
    pub fn pre_update(
        &self,
        entity: &mut dyn Entity,
        changes: &ChangeSet,
    ) -> Result<(), MapperError> {
        self.hooks.pre_update(entity, changes)
    }

    /// Query text with parameters inlined, using the configured substitution mode.
    pub fn to_literal_sql(&self, query: &ParameterizedQuery) -> String {
        query.to_literal_sql(self.config.substitution)
    }

    pub fn primary_keys(&self) -> PrimaryKeyResolver<'_> {
        PrimaryKeyResolver::new(&self.registry)
    }

    pub fn formatter(&self) -> ValueFormatter<'_> {
        ValueFormatter::new(&self.registry)
    }
}
