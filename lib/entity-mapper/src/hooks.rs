//! Pre-save hooks and custom identifier generation.
//!
//! Checkers keep cross-cutting automation (timestamps, snowflake ids, audit
//! fields) out of the entities themselves. They run in registration order
//! and the first failure aborts the chain.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{Entity, EntityMetadata, HookError, MapperError, Value};

/// A pluggable check run against an entity before it is mapped.
pub trait EntityChecker: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs before an entity is inserted.
    fn pre_persist(&self, entity: &mut dyn Entity) -> Result<(), HookError>;

    /// Runs before an entity is updated.
    fn pre_update(&self, _entity: &mut dyn Entity, _changes: &ChangeSet) -> Result<(), HookError> {
        Ok(())
    }
}

/// Produces an identifier value for a new entity.
pub trait IdGenerator: Send + Sync {
    fn generate(&self, entity: &dyn Entity) -> Result<Value, HookError>;
}

/// Looks generators up by the name a field declares.
pub trait GeneratorLookup: Send + Sync {
    fn lookup(&self, name: &str) -> Result<Arc<dyn IdGenerator>, MapperError>;
}

/// Map-backed generator lookup.
#[derive(Default, Clone)]
pub struct IdGeneratorRegistry {
    generators: HashMap<String, Arc<dyn IdGenerator>>,
}

impl IdGeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, generator: impl IdGenerator + 'static) {
        self.generators.insert(name.into(), Arc::new(generator));
    }

    pub fn with_generator(
        mut self,
        name: impl Into<String>,
        generator: impl IdGenerator + 'static,
    ) -> Self {
        self.register(name, generator);
        self
    }
}

impl GeneratorLookup for IdGeneratorRegistry {
    fn lookup(&self, name: &str) -> Result<Arc<dyn IdGenerator>, MapperError> {
        self.generators
            .get(name)
            .cloned()
            .ok_or_else(|| MapperError::GeneratorNotFound(name.to_string()))
    }
}

/// One changed field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

/// Changed fields handed to `pre_update`, in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn change(
        mut self,
        field: impl Into<String>,
        old: impl Into<Value>,
        new: impl Into<Value>,
    ) -> Self {
        self.changes.push(FieldChange {
            field: field.into(),
            old: old.into(),
            new: new.into(),
        });
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }

    pub fn has_changed(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Ordered checkers plus the generator lookup used for identifier fields.
pub struct HookChain {
    checkers: Vec<Arc<dyn EntityChecker>>,
    generators: Arc<dyn GeneratorLookup>,
}

impl Default for HookChain {
    fn default() -> Self {
        Self::new(IdGeneratorRegistry::new())
    }
}

impl HookChain {
    pub fn new(generators: impl GeneratorLookup + 'static) -> Self {
        Self {
            checkers: Vec::new(),
            generators: Arc::new(generators),
        }
    }

    /// Append a checker; checkers run in the order they are added.
    pub fn push(&mut self, checker: impl EntityChecker + 'static) {
        self.checkers.push(Arc::new(checker));
    }

    pub fn with_checker(mut self, checker: impl EntityChecker + 'static) -> Self {
        self.push(checker);
        self
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Run every checker, then fill identifier fields that declare a generator.
    ///
    /// Generated values are written directly onto the entity. Calling this
    /// twice on the same entity generates twice.
    pub fn pre_persist(
        &self,
        metadata: &EntityMetadata,
        entity: &mut dyn Entity,
    ) -> Result<(), MapperError> {
        tracing::debug!(
            class = metadata.class.name(),
            checkers = self.checkers.len(),
            "Running pre-persist checkers"
        );

        for checker in &self.checkers {
            checker
                .pre_persist(entity)
                .map_err(|source| MapperError::HookFailed {
                    hook: checker.name().to_string(),
                    source,
                })?;
        }

        for field in metadata.identifier_fields() {
            let Some(name) = &field.generator else {
                continue;
            };

            let generator = self.generators.lookup(name)?;
            let value = generator
                .generate(entity)
                .map_err(|source| MapperError::GeneratorFailed {
                    generator: name.clone(),
                    source,
                })?;

            tracing::debug!(
                class = metadata.class.name(),
                field = %field.name,
                generator = %name,
                "Assigning generated identifier"
            );
            entity.set_field_value(&field.name, value)?;
        }

        Ok(())
    }

    /// Run every checker's `pre_update`. Identifiers are never generated here.
    pub fn pre_update(
        &self,
        entity: &mut dyn Entity,
        changes: &ChangeSet,
    ) -> Result<(), MapperError> {
        for checker in &self.checkers {
            checker
                .pre_update(entity, changes)
                .map_err(|source| MapperError::HookFailed {
                    hook: checker.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassId, FieldDescriptor};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Ticket {
        id: Option<String>,
        title: String,
    }

    impl Entity for Ticket {
        fn class_id(&self) -> ClassId {
            ClassId::of::<Self>()
        }

        fn field_value(&self, field: &str) -> Option<Value> {
            match field {
                "id" => Some(self.id.clone().into()),
                "title" => Some(Value::from(&self.title)),
                _ => None,
            }
        }

        fn set_field_value(&mut self, field: &str, value: Value) -> Result<(), MapperError> {
            match field {
                "id" => {
                    self.id = crate::FromValue::from_value(value)?;
                    Ok(())
                }
                _ => Err(MapperError::FieldNotWritable {
                    class: "Ticket".to_string(),
                    field: field.to_string(),
                }),
            }
        }
    }

    fn metadata(id: FieldDescriptor) -> EntityMetadata {
        EntityMetadata::new(
            ClassId::of::<Ticket>(),
            "tickets",
            vec![id, FieldDescriptor::new("title")],
        )
    }

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl EntityChecker for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn pre_persist(&self, entity: &mut dyn Entity) -> Result<(), HookError> {
            let title = entity.field_value("title").and_then(|v| v.scalar_text());
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, title.unwrap_or_default()));
            Ok(())
        }

        fn pre_update(
            &self,
            _entity: &mut dyn Entity,
            changes: &ChangeSet,
        ) -> Result<(), HookError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:update:{}", self.label, changes.len()));
            Ok(())
        }
    }

    struct Reject;

    impl EntityChecker for Reject {
        fn pre_persist(&self, _entity: &mut dyn Entity) -> Result<(), HookError> {
            Err("title must not be empty".into())
        }
    }

    struct Fixed(&'static str);

    impl IdGenerator for Fixed {
        fn generate(&self, _entity: &dyn Entity) -> Result<Value, HookError> {
            Ok(Value::from(self.0))
        }
    }

    struct Broken;

    impl IdGenerator for Broken {
        fn generate(&self, _entity: &dyn Entity) -> Result<Value, HookError> {
            Err("sequence exhausted".into())
        }
    }

    #[test]
    fn test_checkers_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = HookChain::default()
            .with_checker(Recorder { label: "first", log: log.clone() })
            .with_checker(Recorder { label: "second", log: log.clone() });
        let mut ticket = Ticket {
            title: "Leak".to_string(),
            ..Default::default()
        };

        chain
            .pre_persist(&metadata(FieldDescriptor::new("id").identifier()), &mut ticket)
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first:Leak", "second:Leak"]);
        assert_eq!(ticket.id, None);
    }

    #[test]
    fn test_first_failure_aborts_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = HookChain::default()
            .with_checker(Reject)
            .with_checker(Recorder { label: "after", log: log.clone() });
        let mut ticket = Ticket::default();

        let err = chain
            .pre_persist(&metadata(FieldDescriptor::new("id").identifier()), &mut ticket)
            .unwrap_err();

        assert!(matches!(&err, MapperError::HookFailed { hook, .. } if hook.ends_with("Reject")));
        assert!(err.to_string().contains("title must not be empty"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_generator_assigns_identifier() {
        let chain = HookChain::new(
            IdGeneratorRegistry::new().with_generator("ticket_code", Fixed("T-100")),
        );
        let mut ticket = Ticket::default();

        chain
            .pre_persist(
                &metadata(FieldDescriptor::new("id").generated_by("ticket_code")),
                &mut ticket,
            )
            .unwrap();

        assert_eq!(ticket.id.as_deref(), Some("T-100"));
    }

    #[test]
    fn test_missing_generator_is_reported() {
        let chain = HookChain::default();
        let mut ticket = Ticket::default();

        let err = chain
            .pre_persist(
                &metadata(FieldDescriptor::new("id").generated_by("NonExistentIdGenerator")),
                &mut ticket,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            MapperError::GeneratorNotFound(name) if name == "NonExistentIdGenerator"
        ));
        assert_eq!(ticket.id, None);
    }

    #[test]
    fn test_generator_failure_is_reported() {
        let chain = HookChain::new(IdGeneratorRegistry::new().with_generator("seq", Broken));
        let mut ticket = Ticket::default();

        let err = chain
            .pre_persist(&metadata(FieldDescriptor::new("id").generated_by("seq")), &mut ticket)
            .unwrap_err();

        assert!(matches!(
            err,
            MapperError::GeneratorFailed { generator, .. } if generator == "seq"
        ));
    }

    #[test]
    fn test_no_identifier_skips_generation() {
        let chain = HookChain::default();
        let metadata = EntityMetadata::new(
            ClassId::of::<Ticket>(),
            "tickets",
            vec![FieldDescriptor::new("title")],
        );
        let mut ticket = Ticket::default();

        chain.pre_persist(&metadata, &mut ticket).unwrap();
    }

    #[test]
    fn test_pre_update_runs_every_checker() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = HookChain::default()
            .with_checker(Recorder { label: "a", log: log.clone() })
            .with_checker(Recorder { label: "b", log: log.clone() });
        let changes = ChangeSet::new().change("title", "Old", "New");
        let mut ticket = Ticket::default();

        chain.pre_update(&mut ticket, &changes).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["a:update:1", "b:update:1"]);
        assert!(changes.has_changed("title"));
        assert_eq!(changes.get("title").map(|c| &c.new), Some(&Value::from("New")));
    }
}
