#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use entity_mapper::{
    ChangeSet, Entity, EntityChecker, EntityMapper, HookChain, HookError, IdGenerator,
    IdGeneratorRegistry, MapperError, Value,
};

#[derive(Debug, Entity)]
#[mapped(table = "orders")]
struct Order {
    #[id(generator = "snowflake")]
    id: Option<i64>,
    reference: String,
}

#[derive(Debug, Entity)]
#[mapped(table = "order_lines")]
struct OrderLine {
    #[id(generator = "snowflake")]
    order_id: i64,
    #[id(generator = "line_number")]
    line: i64,
    sku: String,
}

#[derive(Debug, Entity)]
struct Invoice {
    #[id(generator = "NonExistentIdGenerator")]
    id: Option<i64>,
}

struct Sequence {
    next: AtomicI64,
}

impl Sequence {
    fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl IdGenerator for Sequence {
    fn generate(&self, _entity: &dyn Entity) -> Result<Value, HookError> {
        Ok(Value::Int(self.next.fetch_add(1, Ordering::SeqCst)))
    }
}

struct Audit {
    seen: Arc<Mutex<Vec<String>>>,
}

impl EntityChecker for Audit {
    fn name(&self) -> &str {
        "audit"
    }

    fn pre_persist(&self, entity: &mut dyn Entity) -> Result<(), HookError> {
        let id = entity.field_value("id").unwrap_or(Value::Null);
        let class = entity.class_id().name().rsplit("::").next().unwrap_or_default();
        self.seen
            .lock()
            .unwrap()
            .push(format!("persist:{}:{}", class, id.is_null()));
        Ok(())
    }

    fn pre_update(&self, _entity: &mut dyn Entity, changes: &ChangeSet) -> Result<(), HookError> {
        for change in changes.iter() {
            self.seen.lock().unwrap().push(format!("update:{}", change.field));
        }
        Ok(())
    }
}

struct RequireReference;

impl EntityChecker for RequireReference {
    fn pre_persist(&self, entity: &mut dyn Entity) -> Result<(), HookError> {
        match entity.field_value("reference") {
            Some(Value::String(s)) if s.is_empty() => Err("reference must not be empty".into()),
            _ => Ok(()),
        }
    }
}

fn generators() -> IdGeneratorRegistry {
    IdGeneratorRegistry::new()
        .with_generator("snowflake", Sequence::starting_at(9000))
        .with_generator("line_number", Sequence::starting_at(1))
}

#[test]
fn test_generated_identifier_lands_in_row() {
    let mapper = EntityMapper::default().with_hooks(HookChain::new(generators()));
    let mut order = Order {
        id: None,
        reference: "A-1".to_string(),
    };

    let row = mapper.insert_row(&mut order).unwrap();

    assert_eq!(order.id, Some(9000));
    assert_eq!(row.get("id"), Some(&Value::Int(9000)));
    assert_eq!(row.get("reference"), Some(&Value::from("A-1")));
}

#[test]
fn test_checkers_run_before_generation() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hooks = HookChain::new(generators()).with_checker(Audit { seen: seen.clone() });
    let mapper = EntityMapper::default().with_hooks(hooks);
    let mut order = Order {
        id: None,
        reference: "A-2".to_string(),
    };

    mapper.insert_row(&mut order).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["persist:Order:true"]);
    assert!(order.id.is_some());
}

#[test]
fn test_each_insert_generates_again() {
    let mapper = EntityMapper::default().with_hooks(HookChain::new(generators()));
    let mut order = Order {
        id: None,
        reference: "A-3".to_string(),
    };

    let first = mapper.insert_row(&mut order).unwrap();
    let second = mapper.insert_row(&mut order).unwrap();

    assert_eq!(first.get("id"), Some(&Value::Int(9000)));
    assert_eq!(second.get("id"), Some(&Value::Int(9001)));
}

#[test]
fn test_composite_identifier_generates_every_field() {
    let mapper = EntityMapper::default().with_hooks(HookChain::new(generators()));
    let mut line = OrderLine {
        order_id: 0,
        line: 0,
        sku: "SKU-1".to_string(),
    };

    let row = mapper.insert_row(&mut line).unwrap();

    assert_eq!((line.order_id, line.line), (9000, 1));
    assert_eq!(row.get("order_id"), Some(&Value::Int(9000)));
    assert_eq!(row.get("line"), Some(&Value::Int(1)));
    assert!(mapper.primary_keys().has_composite_identifier(line.class_id()).unwrap());
    assert_eq!(line.identifier(), None);
}

#[test]
fn test_missing_generator_aborts() {
    let mapper = EntityMapper::default().with_hooks(HookChain::new(generators()));
    let mut invoice = Invoice { id: None };

    let err = mapper.insert_row(&mut invoice).unwrap_err();

    assert!(matches!(
        err,
        MapperError::GeneratorNotFound(name) if name == "NonExistentIdGenerator"
    ));
    assert_eq!(invoice.id, None);
}

#[test]
fn test_failing_checker_aborts_without_row() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hooks = HookChain::new(generators())
        .with_checker(RequireReference)
        .with_checker(Audit { seen: seen.clone() });
    let mapper = EntityMapper::default().with_hooks(hooks);
    let mut order = Order {
        id: None,
        reference: String::new(),
    };

    let err = mapper.insert_row(&mut order).unwrap_err();

    assert!(matches!(
        &err,
        MapperError::HookFailed { hook, .. } if hook.ends_with("RequireReference")
    ));
    assert!(std::error::Error::source(&err).is_some());
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(order.id, None);
}

#[test]
fn test_pre_update_sees_changes() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hooks = HookChain::new(generators()).with_checker(Audit { seen: seen.clone() });
    let mapper = EntityMapper::default().with_hooks(hooks);
    let mut order = Order {
        id: Some(1),
        reference: "B-1".to_string(),
    };
    let changes = ChangeSet::new().change("reference", "B-0", "B-1");

    mapper.pre_update(&mut order, &changes).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["update:reference"]);
    assert_eq!(order.id, Some(1));
}
