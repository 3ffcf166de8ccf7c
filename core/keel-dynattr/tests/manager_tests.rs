use std::sync::{Arc, Mutex};

use keel_dynattr::{
    CacheError, CacheUpdate, DynamicAttributesManager, SchemaIntrospector,
};
use keel_metadata::{InMemoryResources, MetadataLoader, MetadataSources, NamespaceMap};
use keel_model::AttributeDefinition;
use keel_types::HybridTimestamp;
use pretty_assertions::assert_eq;

const ORDER: &str = "com.acme.sales.Order";
const CUSTOMER: &str = "com.acme.sales.Customer";

const METADATA: &str = r#"{
    "metadata_models": [
        { "root_package": "com.acme.sales",
          "classes": ["com.acme.sales.Order", "com.acme.sales.Customer"] }
    ]
}"#;

/// Introspector whose answer can be swapped between reloads. `None` fails.
#[derive(Default)]
struct Switchable {
    definitions: Mutex<Option<Vec<AttributeDefinition>>>,
}

impl Switchable {
    fn with(definitions: Vec<AttributeDefinition>) -> Arc<Self> {
        Arc::new(Self {
            definitions: Mutex::new(Some(definitions)),
        })
    }

    fn set(&self, definitions: Option<Vec<AttributeDefinition>>) {
        *self.definitions.lock().unwrap() = definitions;
    }
}

impl SchemaIntrospector for Switchable {
    fn introspect(&self, _: &NamespaceMap) -> Result<Vec<AttributeDefinition>, CacheError> {
        self.definitions
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CacheError::Introspection("database unavailable".into()))
    }
}

fn loader() -> MetadataLoader {
    MetadataLoader::new(
        Arc::new(InMemoryResources::new().with("metadata.json", METADATA)),
        MetadataSources::new(vec!["metadata.json".into()], vec![]),
    )
}

fn manager(introspector: Arc<dyn SchemaIntrospector>) -> DynamicAttributesManager {
    DynamicAttributesManager::new(loader(), introspector)
}

fn shipping_attributes() -> Vec<AttributeDefinition> {
    vec![
        AttributeDefinition::string(ORDER, "carrier").with_order(2),
        AttributeDefinition::boolean(ORDER, "express").with_order(1),
        AttributeDefinition::integer(CUSTOMER, "loyaltyPoints"),
    ]
}

fn codes(update: &CacheUpdate, entity_type: &str) -> Vec<String> {
    update
        .snapshot()
        .expect("expected a newer snapshot")
        .attributes_for(entity_type)
        .iter()
        .map(|d| d.code.clone())
        .collect()
}

// ── Cold start ───────────────────────────────────────────────────

#[test]
fn nothing_served_before_first_load() {
    let m = manager(Arc::new(shipping_attributes()));

    assert!(m.current().is_none());
    assert!(m.get_cache_if_newer(HybridTimestamp::EPOCH).is_unchanged());
}

#[test]
fn first_load_is_newer_than_epoch() {
    let m = manager(Arc::new(shipping_attributes()));
    let stamped = m.load_cache().unwrap();

    let update = m.get_cache_if_newer(HybridTimestamp::EPOCH);
    assert_eq!(update.snapshot().unwrap().timestamp(), stamped);
    assert_eq!(codes(&update, ORDER), vec!["express", "carrier"]);
    assert_eq!(codes(&update, CUSTOMER), vec!["loyaltyPoints"]);
}

// ── Conditional fetch ────────────────────────────────────────────

#[test]
fn same_timestamp_is_unchanged() {
    let m = manager(Arc::new(shipping_attributes()));
    let stamped = m.load_cache().unwrap();

    assert_eq!(m.get_cache_if_newer(stamped), CacheUpdate::Unchanged);
}

#[test]
fn caller_ahead_of_cache_is_unchanged() {
    let m = manager(Arc::new(shipping_attributes()));
    let stamped = m.load_cache().unwrap();

    assert!(m.get_cache_if_newer(stamped.tick()).is_unchanged());
}

#[test]
fn every_reload_stamps_a_later_snapshot() {
    let m = manager(Arc::new(shipping_attributes()));
    let first = m.load_cache().unwrap();
    let second = m.load_cache().unwrap();
    let third = m.load_cache().unwrap();

    assert!(second > first);
    assert!(third > second);
    assert!(m.get_cache_if_newer(first).snapshot().is_some());
    assert_eq!(m.current().unwrap().timestamp(), third);
}

#[test]
fn reload_picks_up_changed_definitions() {
    let source = Switchable::with(shipping_attributes());
    let m = manager(source.clone());
    let first = m.load_cache().unwrap();

    source.set(Some(vec![AttributeDefinition::date(ORDER, "promisedOn")]));
    m.load_cache().unwrap();

    let update = m.get_cache_if_newer(first);
    assert_eq!(codes(&update, ORDER), vec!["promisedOn"]);
    assert!(update.snapshot().unwrap().attributes_for(CUSTOMER).is_empty());
}

#[test]
fn observed_remote_stamp_orders_next_snapshot_after_it() {
    let m = manager(Arc::new(shipping_attributes()));
    m.load_cache().unwrap();

    let remote = HybridTimestamp::new(u64::MAX / 2, 7);
    m.observe(remote);
    let stamped = m.load_cache().unwrap();

    assert!(stamped > remote);
}

// ── Failed reloads ───────────────────────────────────────────────

#[test]
fn failed_reload_keeps_previous_snapshot() {
    let source = Switchable::with(shipping_attributes());
    let m = manager(source.clone());
    let stamped = m.load_cache().unwrap();

    source.set(None);
    let err = m.load_cache().unwrap_err();

    assert!(matches!(err, CacheError::Introspection(_)));
    assert!(!err.is_configuration_error());
    assert_eq!(m.current().unwrap().timestamp(), stamped);
    assert!(m.get_cache_if_newer(stamped).is_unchanged());
}

#[test]
fn failed_first_load_serves_nothing() {
    let source = Arc::new(Switchable::default());
    let m = manager(source);

    assert!(m.load_cache().is_err());
    assert!(m.current().is_none());
}

#[test]
fn attribute_for_unknown_entity_type_fails_reload() {
    let m = manager(Arc::new(vec![AttributeDefinition::string(
        "com.acme.hr.Employee",
        "badge",
    )]));

    let err = m.load_cache().unwrap_err();
    assert!(matches!(
        err,
        CacheError::UnknownEntityType { ref entity_type, ref code }
            if entity_type == "com.acme.hr.Employee" && code == "badge"
    ));
    assert!(err.is_configuration_error());
}

#[test]
fn duplicate_code_within_entity_type_fails_reload() {
    let m = manager(Arc::new(vec![
        AttributeDefinition::string(ORDER, "carrier"),
        AttributeDefinition::integer(ORDER, "carrier"),
    ]));

    let err = m.load_cache().unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("attribute 'carrier' is declared twice for {ORDER}")
    );
}

#[test]
fn same_code_on_different_entity_types_is_allowed() {
    let m = manager(Arc::new(vec![
        AttributeDefinition::string(ORDER, "note"),
        AttributeDefinition::string(CUSTOMER, "note"),
    ]));

    m.load_cache().unwrap();
    assert_eq!(m.current().unwrap().len(), 2);
}

#[test]
fn invalid_definition_fails_reload() {
    let m = manager(Arc::new(vec![AttributeDefinition::enumeration(
        ORDER,
        "priority",
        vec![],
    )]));

    assert!(matches!(
        m.load_cache().unwrap_err(),
        CacheError::InvalidAttribute(_)
    ));
}

#[test]
fn broken_metadata_fails_reload() {
    let m = DynamicAttributesManager::new(
        MetadataLoader::new(
            Arc::new(InMemoryResources::new()),
            MetadataSources::new(vec!["missing.json".into()], vec![]),
        ),
        Arc::new(shipping_attributes()),
    );

    assert!(matches!(m.load_cache().unwrap_err(), CacheError::Metadata(_)));
}

// ── Concurrency ──────────────────────────────────────────────────

#[test]
fn readers_see_complete_generations_during_reloads() {
    let source = Switchable::with(shipping_attributes());
    let m = Arc::new(manager(source.clone()));
    m.load_cache().unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for round in 0..50 {
                let definitions = if round % 2 == 0 {
                    vec![AttributeDefinition::string(ORDER, "carrier")]
                } else {
                    shipping_attributes()
                };
                source.set(Some(definitions));
                m.load_cache().unwrap();
            }
        });

        for _ in 0..4 {
            scope.spawn(|| {
                let mut last = HybridTimestamp::EPOCH;
                for _ in 0..500 {
                    let snapshot = m.current().unwrap();
                    // Each generation is one of the two shapes, never a mix.
                    let len = snapshot.len();
                    assert!(len == 1 || len == 3, "torn snapshot with {len} attributes");
                    assert!(snapshot.timestamp() >= last);
                    last = snapshot.timestamp();
                }
            });
        }
    });
}

#[tokio::test]
async fn concurrent_async_reloads_last_stamp_wins() {
    let m = Arc::new(manager(Arc::new(shipping_attributes())));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let m = Arc::clone(&m);
            tokio::spawn(async move { m.reload().await.unwrap() })
        })
        .collect();

    let mut stamps = Vec::new();
    for handle in handles {
        stamps.push(handle.await.unwrap());
    }
    let newest = stamps.iter().max().copied().unwrap();

    stamps.sort();
    stamps.dedup();
    assert_eq!(stamps.len(), 8);
    assert_eq!(m.current().unwrap().timestamp(), newest);
}
