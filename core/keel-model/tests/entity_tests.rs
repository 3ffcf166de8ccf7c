use keel_model::{Entity, PropertyPath};
use serde_json::json;

fn make_entity(data: serde_json::Value) -> Entity {
    Entity {
        id: "ord-1".to_string(),
        entity_type: "com.acme.sales.Order".to_string(),
        data,
        dynamic_attributes: serde_json::Map::new(),
    }
}

fn path(p: &str) -> PropertyPath {
    PropertyPath::parse(p).unwrap()
}

// ── Attribute access ─────────────────────────────────────────────

#[test]
fn value_reads_top_level_attribute() {
    let e = make_entity(json!({"amount": 10}));
    assert_eq!(e.value("amount"), Some(&json!(10)));
    assert_eq!(e.value("missing"), None);
}

#[test]
fn value_ex_walks_nested_objects() {
    let e = make_entity(json!({"customer": {"address": {"city": "Samara"}}}));
    assert_eq!(e.value_ex(&path("customer.address.city")), Some(&json!("Samara")));
}

#[test]
fn value_ex_missing_link_is_none() {
    let e = make_entity(json!({"customer": null}));
    assert_eq!(e.value_ex(&path("customer.address.city")), None);
    assert_eq!(e.value_ex(&path("nothing.here")), None);
}

#[test]
fn value_ex_does_not_descend_into_scalars() {
    let e = make_entity(json!({"amount": 10}));
    assert_eq!(e.value_ex(&path("amount.value")), None);
}

#[test]
fn dynamic_values_are_separate_from_data() {
    let mut e = make_entity(json!({"rating": "static"}));
    e.set_dynamic_value("rating", json!(5));

    assert_eq!(e.value("rating"), Some(&json!("static")));
    assert_eq!(e.dynamic_value("rating"), Some(&json!(5)));
    assert_eq!(e.value_ex(&path("+rating")), Some(&json!(5)));
}

#[test]
fn value_ex_descends_into_dynamic_value() {
    let mut e = make_entity(json!({}));
    e.set_dynamic_value("warehouse", json!({"code": "W1"}));
    assert_eq!(e.value_ex(&path("+warehouse.code")), Some(&json!("W1")));
}

// ── Construction & serde ─────────────────────────────────────────

#[test]
fn new_starts_without_dynamic_values() {
    let e = Entity::new("c-1", "com.acme.sales.Customer", json!({"name": "Bob"}));
    assert_eq!(e.id, "c-1");
    assert!(e.dynamic_attributes.is_empty());
}

#[test]
fn deserialize_without_dynamic_attributes() {
    let json_str = r#"{
        "id": "abc",
        "entity_type": "com.acme.sales.Order",
        "data": {"paid": false}
    }"#;
    let e: Entity = serde_json::from_str(json_str).unwrap();
    assert_eq!(e.id, "abc");
    assert!(e.dynamic_attributes.is_empty());
    assert_eq!(e.value("paid"), Some(&json!(false)));
}

#[test]
fn empty_dynamic_attributes_are_not_serialized() {
    let e = make_entity(json!({}));
    let value = serde_json::to_value(&e).unwrap();
    assert!(value.get("dynamic_attributes").is_none());
}

#[test]
fn serde_roundtrip_keeps_dynamic_values() {
    let mut original = make_entity(json!({"number": "A-1"}));
    original.set_dynamic_value("priority", json!("high"));

    let json_str = serde_json::to_string(&original).unwrap();
    let parsed: Entity = serde_json::from_str(&json_str).unwrap();
    assert_eq!(parsed, original);
}
