use keel_metadata::{ConfigurationError, NamespaceMap};

// ── Declaration ──────────────────────────────────────────────────

#[test]
fn declare_is_idempotent() {
    let mut map = NamespaceMap::new();
    let a = map.declare("com.acme.sales");
    let b = map.declare("com.acme.crm");
    assert_eq!(map.declare("com.acme.sales"), a);
    assert_ne!(a, b);
    assert_eq!(map.len(), 2);
    assert!(!map.is_empty());
}

#[test]
fn empty_map() {
    let map = NamespaceMap::new();
    assert!(map.is_empty());
    assert_eq!(map.member_count(), 0);
    assert_eq!(map.members("anything"), None);
}

// ── Membership ───────────────────────────────────────────────────

#[test]
fn insert_member_updates_reverse_index() {
    let mut map = NamespaceMap::new();
    let sales = map.declare("com.acme.sales");
    map.insert_member(sales, "com.acme.sales.Order").unwrap();

    assert!(map.contains_member("com.acme.sales.Order"));
    assert_eq!(map.namespace_of("com.acme.sales.Order"), Some("com.acme.sales"));
    assert_eq!(map.member_count(), 1);
}

#[test]
fn duplicate_in_same_namespace_is_rejected() {
    let mut map = NamespaceMap::new();
    let sales = map.declare("com.acme.sales");
    map.insert_member(sales, "com.acme.sales.Order").unwrap();
    let err = map.insert_member(sales, "com.acme.sales.Order").unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::DuplicateMember {
            member: "com.acme.sales.Order".into(),
            namespace: "com.acme.sales".into(),
        }
    );
    assert_eq!(map.members("com.acme.sales").unwrap().len(), 1);
}

#[test]
fn duplicate_across_namespaces_names_first_owner() {
    let mut map = NamespaceMap::new();
    let sales = map.declare("com.acme.sales");
    let crm = map.declare("com.acme.crm");
    map.insert_member(sales, "com.acme.shared.Address").unwrap();
    let err = map.insert_member(crm, "com.acme.shared.Address").unwrap_err();
    assert!(err.to_string().ends_with("into model com.acme.sales"));
}

#[test]
fn all_members_in_namespace_order() {
    let mut map = NamespaceMap::new();
    let b = map.declare("b");
    let a = map.declare("a");
    map.insert_member(a, "a.X").unwrap();
    map.insert_member(b, "b.Y").unwrap();
    map.insert_member(b, "b.Z").unwrap();
    assert_eq!(map.all_members().collect::<Vec<_>>(), vec!["b.Y", "b.Z", "a.X"]);
}

// ── Owner lookup ─────────────────────────────────────────────────

#[test]
fn owning_namespace_requires_dot_boundary() {
    let mut map = NamespaceMap::new();
    let sales = map.declare("com.acme.sales");
    assert_eq!(map.owning_namespace_for("com.acme.sales.Order"), Some(sales));
    assert_eq!(map.owning_namespace_for("com.acme.sales.impl.Line"), Some(sales));
    assert_eq!(map.owning_namespace_for("com.acme.salesforce.Lead"), None);
    assert_eq!(map.owning_namespace_for("com.acme.sales"), None);
    assert_eq!(map.owning_namespace_for("com.acme.sales."), None);
}

#[test]
fn owning_namespace_prefers_encounter_order() {
    let mut map = NamespaceMap::new();
    let specific = map.declare("com.acme.sales");
    let _general = map.declare("com.acme");
    assert_eq!(map.owning_namespace_for("com.acme.sales.Order"), Some(specific));
}
