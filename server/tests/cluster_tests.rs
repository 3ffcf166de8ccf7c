use std::sync::Arc;
use std::time::Duration;

use keel_dynattr::{
    CacheConfig, CacheInvalidation, CacheRuntime, DynamicAttributesCacheService, DynamicAttributesManager,
    InvalidationBus,
};
use keel_metadata::{InMemoryResources, MetadataLoader, MetadataSources};
use keel_model::AttributeDefinition;
use keel_server::{AppState, LogControl, LogThreshold, build_router, spawn_peer_forwarder};

const METADATA: &str = r#"{
    "metadata_models": [
        { "root_package": "com.acme.sales", "classes": ["com.acme.sales.Order"] }
    ]
}"#;

struct Node {
    base: String,
    runtime: CacheRuntime,
    bus: InvalidationBus,
}

async fn start_node() -> Node {
    let manager = Arc::new(DynamicAttributesManager::new(
        MetadataLoader::new(
            Arc::new(InMemoryResources::new().with("metadata.json", METADATA)),
            MetadataSources::new(vec!["metadata.json".into()], vec![]),
        ),
        Arc::new(vec![AttributeDefinition::string(
            "com.acme.sales.Order",
            "carrier",
        )]),
    ));
    let bus = InvalidationBus::default();
    let runtime = CacheRuntime::start(
        manager,
        bus.clone(),
        CacheConfig {
            refresh_interval: None,
        },
    )
    .await
    .unwrap();

    let app = build_router(AppState {
        service: Arc::new(runtime.service().clone()),
        bus: bus.clone(),
        log: LogControl::detached(LogThreshold::Info),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Node {
        base: format!("http://127.0.0.1:{}", port),
        runtime,
        bus,
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// ── Peer forwarding ──────────────────────────────────────────────

#[tokio::test]
async fn reload_on_one_node_reaches_its_peer() {
    let a = start_node().await;
    let b = start_node().await;
    let forwarder = spawn_peer_forwarder(
        a.runtime.node_id(),
        a.bus.subscribe(),
        vec![format!("{}/", b.base)],
        reqwest::Client::new(),
    );

    let before = b.runtime.manager().current().unwrap().timestamp();
    let resp = reqwest::Client::new()
        .post(format!("{}/api/v1/dynamic-attributes/reload", a.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    let announced = a.runtime.manager().current().unwrap().timestamp();

    let followed = wait_until(|| {
        b.runtime
            .manager()
            .current()
            .is_some_and(|s| s.timestamp() > announced && s.timestamp() > before)
    })
    .await;
    assert!(followed);

    forwarder.abort();
}

#[tokio::test]
async fn received_invalidations_are_not_forwarded_again() {
    let a = start_node().await;
    let b = start_node().await;
    // B forwards to A, so anything B re-announced would show up on A's bus.
    let forwarder = spawn_peer_forwarder(
        b.runtime.node_id(),
        b.bus.subscribe(),
        vec![a.base.clone()],
        reqwest::Client::new(),
    );
    let mut a_rx = a.bus.subscribe();

    // Deliver A's announcement to B directly, as A's forwarder would.
    let resp = reqwest::Client::new()
        .post(format!("{}/api/v1/cluster/invalidate", b.base))
        .json(&CacheInvalidation {
            origin: a.runtime.node_id(),
            timestamp: a.runtime.manager().current().unwrap().timestamp(),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(a_rx.try_recv().is_err());

    forwarder.abort();
}

#[tokio::test]
async fn unreachable_peer_does_not_stop_forwarding() {
    let a = start_node().await;
    let b = start_node().await;
    let forwarder = spawn_peer_forwarder(
        a.runtime.node_id(),
        a.bus.subscribe(),
        vec!["http://127.0.0.1:1".to_string(), b.base.clone()],
        reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap(),
    );

    a.runtime.service().load_cache().unwrap();
    let announced = a.runtime.manager().current().unwrap().timestamp();

    let followed = wait_until(|| {
        b.runtime
            .manager()
            .current()
            .is_some_and(|s| s.timestamp() > announced)
    })
    .await;
    assert!(followed);

    forwarder.abort();
}
