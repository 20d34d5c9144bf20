//! End-to-end storage scenarios against mocked registry and manager services.
//!
//! Each test persists an insecure domain profile whose service targets are the
//! literal addresses of wiremock servers, so the full path is exercised:
//! current-domain resolution, channel establishment, and the remote calls.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nsmctl::cmd;
use nsmctl::domain::{Domain, DomainResolver};
use nsmctl::error::Error;
use nsmctl::persistence::PersistentStore;
use nsmctl::resource::registry::Storages;
use nsmctl::resource::storage::Storage;
use nsmctl::resource::{Resource, ResourceKind};

fn test_domain(registry: &str, manager: &str) -> Domain {
    Domain {
        name: "test".to_string(),
        registry_service: registry.to_string(),
        manager_service: manager.to_string(),
        is_default: true,
        is_insecure: true,
        ..Domain::default()
    }
}

/// Persists `domain` as the only profile and wires the storages on top.
fn setup(domain: &Domain) -> (TempDir, Arc<DomainResolver>, Storages) {
    let dir = TempDir::new().unwrap();
    let store = PersistentStore::new(dir.path());
    store
        .store(ResourceKind::Domain.dir_name(), &domain.name, domain)
        .unwrap();
    let resolver = Arc::new(DomainResolver::new(store.clone()));
    let storages = Storages::new(store, resolver.clone());
    (dir, resolver, storages)
}

#[tokio::test]
async fn persisted_default_domain_resolves_as_current() {
    let domain = test_domain("127.0.0.1:6001", "127.0.0.1:6000");
    let (_cache, resolver, _storages) = setup(&domain);

    assert_eq!(resolver.current().unwrap(), domain);
}

#[tokio::test]
async fn network_service_upsert_get_delete_cycle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/networkservices"))
        .and(body_json(json!({"name": "ns", "payload": ""})))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/networkservices"))
        .and(query_param("name", "ns"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"name": "ns", "payload": ""}])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/networkservices/ns"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // Once the first find is consumed, the registry reports no matches.
    Mock::given(method("GET"))
        .and(path("/networkservices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let domain = test_domain(&server.address().to_string(), "127.0.0.1:6000");
    let (_cache, _resolver, storages) = setup(&domain);
    let storage = storages.lookup("networkservice").unwrap();

    let mut service = storage.create().into_network_service().unwrap();
    service.name = "ns".to_string();
    storage
        .update("ns", Resource::NetworkService(service))
        .await
        .unwrap();

    let fetched = storage.get("ns").await.unwrap();
    assert_eq!(fetched.name(), "ns");
    assert_eq!(fetched.kind(), ResourceKind::NetworkService);

    storage.delete("ns").await.unwrap();

    match storage.get("ns").await {
        Err(Error::NotFound(_)) => {}
        other => panic!("expected NotFound after delete, got {other:?}"),
    }
}

#[tokio::test]
async fn endpoint_listing_is_a_live_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/networkserviceendpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "nse-1", "network_service_names": ["ns"], "url": "tcp://10.0.0.1:5001"},
            {"name": "nse-2", "network_service_names": ["ns"], "url": "tcp://10.0.0.2:5001"}
        ])))
        .mount(&server)
        .await;

    let domain = test_domain(&server.address().to_string(), "127.0.0.1:6000");
    let (_cache, _resolver, storages) = setup(&domain);
    let storage = storages.lookup("nses").unwrap();

    let listed = storage.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].kind(), ResourceKind::NetworkServiceEndpoint);
}

#[tokio::test]
async fn empty_registry_listing_is_an_empty_sequence() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/networkservices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let domain = test_domain(&server.address().to_string(), "127.0.0.1:6000");
    let (_cache, _resolver, storages) = setup(&domain);
    let storage = storages.lookup("netsvcs").unwrap();

    assert!(storage.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn connection_reads_consume_only_the_first_snapshot() {
    let server = MockServer::start().await;

    let first = json!({"connections": {"conn-1": {"network_service": "ns", "state": "UP"}}});
    let second = json!({"connections": {"conn-2": {"network_service": "ns", "state": "UP"}}});
    let body = format!("{first}\n{second}\n");

    Mock::given(method("GET"))
        .and(path("/connections/watch"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let domain = test_domain("127.0.0.1:6001", &server.address().to_string());
    let (_cache, _resolver, storages) = setup(&domain);
    let storage = storages.lookup("conns").unwrap();

    let listed = storage.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name(), "conn-1");
}

#[tokio::test]
async fn connection_get_scopes_the_monitor_and_reports_missing_ids() {
    let server = MockServer::start().await;

    let snapshot = json!({"connections": {"conn-1": {"network_service": "ns", "state": "UP"}}});
    Mock::given(method("GET"))
        .and(path("/connections/watch"))
        .and(query_param("id", "conn-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(format!("{snapshot}\n"), "application/x-ndjson"),
        )
        .mount(&server)
        .await;

    let empty = json!({"connections": {}});
    Mock::given(method("GET"))
        .and(path("/connections/watch"))
        .and(query_param("id", "ghost"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(format!("{empty}\n"), "application/x-ndjson"),
        )
        .mount(&server)
        .await;

    let domain = test_domain("127.0.0.1:6001", &server.address().to_string());
    let (_cache, _resolver, storages) = setup(&domain);
    let storage = storages.lookup("connection").unwrap();

    let fetched = storage.get("conn-1").await.unwrap();
    assert_eq!(fetched.name(), "conn-1");

    match storage.get("ghost").await {
        Err(Error::NotFound(_)) => {}
        other => panic!("expected NotFound for an absent id, got {other:?}"),
    }
}

#[tokio::test]
async fn use_domain_moves_the_default_flag() {
    let dir = TempDir::new().unwrap();
    let store = PersistentStore::new(dir.path());
    let namespace = ResourceKind::Domain.dir_name();

    let mut a = Domain::new("a");
    a.is_default = true;
    store.store(namespace, "a", &a).unwrap();
    store.store(namespace, "b", &Domain::new("b")).unwrap();

    let resolver = Arc::new(DomainResolver::new(store.clone()));
    let storages = Storages::new(store.clone(), resolver.clone());

    cmd::use_domain(&storages, "domain", "b").await.unwrap();

    assert_eq!(resolver.current().unwrap().name, "b");

    let reloaded: Domain = store.load(namespace, "a").unwrap();
    assert!(!reloaded.is_default);
}

#[tokio::test]
async fn use_domain_requires_an_existing_target() {
    let dir = TempDir::new().unwrap();
    let store = PersistentStore::new(dir.path());
    let resolver = Arc::new(DomainResolver::new(store.clone()));
    let storages = Storages::new(store, resolver);

    let result = cmd::use_domain(&storages, "domain", "missing").await;
    assert!(result.is_err());
}
