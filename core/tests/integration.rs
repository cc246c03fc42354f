//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in its own thread and runtime,
//! then drives `HttpClient` through `RequestAdapter` over real HTTP. Covers
//! the JSON error convention, query parameters, configured headers and
//! transport failures.

use std::net::SocketAddr;

use mock_server::Item;
use req_state::{
    tracing_observer, ClientCache, ClientConfig, RequestAdapter, RequestState, UNKNOWN_CODE,
};
use serde_json::{json, Value};

/// Route library logs to the test harness; later calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn start_server() -> SocketAddr {
    init_tracing();
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::new(format!("http://{addr}/"))
}

#[tokio::test]
async fn item_lifecycle() {
    let addr = start_server();
    let mut cache = ClientCache::new();
    let items: RequestAdapter<_, Item> = RequestAdapter::from_config(&mut cache, &config(addr)).unwrap();
    let raw: RequestAdapter<_, Value> = RequestAdapter::from_config(&mut cache, &config(addr)).unwrap();
    assert!(std::sync::Arc::ptr_eq(items.client(), raw.client()));

    // Step 1: create.
    let created = items
        .post("/items", Some(json!({"name": "Integration test"})))
        .await
        .unwrap();
    assert_eq!(created.name, "Integration test");
    assert!(!created.done);
    assert_eq!(items.snapshot(), RequestState::success(created.clone()));

    // Step 2: get it back.
    let fetched = items.get(&format!("items/{}", created.id), None).await.unwrap();
    assert_eq!(fetched, created);

    // Step 3: update.
    let updated = items
        .put(&format!("/items/{}", created.id), Some(json!({"done": true})))
        .await
        .unwrap();
    assert!(updated.done);

    // Step 4: list with a query filter.
    let listed = raw.get("/items", Some(json!({"done": true}))).await.unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    let listed = raw.get("/items", Some(json!({"done": false}))).await.unwrap();
    assert_eq!(listed, json!([]));

    // Step 5: delete; an empty 204 body settles as null.
    let deleted = raw.delete(&format!("/items/{}", created.id), None).await.unwrap();
    assert_eq!(deleted, Value::Null);
    assert_eq!(raw.snapshot(), RequestState::success(Value::Null));

    // Step 6: get after delete reports the server's error.
    let error = items.get(&format!("/items/{}", created.id), None).await.unwrap_err();
    assert_eq!(error.code, "NOT_FOUND");
    assert_eq!(error.message, "item not found");
    let state = items.snapshot();
    assert!(!state.loading);
    assert!(state.result.is_none());
    assert_eq!(state.error, Some(error));
}

#[tokio::test]
async fn validation_error_keeps_code_and_params() {
    let addr = start_server();
    let mut cache = ClientCache::new();
    let adapter: RequestAdapter<_, Value> = RequestAdapter::from_config(&mut cache, &config(addr)).unwrap();

    let error = adapter.post("/items", Some(json!({"name": ""}))).await.unwrap_err();

    assert_eq!(error.message, "name is required");
    assert_eq!(error.code, "VALIDATION");
    assert_eq!(error.params, json!({"field": "name"}).as_object().cloned());
    assert_eq!(adapter.snapshot(), RequestState::failure(error));
}

#[tokio::test]
async fn unclassified_failure_gets_unknown_code() {
    let addr = start_server();
    let mut cache = ClientCache::new();
    let adapter: RequestAdapter<_, Value> = RequestAdapter::from_config(&mut cache, &config(addr)).unwrap();

    let error = adapter.get("/unclassified", None).await.unwrap_err();

    assert_eq!(error.code, UNKNOWN_CODE);
    assert_eq!(error.message, "HTTP 500");
    assert_eq!(error.params, json!({"status": 500}).as_object().cloned());
}

#[tokio::test]
async fn configured_headers_reach_the_server() {
    let addr = start_server();
    let mut cache = ClientCache::new();
    let config = config(addr).header("x-api-key", "secret").debug(true);
    let adapter: RequestAdapter<_, Value> = RequestAdapter::from_config(&mut cache, &config).unwrap();
    adapter.store().observe(tracing_observer());

    let echoed = adapter.get("/headers", None).await.unwrap();

    assert_eq!(echoed["x-api-key"], "secret");
}

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    init_tracing();
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let mut cache = ClientCache::new();
    let adapter: RequestAdapter<_, Value> = RequestAdapter::from_config(&mut cache, &config(addr)).unwrap();

    let error = adapter.get("/items", None).await.unwrap_err();

    assert_eq!(error.code, "NETWORK_ERROR");
    assert!(!adapter.snapshot().loading);
}
