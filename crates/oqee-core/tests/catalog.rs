use std::sync::Arc;

use oqee_client::{ClientConfig, OqeeClient};
use oqee_core::services::{ensure_catalog, refresh_catalog};
use oqee_core::state::AppContext;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn context_for(server: &MockServer) -> Arc<AppContext> {
    let client = OqeeClient::with_config(ClientConfig {
        api_base_url: server.uri(),
        ..ClientConfig::default()
    });
    Arc::new(AppContext::new(client))
}

fn initial_plan() -> Value {
    json!({
        "success": true,
        "result": {
            "channels": {
                "1": {"id": 1, "name": "TF1"},
                "2": {"id": 2, "name": "France 2"}
            },
            "channel_list": [
                {"channel_id": 1, "number": 1},
                {"channel_id": 2, "number": 2}
            ]
        }
    })
}

fn expanded_plan() -> Value {
    json!({
        "success": true,
        "result": {
            "channels": {
                "1": {"id": 1, "name": "TF1"},
                "2": {"id": 2, "name": "France 2"},
                "6": {"id": 6, "name": "M6"}
            },
            "channel_list": [
                {"channel_id": 1, "number": 1},
                {"channel_id": 2, "number": 2},
                {"channel_id": 6, "number": 6}
            ]
        }
    })
}

#[tokio::test]
async fn catalog_is_built_once_and_reused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(initial_plan()))
        .expect(1)
        .mount(&server)
        .await;

    let context = context_for(&server).await;
    let first = ensure_catalog(&context).await;
    let second = ensure_catalog(&context).await;

    assert_eq!(first.channels.len(), 2);
    assert!(
        Arc::ptr_eq(&first, &second),
        "second lookup should reuse the cached snapshot"
    );
}

#[tokio::test]
async fn refresh_catalog_swaps_the_cached_snapshot() {
    let server = MockServer::start().await;
    // The first fetch sees the two-channel plan; every later one sees three.
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(initial_plan()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(expanded_plan()))
        .mount(&server)
        .await;

    let context = context_for(&server).await;
    let stale = ensure_catalog(&context).await;
    assert_eq!(stale.channels.len(), 2);
    assert_eq!(stale.index.name_of("6"), None);

    let refreshed = refresh_catalog(&context)
        .await
        .expect("refresh should succeed");
    assert_eq!(refreshed.channels.len(), 3);
    assert_eq!(refreshed.index.name_of("6"), Some("M6"));

    let current = ensure_catalog(&context).await;
    assert!(
        Arc::ptr_eq(&refreshed, &current),
        "lookups after a refresh should see the new snapshot"
    );

    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(
        requests.len(),
        2,
        "refresh must bypass the response cache exactly once"
    );
}

#[tokio::test]
async fn failed_refresh_keeps_the_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(initial_plan()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let context = context_for(&server).await;
    let initial = ensure_catalog(&context).await;
    assert_eq!(initial.channels.len(), 2);

    refresh_catalog(&context)
        .await
        .expect_err("refresh should surface the upstream failure");

    let current = ensure_catalog(&context).await;
    assert!(
        Arc::ptr_eq(&initial, &current),
        "a failed refresh must not clobber the working snapshot"
    );
}

#[tokio::test]
async fn failed_first_fetch_is_not_pinned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(initial_plan()))
        .mount(&server)
        .await;

    let context = context_for(&server).await;
    let degraded = ensure_catalog(&context).await;
    assert!(degraded.index.is_empty());

    let recovered = ensure_catalog(&context).await;
    assert_eq!(recovered.channels.len(), 2);
    assert_eq!(recovered.index.name_of("1"), Some("TF1"));
}
