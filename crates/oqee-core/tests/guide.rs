use std::sync::Arc;

use oqee_client::{ClientConfig, OqeeClient};
use oqee_core::state::AppContext;
use oqee_core::tools::{live_now_definition, tonight_definition, tv_guide_definition};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn context_for(server: &MockServer) -> Arc<AppContext> {
    let client = OqeeClient::with_config(ClientConfig {
        api_base_url: server.uri(),
        ..ClientConfig::default()
    });
    Arc::new(AppContext::new(client))
}

fn sample_plan() -> Value {
    json!({
        "success": true,
        "result": {
            "channels": {
                "1": {"id": 1, "name": "TF1"},
                "5": {"id": "5", "name": "France 5"}
            },
            "channel_list": [
                {"channel_id": 1, "number": 1},
                {"channel_id": "5", "number": 5}
            ]
        }
    })
}

fn sample_bucket() -> Value {
    json!({
        "success": true,
        "result": {
            "1": [
                {"live": {"title": "News", "start": 1_700_001_600, "end": 1_700_005_200}},
                {"live": {"title": "Movie", "start": 1_700_005_200, "end": 1_700_008_800}}
            ],
            "5": [
                {"live": {"title": "Old", "start": 1_699_996_800, "end": 1_700_000_400}},
                {}
            ]
        }
    })
}

#[tokio::test]
async fn tv_guide_renders_rows_for_every_channel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_plan()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/epg/all/1700002800"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_bucket()))
        .mount(&server)
        .await;

    let context = context_for(&server).await;
    let (_definition, handler) = tv_guide_definition();
    let response = handler(context, json!({"time": 1_700_003_400}))
        .await
        .expect("handler should succeed");

    let text = &response.content[0].text;
    assert!(text.contains("📅 TV Guide"), "missing heading: {text}");
    assert!(text.contains("TF1"), "missing first channel: {text}");
    assert!(text.contains("News"), "missing current program: {text}");
    assert!(text.contains("Movie"), "missing next program: {text}");
    assert!(text.contains("France 5"), "missing idle channel: {text}");

    let metadata = response.metadata.expect("metadata present");
    assert_eq!(metadata["instant"], 1_700_003_400i64);
    assert_eq!(metadata["bucket"], 1_700_002_800i64);
    let rows = metadata["rows"].as_array().expect("rows array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["lcn"], 1);
    assert_eq!(rows[0]["channel"], "TF1");
    assert_eq!(rows[0]["current_program"], "News");
    assert_eq!(rows[0]["next_program"], "Movie");
    let start = rows[0]["current_start"].as_str().expect("start rendered");
    assert_eq!(start.len(), 5, "expected HH:MM, got {start}");
    assert_eq!(rows[1]["channel"], "France 5");
    assert!(rows[1]["current_program"].is_null());
    assert!(rows[1]["next_program"].is_null());
}

#[tokio::test]
async fn tv_guide_rejects_unparseable_times() {
    let server = MockServer::start().await;
    let context = context_for(&server).await;

    let (_definition, handler) = tv_guide_definition();
    let error = handler(context, json!({"time": "99:99"}))
        .await
        .expect_err("bad time must fail");
    assert!(
        error.to_string().contains("unrecognized time format"),
        "unexpected error: {error}"
    );
}

#[tokio::test]
async fn live_now_survives_missing_guide_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_plan()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/epg/all/\d+$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let context = context_for(&server).await;
    let (_definition, handler) = live_now_definition();
    let response = handler(context, json!({}))
        .await
        .expect("handler should succeed");

    let text = &response.content[0].text;
    assert!(text.contains("📅 Live Now"), "missing heading: {text}");
    assert!(text.contains("TF1"), "channels survive a guide outage: {text}");

    let metadata = response.metadata.expect("metadata present");
    let rows = metadata["rows"].as_array().expect("rows array");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["current_program"].is_null()));
}

#[tokio::test]
async fn tonight_is_pinned_to_prime_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_plan()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/epg/all/\d+$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "result": {}})),
        )
        .mount(&server)
        .await;

    let context = context_for(&server).await;
    let (_definition, handler) = tonight_definition();
    let response = handler(context, json!({}))
        .await
        .expect("handler should succeed");

    let text = &response.content[0].text;
    assert!(text.contains("📅 Tonight at 21:00"), "missing heading: {text}");
}

#[tokio::test]
async fn guide_reports_unreachable_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v5/service_plan"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/epg/all/\d+$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "result": {}})),
        )
        .mount(&server)
        .await;

    let context = context_for(&server).await;
    let (_definition, handler) = live_now_definition();
    let response = handler(context, json!({}))
        .await
        .expect("handler should succeed");

    let text = &response.content[0].text;
    assert!(
        text.contains("Catalog is empty or unreachable"),
        "missing advisory: {text}"
    );
}
