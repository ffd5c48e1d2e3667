//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::{AppState, SagaRuntime};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;
use transport::InMemoryBroker;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    broker: InMemoryBroker,
    _state: Arc<AppState<InMemoryBroker>>,
    _runtime: SagaRuntime,
}

async fn setup() -> TestApp {
    let broker = InMemoryBroker::with_log();
    let (state, runtime) = api::create_default_state(broker.clone()).await.unwrap();
    let app = api::create_app(state.clone(), get_metrics_handle());
    TestApp {
        app,
        broker,
        _state: state,
        _runtime: runtime,
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_order(products: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&serde_json::json!({ "products": products })).unwrap(),
        ))
        .unwrap()
}

/// Polls GET /events until the saga for `order_id` has ended.
async fn wait_for_ending(app: &axum::Router, order_id: &str) -> serde_json::Value {
    let uri = format!("/events?orderId={order_id}");
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (status, json) = send(app, get(&uri)).await;
            if status == StatusCode::OK {
                return json;
            }
            assert_eq!(status, StatusCode::NOT_FOUND);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("saga did not end in time")
}

#[tokio::test]
async fn test_health_check() {
    let t = setup().await;

    let (status, json) = send(&t.app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_order_starts_saga() {
    let t = setup().await;

    let (status, json) = send(
        &t.app,
        post_order(serde_json::json!([
            { "product": { "code": "COMIC_BOOKS", "unitValue": 1550 }, "quantity": 2 }
        ])),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(json["orderId"].as_str().is_some());
    let transaction_id = json["transactionId"].as_str().unwrap();
    assert!(transaction_id.contains('_'));

    let started = t.broker.published_to("start-saga").await;
    assert_eq!(started.len(), 1);
    let envelope = domain::Envelope::from_json(&started[0].payload).unwrap();
    assert_eq!(envelope.transaction_id.as_str(), transaction_id);
    assert_eq!(envelope.source, domain::EventSource::OrderService);
}

#[tokio::test]
async fn test_successful_saga_is_queryable() {
    let t = setup().await;

    let (_, created) = send(
        &t.app,
        post_order(serde_json::json!([
            { "product": { "code": "BOOKS", "unitValue": 1000 }, "quantity": 1 },
            { "product": { "code": "MOVIES", "unitValue": 2500 }, "quantity": 2 }
        ])),
    )
    .await;
    let order_id = created["orderId"].as_str().unwrap();

    let ended = wait_for_ending(&t.app, order_id).await;

    assert_eq!(ended["status"], "SUCCESS");
    assert_eq!(ended["payload"]["totalAmount"], 6000);
    assert_eq!(ended["payload"]["totalItems"], 3);
    assert_eq!(ended["eventHistory"].as_array().unwrap().len(), 5);

    let uri = format!(
        "/events?transactionId={}",
        created["transactionId"].as_str().unwrap()
    );
    let (status, by_tx) = send(&t.app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_tx["orderId"], order_id);
}

#[tokio::test]
async fn test_rejected_order_ends_failed() {
    let t = setup().await;

    let (status, created) = send(
        &t.app,
        post_order(serde_json::json!([
            { "product": { "code": "GAMES", "unitValue": 5000 }, "quantity": 1 }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let ended = wait_for_ending(&t.app, created["orderId"].as_str().unwrap()).await;

    assert_eq!(ended["status"], "FAIL");
    let history = ended["eventHistory"].as_array().unwrap();
    assert_eq!(
        history.last().unwrap()["message"],
        "Saga finished with errors!"
    );
}

#[tokio::test]
async fn test_list_all_events() {
    let t = setup().await;

    let (_, created) = send(
        &t.app,
        post_order(serde_json::json!([
            { "product": { "code": "MUSIC", "unitValue": 1200 }, "quantity": 1 }
        ])),
    )
    .await;
    wait_for_ending(&t.app, created["orderId"].as_str().unwrap()).await;

    let (status, json) = send(&t.app, get("/events/all")).await;

    assert_eq!(status, StatusCode::OK);
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["orderId"], created["orderId"]);
}

#[tokio::test]
async fn test_events_requires_a_filter() {
    let t = setup().await;

    let (status, json) = send(&t.app, get("/events")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("orderId"));
}

#[tokio::test]
async fn test_events_unknown_order() {
    let t = setup().await;

    let (status, _) = send(
        &t.app,
        get("/events?orderId=6f1c2a5e-9a53-4a9e-8a43-0c1d2e3f4a5b"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_order_rejects_malformed_body() {
    let t = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"products": "nope"}"#))
        .unwrap();
    let (status, _) = send(&t.app, request).await;

    assert!(status.is_client_error());
    assert!(t.broker.published_to("start-saga").await.is_empty());
}

#[tokio::test]
async fn test_create_order_broker_down() {
    let t = setup().await;
    t.broker.set_fail_on_publish(true);

    let (status, json) = send(
        &t.app,
        post_order(serde_json::json!([
            { "product": { "code": "BOOKS", "unitValue": 1000 }, "quantity": 1 }
        ])),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup().await;
    let (_, created) = send(
        &t.app,
        post_order(serde_json::json!([
            { "product": { "code": "BOOKS", "unitValue": 1000 }, "quantity": 1 }
        ])),
    )
    .await;
    wait_for_ending(&t.app, created["orderId"].as_str().unwrap()).await;

    let response = t.app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_created_total"));
    assert!(text.contains("saga_started_total"));
}
