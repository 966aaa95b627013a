//! End-to-end dispatch tests through the axum service.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::json;
use tower::util::BoxCloneSyncService;
use tower::ServiceExt;

use vhost_gateway::http::{app, AppState};
use vhost_gateway::routing::{compile, SharedTable};
use vhost_gateway::store::Document;
use vhost_gateway::vfs::StaticFs;
use vhost_gateway::vhost::VirtualHostConfig;

use common::{recording_fallback, start_capturing_origin, SeenRequest};

type SeenLog = Arc<Mutex<Vec<SeenRequest>>>;

fn vhost(id: &str, body: serde_json::Value) -> VirtualHostConfig {
    VirtualHostConfig::from_document(&Document {
        id: id.to_string(),
        body,
    })
    .unwrap()
}

fn gateway(configs: &[VirtualHostConfig]) -> (axum::Router, SeenLog) {
    let table = SharedTable::new();
    table.publish(compile(configs));

    let seen: SeenLog = Arc::new(Mutex::new(Vec::new()));
    let state = AppState {
        table,
        client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
        fallback: recording_fallback(seen.clone()),
    };
    (app(state, Duration::from_secs(5)), seen)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

#[tokio::test]
async fn unmatched_host_falls_through_unchanged() {
    let (router, seen) = gateway(&[vhost(
        "goydb.vhost:shop",
        json!({"domains": ["shop.example"], "proxy": {}}),
    )]);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/anything?q=1")
                .header(header::HOST, "other.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "fallback");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].uri, "/anything?q=1");
}

#[tokio::test]
async fn document_proxy_rewrites_only_the_path() {
    let (router, seen) = gateway(&[vhost(
        "goydb.vhost:shop",
        json!({
            "domains": ["shop.example"],
            "proxy": {"/api/": {"type": "db", "target": "shop"}}
        }),
    )]);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/widgets?x=1")
                .header(header::HOST, "shop.example")
                .header("x-tenant", "abc")
                .body(Body::from("payload"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].uri, "/shop/widgets?x=1");
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].headers.get("x-tenant").unwrap(), "abc");
    assert_eq!(seen[0].body.as_ref(), b"payload");
    // Host header still names the tenant, only the path was rewritten.
    assert_eq!(seen[0].headers.get(header::HOST).unwrap(), "shop.example");
}

#[tokio::test]
async fn host_port_is_stripped_before_lookup() {
    let (router, seen) = gateway(&[vhost(
        "goydb.vhost:shop",
        json!({
            "domains": ["shop.example"],
            "proxy": {"/api/": {"type": "db", "target": "shop"}}
        }),
    )]);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/items")
                .header(header::HOST, "shop.example:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(seen.lock().unwrap()[0].uri, "/shop/items");
}

#[tokio::test]
async fn longest_prefix_takes_precedence() {
    let origin = start_capturing_origin("origin").await;
    let (router, seen) = gateway(&[vhost(
        "goydb.vhost:shop",
        json!({
            "domains": ["shop.example"],
            "proxy": {
                "/api/": {"type": "db", "target": "shop"},
                "/api/v2/": {"type": "reverse", "target": format!("http://{}", origin.addr)}
            }
        }),
    )]);

    // The more specific prefix routes to the reverse proxy.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v2/items")
                .header(header::HOST, "shop.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "origin");
    // Without stripPrefix the full original path is forwarded.
    assert_eq!(origin.request_lines(), ["GET /api/v2/items HTTP/1.1"]);

    // The shorter prefix still routes to the document proxy.
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/widgets")
                .header(header::HOST, "shop.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(seen.lock().unwrap()[0].uri, "/shop/widgets");
}

#[tokio::test]
async fn reverse_proxy_strips_prefix_and_overrides_host() {
    let origin = start_capturing_origin("external page").await;
    let (router, _seen) = gateway(&[vhost(
        "goydb.vhost:shop",
        json!({
            "domains": ["shop.example"],
            "proxy": {
                "/ext/": {
                    "type": "reverse",
                    "target": format!("http://{}", origin.addr),
                    "stripPrefix": true
                }
            }
        }),
    )]);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/ext/page")
                .header(header::HOST, "shop.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "external page");
    assert_eq!(origin.request_lines(), ["GET /page HTTP/1.1"]);
    assert_eq!(
        origin.host_headers(),
        [Some(origin.addr.to_string())]
    );
}

#[tokio::test]
async fn hop_by_hop_headers_stop_at_the_proxy() {
    let origin = start_capturing_origin("ok").await;
    let (router, _seen) = gateway(&[vhost(
        "goydb.vhost:shop",
        json!({
            "domains": ["shop.example"],
            "proxy": {"/ext/": {"type": "reverse", "target": format!("http://{}", origin.addr)}}
        }),
    )]);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/ext/page")
                .header(header::HOST, "shop.example")
                .header(header::CONNECTION, "close")
                .header(header::PROXY_AUTHORIZATION, "Basic abc")
                .header("x-tenant", "abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(origin.header_values("proxy-authorization"), [None]);
    // End-to-end headers still arrive.
    assert_eq!(
        origin.header_values("x-tenant"),
        [Some("abc".to_string())]
    );
}

#[tokio::test]
async fn unreachable_origin_answers_bad_gateway() {
    // Port from a listener that is immediately dropped.
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = dead.local_addr().unwrap();
    drop(dead);

    let (router, _seen) = gateway(&[vhost(
        "goydb.vhost:shop",
        json!({
            "domains": ["shop.example"],
            "proxy": {"/ext/": {"type": "reverse", "target": format!("http://{addr}")}}
        }),
    )]);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/ext/page")
                .header(header::HOST, "shop.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn static_files_serve_the_catch_all() {
    let mut config = vhost(
        "goydb.vhost:site",
        json!({
            "domains": ["site.example"],
            "proxy": {"/api/": {"type": "db", "target": "site"}}
        }),
    );
    config.static_fs = Some(Arc::new(StaticFs::from_entries([
        ("index.html", "<h1>site</h1>"),
        ("style.css", "body {}"),
        ("docs/index.html", "<h1>docs</h1>"),
    ])));
    let (router, _seen) = gateway(&[config]);

    let get = |uri: &str, method: &str| {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "site.example")
            .body(Body::empty())
            .unwrap()
    };

    let response = router.clone().oneshot(get("/", "GET")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(body_string(response).await, "<h1>site</h1>");

    let response = router.clone().oneshot(get("/style.css", "GET")).await.unwrap();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css; charset=utf-8"
    );

    // Directory without a trailing slash redirects into the directory.
    let response = router.clone().oneshot(get("/docs", "GET")).await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/docs/");

    let response = router.clone().oneshot(get("/missing.html", "GET")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router.oneshot(get("/", "POST")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn requests_past_the_deadline_answer_request_timeout() {
    let fallback = BoxCloneSyncService::new(tower::service_fn(
        |_request: Request<Body>| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, std::convert::Infallible>(StatusCode::OK.into_response())
        },
    ));
    let state = AppState {
        table: SharedTable::new(),
        client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
        fallback,
    };
    let router = app(state, Duration::from_millis(50));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/slow")
                .header(header::HOST, "any.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn no_static_fs_means_not_found_for_unmatched_paths() {
    let (router, seen) = gateway(&[vhost(
        "goydb.vhost:shop",
        json!({
            "domains": ["shop.example"],
            "proxy": {"/api/": {"type": "db", "target": "shop"}}
        }),
    )]);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/elsewhere")
                .header(header::HOST, "shop.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    // The configured host never falls through to the default handler.
    assert!(seen.lock().unwrap().is_empty());
}
