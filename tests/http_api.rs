mod support;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
};
use eesa_api_types::{ApiErrorBody, SnapshotResponse};
use eesa_catalog::application::repos::CatalogRepo;
use eesa_catalog::infra::http::{CACHE_STATUS_HEADER, HttpState, PROCESS_TIME_HEADER, build_router};
use http_body_util::BodyExt;
use tower::ServiceExt;

use support::{FlakyStore, memory_cache, service};

fn router_over(store: Arc<FlakyStore>) -> Router {
    let dyn_store: Arc<dyn CatalogRepo> = store;
    let snapshots = Arc::new(service(dyn_store.clone(), memory_cache()));
    build_router(HttpState {
        snapshots,
        store: dyn_store,
    })
}

async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec()
}

fn header<'a>(response: &'a Response, name: &axum::http::HeaderName) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn batch_data_reports_cache_status_and_process_time() {
    let app = router_over(Arc::new(FlakyStore::new(None)));
    let uri = "/api/v1/academics/batch-data?scheme=1&department=ECE";

    let first = get(&app, uri).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, &CACHE_STATUS_HEADER), Some("MISS"));
    let elapsed: f64 = header(&first, &PROCESS_TIME_HEADER)
        .expect("process time header")
        .parse()
        .expect("seconds as float");
    assert!(elapsed >= 0.0);

    let second = get(&app, uri).await;
    assert_eq!(header(&second, &CACHE_STATUS_HEADER), Some("HIT"));

    let body: SnapshotResponse =
        serde_json::from_slice(&body_bytes(second).await).expect("snapshot body");
    let subject_ids: Vec<i64> = body.envelope.subjects.iter().map(|subject| subject.id).collect();
    assert_eq!(subject_ids, vec![12]);
    assert_eq!(body.envelope.resources.len(), 4);
    assert_eq!(body.meta.cache_status.as_str(), "hit");
}

#[tokio::test]
async fn invalid_filter_names_the_field() {
    let app = router_over(Arc::new(FlakyStore::new(None)));

    let response = get(&app, "/api/v1/academics/batch-data?semester=12").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiErrorBody =
        serde_json::from_slice(&body_bytes(response).await).expect("error body");
    assert_eq!(body.error.code, "invalid_filter");
    assert_eq!(body.error.field.as_deref(), Some("semester"));
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let app = router_over(Arc::new(FlakyStore::new(None)));

    let response = get(&app, "/api/v1/academics/batch-data?category=slides").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiErrorBody =
        serde_json::from_slice(&body_bytes(response).await).expect("error body");
    assert_eq!(body.error.field.as_deref(), Some("category"));
}

#[tokio::test]
async fn unavailable_store_maps_to_service_unavailable() {
    let store = Arc::new(FlakyStore::new(None));
    store.set_failing(true);
    let app = router_over(store);

    let response = get(&app, "/api/v1/academics/batch-data").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: ApiErrorBody =
        serde_json::from_slice(&body_bytes(response).await).expect("error body");
    assert_eq!(body.error.code, "store_unavailable");
}

#[tokio::test]
async fn database_health_follows_the_store() {
    let store = Arc::new(FlakyStore::new(None));
    let app = router_over(store.clone());

    let healthy = get(&app, "/_health/db").await;
    assert_eq!(healthy.status(), StatusCode::NO_CONTENT);

    store.set_failing(true);
    let unhealthy = get(&app, "/_health/db").await;
    assert_eq!(unhealthy.status(), StatusCode::SERVICE_UNAVAILABLE);
}
