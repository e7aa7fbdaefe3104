mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::common::{ADMIN_KEY, FakeChain, FakeMetadataStore, TestApp, addr, chain_property, metadata_row};

async fn send(app: &TestApp, method: &str, uri: &str, key: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn app() -> TestApp {
    TestApp::new(
        FakeChain::with_properties(vec![chain_property(0, addr(0xAA))]),
        FakeMetadataStore::with_rows(vec![metadata_row(1, addr(0xBB), &[])]),
    )
}

#[tokio::test]
async fn test_create_requires_api_key() {
    let app = app();
    let body = json!({ "contract_address": addr(0xAA).to_string() });

    let (status, json) = send(&app, "POST", "/api/admin/metadata", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, "POST", "/api/admin/metadata", Some("wrong"), Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_then_listing_is_enriched() {
    let app = app();
    let body = json!({
        "contract_address": "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        "name": "Harbor Lofts",
        "description": "Twelve units by the river",
        "location": { "city": "Porto", "country": "PT" },
        "details": { "images": ["https://cdn.example/front.jpg", "https://cdn.example/back.jpg"] }
    });

    let (status, json) = send(&app, "POST", "/api/admin/metadata", Some(ADMIN_KEY), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["contract_address"], "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    assert_eq!(json["details"]["schema_version"], 1);

    let listing = app.state.reconciler.list_enriched().await.unwrap();
    let merged = listing.properties.iter().find(|p| p.address == addr(0xAA)).unwrap();
    assert_eq!(merged.description.as_deref(), Some("Twelve units by the river"));
    assert_eq!(merged.images.len(), 2);
    assert_eq!(merged.images[0], "https://cdn.example/front.jpg");
    assert_eq!(merged.location.city.as_deref(), Some("Porto"));
}

#[tokio::test]
async fn test_create_validation_and_conflict() {
    let app = app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/admin/metadata",
        Some(ADMIN_KEY),
        Some(json!({ "contract_address": "0xnot-an-address" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "POST",
        "/api/admin/metadata",
        Some(ADMIN_KEY),
        Some(json!({
            "contract_address": addr(0xAA).to_string(),
            "details": { "images": ["file:///etc/passwd"] }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = send(
        &app,
        "POST",
        "/api/admin/metadata",
        Some(ADMIN_KEY),
        Some(json!({ "contract_address": addr(0xBB).to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = app();
    let uri = format!("/api/admin/metadata/{}", addr(0xBB));

    let (status, json) = send(
        &app,
        "PUT",
        &uri,
        Some(ADMIN_KEY),
        Some(json!({ "name": "Renamed", "property_type": "commercial" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Renamed");
    assert_eq!(json["property_type"], "commercial");

    let (status, _) = send(&app, "DELETE", &uri, Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = send(&app, "DELETE", &uri, Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_missing_row() {
    let app = app();
    let uri = format!("/api/admin/metadata/{}", addr(0xEE));

    let (status, _) = send(&app, "PUT", &uri, Some(ADMIN_KEY), Some(json!({ "name": "Nope" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_image_upload_without_storage() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/admin/metadata/{}/images?filename=front.jpg", addr(0xBB)))
        .header("x-api-key", ADMIN_KEY)
        .header("content-type", "image/jpeg")
        .body(Body::from(vec![0xFFu8, 0xD8, 0xFF]))
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_image_upload_rejected_when_gallery_full() {
    let images: Vec<String> = (0..50).map(|i| format!("https://cdn.example/{}.jpg", i)).collect();
    let image_refs: Vec<&str> = images.iter().map(String::as_str).collect();
    let app = TestApp::new(
        FakeChain::default(),
        FakeMetadataStore::with_rows(vec![metadata_row(1, addr(0xBB), &image_refs)]),
    )
    .with_unreachable_storage();

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/admin/metadata/{}/images?filename=front.jpg", addr(0xBB)))
        .header("x-api-key", ADMIN_KEY)
        .header("content-type", "image/jpeg")
        .body(Body::from(vec![0xFFu8, 0xD8, 0xFF]))
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let rows = app.metadata.rows.lock().unwrap();
    assert_eq!(rows[0].details.images.len(), 50);
}
