//! End-to-end HTTP tests exercising the full router with a mock backend.

use axum::body::Body;
use axum::Router;
use http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use image::Rgba;
use serde_json::Value;
use tower::ServiceExt;

use super::test_utils::{build_router, is_valid_jpeg, is_valid_png, MockBackend, ScratchDir};

async fn get(router: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let dir = ScratchDir::with_files(&[]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let (status, _, body) = get(router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let payload = json(&body);
    assert_eq!(payload["status"], "ok");
}

#[tokio::test]
async fn slides_endpoint_lists_directory() {
    let dir = ScratchDir::with_files(&["beta.svs", "alpha.ndpi", "notes.txt"]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let (status, content_type, body) = get(router, "/api/slides").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("application/json"));

    let payload = json(&body);
    let items = payload["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "alpha");
    assert_eq!(items[0]["name"], "alpha.ndpi");
    assert_eq!(items[1]["id"], "beta");
}

#[tokio::test]
async fn info_endpoint_describes_pyramid() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let (status, _, body) = get(router, "/api/slides/demo/info").await;
    assert_eq!(status, StatusCode::OK);

    let payload = json(&body);
    assert_eq!(payload["width"], 10000);
    assert_eq!(payload["height"], 8000);
    assert_eq!(payload["levelCount"], 2);
    assert_eq!(payload["tileSize"], 256);
    assert_eq!(payload["levelDimensions"][1][0], 5000);
    assert_eq!(payload["levelDimensions"][1][1], 4000);
    assert_eq!(payload["levelDownsamples"][1], 2.0);
}

#[tokio::test]
async fn info_endpoint_unknown_slide_is_404() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let (status, _, body) = get(router, "/api/slides/missing/info").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "not_found");
}

#[tokio::test]
async fn tile_endpoint_returns_jpeg() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let (status, content_type, body) = get(router, "/api/slides/demo/tiles/0/0_0.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/jpeg"));
    assert!(is_valid_jpeg(&body));

    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (256, 256));
}

#[tokio::test]
async fn tile_endpoint_returns_png() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let (status, content_type, body) = get(router, "/api/slides/demo/tiles/0/3_2.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert!(is_valid_png(&body));
}

#[tokio::test]
async fn tile_responses_carry_cache_control() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/slides/demo/tiles/0/0_0.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cache = response
        .headers()
        .get(header::CACHE_CONTROL)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cache.contains("max-age=3600"), "got {cache}");
}

#[tokio::test]
async fn edge_tile_is_padded_with_white() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let backend = MockBackend::two_level().with_fill(Rgba([10, 20, 30, 255]));
    let router = build_router(backend, &dir.path);

    // Level 1 is 5000x4000: tile (19, 15) covers only 136x160 real pixels.
    let (status, _, body) = get(router, "/api/slides/demo/tiles/1/19_15.png").await;
    assert_eq!(status, StatusCode::OK);

    let decoded = image::load_from_memory(&body).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (256, 256));
    assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30]);
    assert_eq!(decoded.get_pixel(135, 159).0, [10, 20, 30]);
    assert_eq!(decoded.get_pixel(136, 0).0, [255, 255, 255]);
    assert_eq!(decoded.get_pixel(0, 160).0, [255, 255, 255]);
}

#[tokio::test]
async fn out_of_bounds_tile_is_blank_white() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let backend = MockBackend::two_level().with_fill(Rgba([10, 20, 30, 255]));
    let router = build_router(backend, &dir.path);

    let (status, _, body) = get(router, "/api/slides/demo/tiles/1/500_500.png").await;
    assert_eq!(status, StatusCode::OK);

    let decoded = image::load_from_memory(&body).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (256, 256));
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255]);
    assert_eq!(decoded.get_pixel(128, 128).0, [255, 255, 255]);
}

#[tokio::test]
async fn out_of_range_level_is_400() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let (status, _, body) = get(router, "/api/slides/demo/tiles/5/0_0.jpg").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "invalid_level");
}

#[tokio::test]
async fn malformed_tile_segments_are_400() {
    let dir = ScratchDir::with_files(&["demo.svs"]);

    for segment in ["0.jpg", "a_b.jpg", "0_0_0.jpg", "-1_0.jpg"] {
        let router = build_router(MockBackend::two_level(), &dir.path);
        let uri = format!("/api/slides/demo/tiles/0/{segment}");
        let (status, _, body) = get(router, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "segment {segment}");
        assert_eq!(json(&body)["error"], "bad_tile_address", "segment {segment}");
    }
}

#[tokio::test]
async fn unsupported_extension_is_400() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let (status, _, body) = get(router, "/api/slides/demo/tiles/0/0_0.gif").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "unsupported_extension");
}

#[tokio::test]
async fn tile_for_unknown_slide_is_404() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let router = build_router(MockBackend::two_level(), &dir.path);

    let (status, _, body) = get(router, "/api/slides/missing/tiles/0/0_0.jpg").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "not_found");
}

#[tokio::test]
async fn open_failure_is_500_with_json_body() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let backend = MockBackend::two_level();
    backend.set_fail_open(true);
    let router = build_router(backend, &dir.path);

    let (status, content_type, body) = get(router, "/api/slides/demo/tiles/0/0_0.jpg").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type.unwrap().starts_with("application/json"));

    let payload = json(&body);
    assert_eq!(payload["error"], "open_failure");
    assert_eq!(payload["status"], 500);
}

#[tokio::test]
async fn decode_failure_is_500() {
    let dir = ScratchDir::with_files(&["demo.svs"]);
    let backend = MockBackend::two_level();
    backend.set_fail_reads(true);
    let router = build_router(backend, &dir.path);

    let (status, _, body) = get(router, "/api/slides/demo/tiles/0/0_0.jpg").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["error"], "decode_failure");
}
