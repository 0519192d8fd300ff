mod common;

use axum::{body::Body, http::{Request, StatusCode}};
use lawn_booking_api::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}

#[tokio::test]
async fn unknown_paths_get_a_json_404() {
    let (state, _) = common::offline_state();
    let app = common::app(state);

    let request = Request::get("/api/nope").body(Body::empty()).unwrap();
    let (status, body) = common::send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["path"], "/api/nope");
}
