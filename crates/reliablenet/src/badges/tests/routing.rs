use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;

fn recompute_request(complex_id: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(format!("/api/v1/complexes/{complex_id}/badges"));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn catalog_lists_every_badge_with_icons() {
    let app = badge_app(Arc::new(MemoryStore::default()));

    let response = app
        .oneshot(
            Request::get("/api/v1/badges")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let badges = payload.as_array().expect("array payload");
    assert_eq!(badges.len(), 5);
    assert_eq!(badges[0]["id"], json!("wfh_friendly"));
    assert_eq!(badges[0]["icon"], json!("wifi"));
    assert_eq!(badges[1]["criteria"]["min_upload_speed"], json!(25.0));
}

#[tokio::test]
async fn recompute_route_returns_badges_and_metrics() {
    let (store, id) = scenario_store();
    let store = Arc::new(store);
    let app = badge_app(store.clone());

    let response = app
        .oneshot(recompute_request(&id.0, Some(RESIDENT_TOKEN)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["badges"],
        json!([
            "wfh_friendly",
            "streamer_approved",
            "gamer_ready",
            "budget_friendly"
        ])
    );
    assert_eq!(payload["persisted"], Value::Bool(true));
    assert_eq!(payload["metrics"]["average_rating"], json!(5.0));
    assert_eq!(payload["metrics"]["best_isp"]["isp"], json!("MetroFiber"));
    assert_eq!(store.stored_badges(&id).len(), 4);
}

#[tokio::test]
async fn recompute_route_requires_authentication() {
    let (store, id) = scenario_store();
    let store = Arc::new(store);
    let app = badge_app(store.clone());

    let response = app
        .clone()
        .oneshot(recompute_request(&id.0, None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(recompute_request(&id.0, Some("not-a-token")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.stored_badges(&id).is_empty());
}

#[tokio::test]
async fn recompute_route_returns_not_found_for_unknown_complex() {
    let app = badge_app(Arc::new(MemoryStore::default()));

    let response = app
        .oneshot(recompute_request("cx-missing", Some(RESIDENT_TOKEN)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("Apartment complex not found"));
}

#[tokio::test]
async fn recompute_route_hides_storage_errors() {
    let app = badge_app(Arc::new(UnavailableStore));

    let response = app
        .oneshot(recompute_request("cx-1", Some(RESIDENT_TOKEN)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("Failed to recalculate badges"));
}

#[tokio::test]
async fn failed_write_still_returns_computed_badges() {
    let (inner, id) = scenario_store();
    let store = Arc::new(ScriptedStore::new(
        inner,
        vec![crate::store::RepositoryError::Unavailable(
            "replica lag".to_string(),
        )],
    ));
    let app = badge_app(store);

    let response = app
        .oneshot(recompute_request(&id.0, Some(RESIDENT_TOKEN)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["persisted"], Value::Bool(false));
    assert!(payload.get("revision").is_none());
    assert_eq!(payload["badges"].as_array().map(Vec::len), Some(4));
}
