//! Manual stock movements, the item ledger and soft delete.

mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, TestApp};
use serde_json::json;

#[tokio::test]
async fn opening_balance_is_recorded_as_a_movement() {
    let app = TestApp::new().await;
    let item = app.seed_item("Hand sanitizer 500ml", 12).await;

    let movements = app
        .ok_as("admin", Method::GET, &format!("/api/v1/items/{}/movements", item), None)
        .await;
    let rows = movements["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["movement_type"], "in");
    assert_eq!(rows[0]["quantity"], 12);
    assert_eq!(rows[0]["balance_after"], 12);
}

#[tokio::test]
async fn stock_out_never_goes_negative() {
    let app = TestApp::new().await;
    let item = app.seed_item("Face shield", 3).await;

    let out = app
        .ok_as(
            "warehouse",
            Method::POST,
            &format!("/api/v1/items/{}/stock-out", item),
            Some(json!({"quantity": 3, "reference": "WARD-7"})),
        )
        .await;
    assert_eq!(out["balance_after"], 0);
    assert_eq!(out["movement_type"], "out");

    let (status, body) = app
        .call_as(
            "warehouse",
            Method::POST,
            &format!("/api/v1/items/{}/stock-out", item),
            Some(json!({"quantity": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(app.item_quantity(&item).await, 0);

    let (status, _) = app
        .call_as(
            "warehouse",
            Method::POST,
            &format!("/api/v1/items/{}/stock-in", item),
            Some(json!({"quantity": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let inbound = app
        .ok_as(
            "warehouse",
            Method::POST,
            &format!("/api/v1/items/{}/stock-in", item),
            Some(json!({"quantity": 7})),
        )
        .await;
    assert_eq!(inbound["balance_after"], 7);
    assert_eq!(app.item_quantity(&item).await, 7);
}

#[tokio::test]
async fn low_stock_filter_uses_minimum_quantity() {
    let app = TestApp::new().await;
    // Seeded items carry a minimum of 5
    app.seed_item("Tongue depressor", 2).await;
    app.seed_item("Cotton bud", 50).await;

    let low = app
        .ok_as("admin", Method::GET, "/api/v1/items?low_stock=true", None)
        .await;
    let rows = low["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Tongue depressor");
    assert_eq!(rows[0]["low_stock"], true);

    let search = app
        .ok_as("admin", Method::GET, "/api/v1/items?search=Cotton", None)
        .await;
    assert_eq!(search["pagination"]["total"], 1);
}

#[tokio::test]
async fn detail_updates_must_match_the_item_category() {
    let app = TestApp::new().await;
    let monitor = app
        .seed_item_in(
            "Patient monitor",
            1,
            json!({
                "category": "equipment",
                "attributes": {"serial_no": "PM-0001", "model_name": "VS-900"}
            }),
        )
        .await;

    let updated = app
        .ok_as(
            "biomed",
            Method::PUT,
            &format!("/api/v1/items/{}", monitor),
            Some(json!({
                "location": "ICU-3",
                "detail": {"category": "equipment", "attributes": {"serial_no": "PM-0001", "model_name": "VS-950"}}
            })),
        )
        .await;
    assert_eq!(updated["location"], "ICU-3");
    assert_eq!(updated["detail"]["attributes"]["model_name"], "VS-950");

    let (status, _) = app
        .call_as(
            "admin",
            Method::PUT,
            &format!("/api/v1/items/{}", monitor),
            Some(json!({"detail": {"category": "general", "attributes": {}}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_items_disappear_from_reads() {
    let app = TestApp::new().await;
    let item = app.seed_item("Expired stock", 0).await;

    let (status, _) = app
        .call_as("admin", Method::DELETE, &format!("/api/v1/items/{}", item), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call_as("admin", Method::GET, &format!("/api/v1/items/{}", item), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let list = app.ok_as("admin", Method::GET, "/api/v1/items", None).await;
    assert!(list["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|i| i["id"] != item.as_str()));

    // A requisition cannot reference it either
    let (status, _) = app
        .call_as(
            "warehouse",
            Method::POST,
            "/api/v1/pr",
            Some(json!({"lines": [{"item_id": item, "qty": 1}]})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requisition_rejects_duplicate_items() {
    let app = TestApp::new().await;
    let item = app.seed_item("Urine bag", 0).await;

    let (status, _) = app
        .call_as(
            "warehouse",
            Method::POST,
            "/api/v1/pr",
            Some(json!({"lines": [{"item_id": item, "qty": 1}, {"item_id": item, "qty": 2}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let pr = app
        .ok_as(
            "warehouse",
            Method::POST,
            "/api/v1/pr",
            Some(json!({"lines": [{"item_id": item, "qty": 2}]})),
        )
        .await;
    assert_eq!(pr["items"][0]["unit"], "box");
    assert!(!id_of(&pr).is_empty());
}

#[tokio::test]
async fn stock_in_cannot_overflow_the_balance() {
    let app = TestApp::new().await;
    let item = app.seed_item("Oxygen mask", 5).await;

    let (status, body) = app
        .call_as(
            "warehouse",
            Method::POST,
            &format!("/api/v1/items/{}/stock-in", item),
            Some(json!({"quantity": i32::MAX})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(app.item_quantity(&item).await, 5);

    let movements = app
        .ok_as("admin", Method::GET, &format!("/api/v1/items/{}/movements", item), None)
        .await;
    assert_eq!(movements["data"].as_array().unwrap().len(), 1);

    let topped = app
        .ok_as(
            "warehouse",
            Method::POST,
            &format!("/api/v1/items/{}/stock-in", item),
            Some(json!({"quantity": i32::MAX - 5})),
        )
        .await;
    assert_eq!(topped["balance_after"], i32::MAX);
}
