//! Category based access control at the HTTP boundary.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use medstock_api::auth::permissions::{FORBIDDEN_MESSAGE, UNAUTHENTICATED_MESSAGE};
use serde_json::json;

#[tokio::test]
async fn anonymous_requests_are_unauthorized() {
    let app = TestApp::new().await;

    for uri in ["/api/v1/items", "/api/v1/pr", "/api/v1/po", "/api/v1/reports/items.csv"] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body = response_json(response).await;
        assert_eq!(body["message"], UNAUTHENTICATED_MESSAGE);
    }
}

#[tokio::test]
async fn invalid_tokens_are_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/items", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::GET,
            "/api/v1/items",
            None,
            Some("eyJhbGciOiJIUzI1NiJ9.e30.ZRrHA1JJJW8opsbCGfG_HACGpVUMN_a9IV7pAx_Zmeo"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_without_the_category_are_forbidden() {
    let app = TestApp::new().await;

    // Nurses handle supplies and devices but not purchasing
    let (status, body) = app.call_as("nurse", Method::GET, "/api/v1/po", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], FORBIDDEN_MESSAGE);

    let (status, _) = app
        .call_as("nurse", Method::GET, "/api/v1/reports/items.csv", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Purchasing cannot approve its own orders
    let (status, _) = app
        .call_as(
            "purchasing",
            Method::POST,
            &format!("/api/v1/po/{}/approve", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unknown roles get nothing
    let (status, _) = app.call_as("visitor", Method::GET, "/api/v1/items", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn item_access_follows_the_item_category() {
    let app = TestApp::new().await;
    let paracetamol = app
        .seed_item_in(
            "Paracetamol 500mg",
            50,
            json!({
                "category": "medicine",
                "attributes": {"generic_name": "paracetamol", "dosage_form": "tablet", "strength": "500mg"}
            }),
        )
        .await;
    let bandage = app
        .seed_item_in(
            "Elastic bandage",
            20,
            json!({"category": "medsup", "attributes": {}}),
        )
        .await;

    let (status, body) = app
        .call_as("nurse", Method::GET, &format!("/api/v1/items/{}", paracetamol), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], FORBIDDEN_MESSAGE);

    let (status, body) = app
        .call_as("nurse", Method::GET, &format!("/api/v1/items/{}", bandage), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"]["category"], "medsup");

    let (status, body) = app
        .call_as("pharmacist", Method::GET, &format!("/api/v1/items/{}", paracetamol), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"]["attributes"]["generic_name"], "paracetamol");

    // Listing silently narrows to visible categories
    let list = app.ok_as("nurse", Method::GET, "/api/v1/items", None).await;
    let names: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Elastic bandage"]);

    // Asking for a hidden category explicitly is refused
    let (status, _) = app
        .call_as("nurse", Method::GET, "/api/v1/items?category=medicine", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Creating an item in a category the role lacks is refused
    let (status, _) = app
        .call_as(
            "nurse",
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "name": "Amoxicillin 250mg",
                "unit": "capsule",
                "location": "PH-02",
                "detail": {"category": "medicine", "attributes": {}}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["database"]["status"], "up");

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["paths"]["/api/v1/gr"].is_object());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::new().await;
    let token = app.token_for("admin");
    let response = app
        .request(Method::GET, "/api/v1/items", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
