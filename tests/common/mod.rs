#![allow(dead_code)]

use std::{str::FromStr, sync::Arc};

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use medstock_api::{
    config::AppConfig,
    db::{self, DbConfig},
    events, logging, AppState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness for spinning up the full router on an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_SECRET.to_string(),
            "test".to_string(),
        );
        cfg.access_log = false;

        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let logger = logging::discard_logger();
        let state = AppState::new(Arc::new(pool), cfg, event_sender, &logger);
        let router = medstock_api::app_router(state.clone(), &logger);

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Bearer token for `role`, signed with the application's secret.
    pub fn token_for(&self, role: &str) -> String {
        self.state
            .auth
            .issue_token(&format!("{}-user", role), role)
            .expect("issue test token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Authenticated request as `role`, returning status and JSON body.
    pub async fn call_as(
        &self,
        role: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = self.token_for(role);
        let response = self.request(method, uri, body, Some(&token)).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    /// Like [`call_as`](Self::call_as) but fails the test on a non-success status.
    pub async fn ok_as(&self, role: &str, method: Method, uri: &str, body: Option<Value>) -> Value {
        let (status, json) = self.call_as(role, method.clone(), uri, body).await;
        assert!(
            status.is_success(),
            "{} {} as {} returned {}: {}",
            method,
            uri,
            role,
            status,
            json
        );
        json
    }

    /// Creates a general-category item and returns its id.
    pub async fn seed_item(&self, name: &str, quantity: i32) -> String {
        self.seed_item_in(name, quantity, json!({"category": "general", "attributes": {}}))
            .await
    }

    pub async fn seed_item_in(&self, name: &str, quantity: i32, detail: Value) -> String {
        let item = self
            .ok_as(
                "admin",
                Method::POST,
                "/api/v1/items",
                Some(json!({
                    "name": name,
                    "unit": "box",
                    "location": "A-01",
                    "quantity": quantity,
                    "min_quantity": 5,
                    "detail": detail,
                })),
            )
            .await;
        id_of(&item)
    }

    pub async fn item_quantity(&self, item_id: &str) -> i64 {
        let item = self
            .ok_as("admin", Method::GET, &format!("/api/v1/items/{}", item_id), None)
            .await;
        item["quantity"].as_i64().expect("quantity")
    }

    /// Runs `(item_id, qty)` pairs through an approved PR, an RFQ and one
    /// VAT-bearing quotation. Returns `(quotation_id, rfq_id)`.
    pub async fn quoted_requisition(&self, lines: &[(&str, i32)]) -> (String, String) {
        let pr_lines: Vec<Value> = lines
            .iter()
            .map(|(item_id, qty)| json!({"item_id": item_id, "qty": qty}))
            .collect();
        let pr = self
            .ok_as(
                "warehouse",
                Method::POST,
                "/api/v1/pr",
                Some(json!({"lines": pr_lines})),
            )
            .await;
        let pr_id = id_of(&pr);
        self.ok_as("director", Method::POST, &format!("/api/v1/pr/{}/approve", pr_id), None)
            .await;

        let rfq = self
            .ok_as(
                "purchasing",
                Method::POST,
                "/api/v1/rfq",
                Some(json!({"pr_id": pr_id})),
            )
            .await;
        let rfq_id = id_of(&rfq);

        let quotation = self
            .ok_as(
                "purchasing",
                Method::POST,
                &format!("/api/v1/rfq/{}/quotations", rfq_id),
                Some(json!({
                    "supplier_name": "Siam Medical Supply",
                    "quote_date": "2026-10-01",
                    "vat_included": true,
                    "total_before_vat": "1070.00",
                    "vat_amount": "74.90",
                    "total_after_vat": "1144.90"
                })),
            )
            .await;
        (id_of(&quotation), rfq_id)
    }

    /// Runs an item list through PR, RFQ, quotation and PO creation, then submits
    /// and approves the PO. Returns `(po_id, rfq_id)`.
    pub async fn approved_purchase_order(&self, lines: &[(&str, i32, &str)]) -> (String, String) {
        let requested: Vec<(&str, i32)> = lines.iter().map(|(item, qty, _)| (*item, *qty)).collect();
        let (quotation_id, rfq_id) = self.quoted_requisition(&requested).await;

        let po_lines: Vec<Value> = lines
            .iter()
            .map(|(item_id, qty, price)| {
                json!({"item_id": item_id, "quantity": qty, "unit_price": price})
            })
            .collect();
        let po = self
            .ok_as(
                "purchasing",
                Method::POST,
                "/api/v1/po",
                Some(json!({"quotation_id": quotation_id, "lines": po_lines})),
            )
            .await;
        let po_id = id_of(&po);

        self.ok_as("purchasing", Method::POST, &format!("/api/v1/po/{}/submit", po_id), None)
            .await;
        self.ok_as("director", Method::POST, &format!("/api/v1/po/{}/approve", po_id), None)
            .await;
        (po_id, rfq_id)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id in response").to_string()
}

/// Money fields are serialized as strings.
pub fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal string")).expect("parse decimal")
}
