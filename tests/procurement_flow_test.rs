//! End-to-end purchasing chain: requisition, RFQ, quotation, purchase order and
//! goods receipts, driven through the HTTP router.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, id_of, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn full_chain_receives_stock_and_completes_order() {
    let app = TestApp::new().await;
    let gloves = app.seed_item("Nitrile gloves", 0).await;
    let masks = app.seed_item("Surgical masks", 0).await;

    let (po_id, rfq_id) = app
        .approved_purchase_order(&[(&gloves, 10, "100.00"), (&masks, 5, "14.00")])
        .await;

    let po = app
        .ok_as("purchasing", Method::GET, &format!("/api/v1/po/{}", po_id), None)
        .await;
    assert_eq!(po["status"], "approved");
    assert_eq!(po["approved_by"], "director-user");
    assert_eq!(decimal(&po["subtotal"]), dec!(1070.00));
    assert_eq!(decimal(&po["vat_amount"]), dec!(74.90));
    assert_eq!(decimal(&po["grand_total"]), dec!(1144.90));
    assert_eq!(po["items"].as_array().map(Vec::len), Some(2));

    let rfq = app
        .ok_as("purchasing", Method::GET, &format!("/api/v1/rfq/{}", rfq_id), None)
        .await;
    assert_eq!(rfq["status"], "awarded");
    assert_eq!(rfq["quotations"][0]["is_selected"], true);

    // First delivery: part of the gloves only
    let (status, gr) = app
        .call_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({
                "po_id": po_id,
                "delivery_note": "DN-001",
                "lines": [{"item_id": gloves, "qty_received": 4}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", gr);
    assert_eq!(gr["status"], "partial");
    assert_eq!(gr["po_completed"], false);
    assert_eq!(gr["vendor"], "Siam Medical Supply");
    let first_gr_no = gr["gr_no"].as_str().unwrap().to_string();
    assert!(first_gr_no.starts_with("GR-"));

    assert_eq!(app.item_quantity(&gloves).await, 4);
    assert_eq!(app.item_quantity(&masks).await, 0);

    let receipt = app
        .ok_as(
            "purchasing",
            Method::GET,
            &format!("/api/v1/po/{}/receipt-status", po_id),
            None,
        )
        .await;
    assert_eq!(receipt["fully_received"], false);
    let lines = receipt["lines"].as_array().unwrap();
    let line_for = |item: &str| {
        lines
            .iter()
            .find(|l| l["item_id"] == item)
            .cloned()
            .unwrap()
    };
    assert_eq!(line_for(&gloves)["status"], "partial");
    assert_eq!(line_for(&gloves)["remaining"], 6);
    assert_eq!(line_for(&masks)["status"], "not_received");

    // Second delivery closes every line
    let gr = app
        .ok_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({
                "po_id": po_id,
                "lines": [
                    {"item_id": gloves, "qty_received": 6},
                    {"item_id": masks, "qty_received": 5}
                ]
            })),
        )
        .await;
    assert_eq!(gr["status"], "completed");
    assert_eq!(gr["po_completed"], true);

    assert_eq!(app.item_quantity(&gloves).await, 10);
    assert_eq!(app.item_quantity(&masks).await, 5);

    let po = app
        .ok_as("purchasing", Method::GET, &format!("/api/v1/po/{}", po_id), None)
        .await;
    assert_eq!(po["status"], "completed");

    let movements = app
        .ok_as(
            "admin",
            Method::GET,
            &format!("/api/v1/items/{}/movements", gloves),
            None,
        )
        .await;
    let rows = movements["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|m| m["movement_type"] == "in"));
    assert!(rows.iter().any(|m| m["reference"] == first_gr_no.as_str()));
    assert_eq!(movements["pagination"]["total"], 2);

    let receipts = app
        .ok_as(
            "purchasing",
            Method::GET,
            &format!("/api/v1/gr?po_id={}", po_id),
            None,
        )
        .await;
    assert_eq!(receipts["pagination"]["total"], 2);
}

#[tokio::test]
async fn over_receipt_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let saline = app.seed_item("Saline 0.9% 1L", 0).await;
    let (po_id, _) = app.approved_purchase_order(&[(&saline, 10, "35.00")]).await;

    let (status, body) = app
        .call_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({"po_id": po_id, "lines": [{"item_id": saline, "qty_received": 11}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_array().expect("over-receipt details");
    assert_eq!(details.len(), 1);
    assert!(details[0].as_str().unwrap().contains("remaining 10"));
    assert_eq!(app.item_quantity(&saline).await, 0);

    let receipts = app
        .ok_as("warehouse", Method::GET, &format!("/api/v1/gr?po_id={}", po_id), None)
        .await;
    assert_eq!(receipts["pagination"]["total"], 0);

    // Exactly the outstanding quantity is accepted
    let gr = app
        .ok_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({"po_id": po_id, "lines": [{"item_id": saline, "qty_received": 10}]})),
        )
        .await;
    assert_eq!(gr["po_completed"], true);
    assert_eq!(app.item_quantity(&saline).await, 10);

    // Nothing more can be received against a completed order
    let (status, _) = app
        .call_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({"po_id": po_id, "lines": [{"item_id": saline, "qty_received": 1}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.item_quantity(&saline).await, 10);
}

#[tokio::test]
async fn receipt_lines_for_the_same_item_are_checked_together() {
    let app = TestApp::new().await;
    let syringes = app.seed_item("Syringe 5ml", 0).await;
    let (po_id, _) = app.approved_purchase_order(&[(&syringes, 10, "2.50")]).await;

    let (status, body) = app
        .call_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({
                "po_id": po_id,
                "lines": [
                    {"item_id": syringes, "qty_received": 6},
                    {"item_id": syringes, "qty_received": 6}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(app.item_quantity(&syringes).await, 0);
}

#[tokio::test]
async fn receipt_requires_an_approved_order_and_known_items() {
    let app = TestApp::new().await;
    let gauze = app.seed_item("Gauze pad", 0).await;
    let other = app.seed_item("Cotton roll", 0).await;

    let pr = app
        .ok_as(
            "warehouse",
            Method::POST,
            "/api/v1/pr",
            Some(json!({"lines": [{"item_id": gauze, "qty": 3}]})),
        )
        .await;
    app.ok_as("director", Method::POST, &format!("/api/v1/pr/{}/approve", id_of(&pr)), None)
        .await;
    let rfq = app
        .ok_as("purchasing", Method::POST, "/api/v1/rfq", Some(json!({"pr_id": id_of(&pr)})))
        .await;
    let quotation = app
        .ok_as(
            "purchasing",
            Method::POST,
            &format!("/api/v1/rfq/{}/quotations", id_of(&rfq)),
            Some(json!({
                "supplier_name": "Bangkok Surgical",
                "quote_date": "2026-10-02",
                "vat_included": false,
                "total_before_vat": "30.00",
                "total_after_vat": "30.00"
            })),
        )
        .await;

    // Lines omitted: carried forward from the RFQ at price zero
    let po = app
        .ok_as(
            "purchasing",
            Method::POST,
            "/api/v1/po",
            Some(json!({"quotation_id": id_of(&quotation)})),
        )
        .await;
    let po_id = id_of(&po);
    assert_eq!(po["status"], "draft");
    assert_eq!(po["items"][0]["qty_ordered"], 3);
    assert_eq!(decimal(&po["vat_rate"]), dec!(0));

    let (status, _) = app
        .call_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({"po_id": po_id, "lines": [{"item_id": gauze, "qty_received": 1}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let repriced = app
        .ok_as(
            "purchasing",
            Method::PUT,
            &format!("/api/v1/po/{}/lines", po_id),
            Some(json!({"lines": [{"item_id": gauze, "unit_price": "10.00"}]})),
        )
        .await;
    assert_eq!(decimal(&repriced["grand_total"]), dec!(30.00));

    app.ok_as("purchasing", Method::POST, &format!("/api/v1/po/{}/submit", po_id), None)
        .await;
    app.ok_as("director", Method::POST, &format!("/api/v1/po/{}/approve", po_id), None)
        .await;

    let (status, body) = app
        .call_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({"po_id": po_id, "lines": [{"item_id": other, "qty_received": 1}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(app.item_quantity(&other).await, 0);
}

#[tokio::test]
async fn requisition_decisions_are_single_shot() {
    let app = TestApp::new().await;
    let item = app.seed_item("IV cannula 22G", 0).await;

    let pr = app
        .ok_as(
            "warehouse",
            Method::POST,
            "/api/v1/pr",
            Some(json!({"lines": [{"item_id": item, "qty": 20}], "as_draft": true})),
        )
        .await;
    let pr_id = id_of(&pr);
    assert_eq!(pr["status"], "draft");
    assert!(pr["pr_no"].as_str().unwrap().starts_with("PR-"));

    // Drafts cannot be approved
    let (status, _) = app
        .call_as("director", Method::POST, &format!("/api/v1/pr/{}/approve", pr_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.ok_as("warehouse", Method::POST, &format!("/api/v1/pr/{}/submit", pr_id), None)
        .await;
    let approved = app
        .ok_as(
            "director",
            Method::POST,
            &format!("/api/v1/pr/{}/approve", pr_id),
            Some(json!({"note": "urgent ward stock"})),
        )
        .await;
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by"], "director-user");
    assert_eq!(approved["decision_note"], "urgent ward stock");

    let (status, _) = app
        .call_as("director", Method::POST, &format!("/api/v1/pr/{}/approve", pr_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .call_as("director", Method::POST, &format!("/api/v1/pr/{}/reject", pr_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // One RFQ per requisition
    app.ok_as("purchasing", Method::POST, "/api/v1/rfq", Some(json!({"pr_id": pr_id})))
        .await;
    let (status, _) = app
        .call_as("purchasing", Method::POST, "/api/v1/rfq", Some(json!({"pr_id": pr_id})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let pr = app
        .ok_as("warehouse", Method::GET, &format!("/api/v1/pr/{}", pr_id), None)
        .await;
    assert_eq!(pr["status"], "processed");
    assert_eq!(app.item_quantity(&item).await, 0);
}

#[tokio::test]
async fn rfq_requires_an_approved_requisition() {
    let app = TestApp::new().await;
    let item = app.seed_item("Alcohol swab", 0).await;
    let pr = app
        .ok_as(
            "warehouse",
            Method::POST,
            "/api/v1/pr",
            Some(json!({"lines": [{"item_id": item, "qty": 100}]})),
        )
        .await;

    let (status, body) = app
        .call_as("purchasing", Method::POST, "/api/v1/rfq", Some(json!({"pr_id": id_of(&pr)})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, _) = app
        .call_as(
            "purchasing",
            Method::POST,
            "/api/v1/rfq",
            Some(json!({"pr_id": uuid::Uuid::new_v4()})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancelled_rfq_rejects_quotations() {
    let app = TestApp::new().await;
    let item = app.seed_item("Examination paper roll", 0).await;
    let pr = app
        .ok_as(
            "warehouse",
            Method::POST,
            "/api/v1/pr",
            Some(json!({"lines": [{"item_id": item, "qty": 4}]})),
        )
        .await;
    app.ok_as("director", Method::POST, &format!("/api/v1/pr/{}/approve", id_of(&pr)), None)
        .await;
    let rfq = app
        .ok_as("purchasing", Method::POST, "/api/v1/rfq", Some(json!({"pr_id": id_of(&pr)})))
        .await;
    let rfq_id = id_of(&rfq);
    assert_eq!(rfq["status"], "created");
    assert_eq!(rfq["items"][0]["qty"], 4);

    let cancelled = app
        .ok_as("purchasing", Method::POST, &format!("/api/v1/rfq/{}/cancel", rfq_id), None)
        .await;
    assert_eq!(cancelled["status"], "cancelled");

    let (status, _) = app
        .call_as(
            "purchasing",
            Method::POST,
            &format!("/api/v1/rfq/{}/quotations", rfq_id),
            Some(json!({
                "supplier_name": "Late Supplier",
                "quote_date": "2026-10-03",
                "vat_included": true,
                "total_before_vat": "10.00",
                "vat_amount": "0.70",
                "total_after_vat": "10.70"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_receipt_quantities_are_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let drapes = app.seed_item("Sterile drape", 0).await;
    let (po_id, _) = app.approved_purchase_order(&[(&drapes, 10, "12.00")]).await;

    let (status, body) = app
        .call_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({
                "po_id": po_id,
                "lines": [
                    {"item_id": drapes, "qty_received": i32::MAX},
                    {"item_id": drapes, "qty_received": i32::MAX}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(app.item_quantity(&drapes).await, 0);

    let receipts = app
        .ok_as("warehouse", Method::GET, &format!("/api/v1/gr?po_id={}", po_id), None)
        .await;
    assert_eq!(receipts["pagination"]["total"], 0);

    let status_view = app
        .ok_as(
            "purchasing",
            Method::GET,
            &format!("/api/v1/po/{}/receipt-status", po_id),
            None,
        )
        .await;
    assert_eq!(status_view["lines"][0]["received"], 0);
    assert_eq!(status_view["lines"][0]["remaining"], 10);
}

#[tokio::test]
async fn oversized_prices_are_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let ventilator = app.seed_item("Ventilator circuit", 0).await;
    let (quotation_id, rfq_id) = app.quoted_requisition(&[(&ventilator, 10)]).await;

    let (status, body) = app
        .call_as(
            "purchasing",
            Method::POST,
            "/api/v1/po",
            Some(json!({
                "quotation_id": quotation_id,
                "lines": [{
                    "item_id": ventilator,
                    "quantity": 10,
                    "unit_price": "79228162514264337593543950335"
                }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let orders = app.ok_as("purchasing", Method::GET, "/api/v1/po", None).await;
    assert_eq!(orders["pagination"]["total"], 0);
    let rfq = app
        .ok_as("purchasing", Method::GET, &format!("/api/v1/rfq/{}", rfq_id), None)
        .await;
    assert_ne!(rfq["status"], "awarded");
    assert_eq!(rfq["quotations"][0]["is_selected"], false);

    // The same quotation still produces an order at a sane price
    let po = app
        .ok_as(
            "purchasing",
            Method::POST,
            "/api/v1/po",
            Some(json!({
                "quotation_id": quotation_id,
                "lines": [{"item_id": ventilator, "quantity": 10, "unit_price": "100.00"}]
            })),
        )
        .await;
    let po_id = id_of(&po);
    assert_eq!(decimal(&po["subtotal"]), dec!(1000.00));

    // Repricing a draft line is held to the same limit
    let (status, _) = app
        .call_as(
            "purchasing",
            Method::PUT,
            &format!("/api/v1/po/{}/lines", po_id),
            Some(json!({"lines": [{"item_id": ventilator, "unit_price": "79228162514264337593543950335"}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let po = app
        .ok_as("purchasing", Method::GET, &format!("/api/v1/po/{}", po_id), None)
        .await;
    assert_eq!(decimal(&po["subtotal"]), dec!(1000.00));
    assert_eq!(decimal(&po["items"][0]["unit_price"]), dec!(100.00));
}

#[tokio::test]
async fn store_keepers_only_receive_their_own_categories() {
    let app = TestApp::new().await;
    let bandage = app
        .seed_item_in("Elastic bandage", 0, json!({"category": "medsup", "attributes": {}}))
        .await;
    let paper = app.seed_item("Copy paper A4", 0).await;
    let (po_id, _) = app
        .approved_purchase_order(&[(&bandage, 5, "20.00"), (&paper, 5, "120.00")])
        .await;

    let (status, _) = app
        .call_as(
            "nurse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({"po_id": po_id, "lines": [{"item_id": paper, "qty_received": 5}]})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.item_quantity(&paper).await, 0);

    // One foreign line spoils the whole receipt
    let (status, _) = app
        .call_as(
            "nurse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({
                "po_id": po_id,
                "lines": [
                    {"item_id": bandage, "qty_received": 5},
                    {"item_id": paper, "qty_received": 5}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.item_quantity(&bandage).await, 0);

    let (status, body) = app
        .call_as(
            "nurse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({"po_id": po_id, "lines": [{"item_id": bandage, "qty_received": 5}]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(app.item_quantity(&bandage).await, 5);

    let gr = app
        .ok_as(
            "purchasing",
            Method::POST,
            "/api/v1/gr",
            Some(json!({"po_id": po_id, "lines": [{"item_id": paper, "qty_received": 5}]})),
        )
        .await;
    assert_eq!(gr["po_completed"], true);
    assert_eq!(app.item_quantity(&paper).await, 5);
}
