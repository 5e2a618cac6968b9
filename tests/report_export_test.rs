//! CSV exports as seen by a spreadsheet user.

mod common;

use axum::{
    body,
    http::{header, Method, StatusCode},
};
use common::TestApp;
use serde_json::json;

async fn download(app: &TestApp, role: &str, uri: &str) -> (StatusCode, String, String, String) {
    let token = app.token_for(role);
    let response = app.request(Method::GET, uri, None, Some(&token)).await;
    let status = response.status();
    let header_of = |name: header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let content_type = header_of(header::CONTENT_TYPE);
    let disposition = header_of(header::CONTENT_DISPOSITION);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("csv body");
    (
        status,
        content_type,
        disposition,
        String::from_utf8(bytes.to_vec()).expect("utf-8 csv"),
    )
}

fn parse(csv_text: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let text = csv_text.strip_prefix('\u{feff}').expect("leading BOM");
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .expect("header row")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("record").iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

#[tokio::test]
async fn item_export_is_excel_friendly() {
    let app = TestApp::new().await;
    app.seed_item("Gauze, sterile \"4x4\"", 40).await;

    let (status, content_type, disposition, text) =
        download(&app, "warehouse", "/api/v1/reports/items.csv").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/csv"));
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("items-"));
    assert!(text.starts_with('\u{feff}'));
    assert!(text.contains("\r\n"));

    let (headers, rows) = parse(&text);
    assert_eq!(headers[0], "ชื่อรายการ");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Gauze, sterile \"4x4\"");
    assert_eq!(rows[0][1], "ของใช้ทั่วไป");
    assert_eq!(rows[0][2], "40");
    assert_eq!(rows[0][7], "ใช้งาน");
}

#[tokio::test]
async fn item_export_only_covers_visible_categories() {
    let app = TestApp::new().await;
    app.seed_item_in(
        "Ceftriaxone 1g",
        10,
        json!({"category": "medicine", "attributes": {}}),
    )
    .await;
    app.seed_item_in(
        "Infusion pump",
        2,
        json!({"category": "equipment", "attributes": {"serial_no": "IP-7"}}),
    )
    .await;

    let (status, _, _, text) = download(&app, "pharmacist", "/api/v1/reports/items.csv").await;
    assert_eq!(status, StatusCode::OK);
    let (_, rows) = parse(&text);
    let names: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(names, vec!["Ceftriaxone 1g"]);

    let (_, _, _, text) = download(&app, "admin", "/api/v1/reports/items.csv").await;
    let (_, rows) = parse(&text);
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn movement_export_names_the_item() {
    let app = TestApp::new().await;
    let item = app.seed_item("Alcohol pad", 100).await;
    app.ok_as(
        "warehouse",
        Method::POST,
        &format!("/api/v1/items/{}/stock-out", item),
        Some(json!({"quantity": 30, "reference": "OPD"})),
    )
    .await;

    let (status, _, _, text) =
        download(&app, "warehouse", "/api/v1/reports/stock-movements.csv").await;
    assert_eq!(status, StatusCode::OK);
    let (headers, rows) = parse(&text);
    assert_eq!(headers[1], "ชื่อรายการ");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r[1] == "Alcohol pad"));
    assert!(rows.iter().any(|r| r[2] == "เบิกออก" && r[3] == "30" && r[4] == "70"));
}

#[tokio::test]
async fn empty_exports_still_have_a_header() {
    let app = TestApp::new().await;

    for uri in [
        "/api/v1/reports/requisitions.csv",
        "/api/v1/reports/purchase-orders.csv",
        "/api/v1/reports/rfqs.csv",
        "/api/v1/reports/goods-receipts.csv",
    ] {
        let (status, _, _, text) = download(&app, "director", uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        let (headers, rows) = parse(&text);
        assert!(!headers.is_empty());
        assert!(rows.is_empty());
    }
}

#[tokio::test]
async fn exports_require_the_report_category() {
    let app = TestApp::new().await;

    for role in ["nurse", "biomed"] {
        let (status, _, _, _) = download(&app, role, "/api/v1/reports/items.csv").await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", role);
    }
}

#[tokio::test]
async fn rfq_and_receipt_exports_use_thai_status_labels() {
    let app = TestApp::new().await;
    let item = app.seed_item("Examination gloves M", 0).await;
    let (po_id, _) = app.approved_purchase_order(&[(&item, 4, "85.00")]).await;
    let gr = app
        .ok_as(
            "warehouse",
            Method::POST,
            "/api/v1/gr",
            Some(json!({
                "po_id": po_id,
                "delivery_note": "DN-4410",
                "lines": [{"item_id": item, "qty_received": 4}]
            })),
        )
        .await;

    let (status, _, disposition, text) =
        download(&app, "purchasing", "/api/v1/reports/rfqs.csv").await;
    assert_eq!(status, StatusCode::OK);
    assert!(disposition.contains("rfqs-"));
    let (headers, rows) = parse(&text);
    assert_eq!(headers[0], "เลขที่ใบขอใบเสนอราคา");
    assert_eq!(rows.len(), 1);
    assert!(rows[0][0].starts_with("RFQ-"));
    assert_eq!(rows[0][1], "คัดเลือกผู้ขายแล้ว");

    let (status, _, disposition, text) =
        download(&app, "warehouse", "/api/v1/reports/goods-receipts.csv").await;
    assert_eq!(status, StatusCode::OK);
    assert!(disposition.contains("goods-receipts-"));
    let (headers, rows) = parse(&text);
    assert_eq!(headers[0], "เลขที่ใบรับของ");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], gr["gr_no"].as_str().unwrap());
    assert_eq!(rows[0][2], "Siam Medical Supply");
    assert_eq!(rows[0][3], "DN-4410");
    assert_eq!(rows[0][4], "รับครบ");
}
