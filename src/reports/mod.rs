//! Stateless CSV export of row lists.
//!
//! Rows are JSON objects (any `Serialize` model run through `serde_json`).
//! Output starts with a UTF-8 BOM so spreadsheet tools pick the right
//! encoding for the Thai header labels, and uses CRLF line endings.

pub mod labels;

use labels::{
    category_label, gr_status_label, item_status_label, movement_type_label, po_status_label,
    pr_status_label, rfq_status_label, Translator,
};
use serde_json::Value;

pub const BOM: &str = "\u{feff}";
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Maps one JSON field of a row to one CSV column.
#[derive(Clone, Copy, Debug)]
pub struct ColumnSpec {
    pub field: &'static str,
    pub label: &'static str,
    pub translate: Option<Translator>,
}

impl ColumnSpec {
    pub const fn new(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            translate: None,
        }
    }

    pub const fn translated(field: &'static str, label: &'static str, translate: Translator) -> Self {
        Self {
            field,
            label,
            translate: Some(translate),
        }
    }

    fn render(&self, row: &Value) -> String {
        match (row.get(self.field), self.translate) {
            (None | Some(Value::Null), _) => String::new(),
            (Some(Value::String(s)), Some(translate)) => translate(s).to_string(),
            (Some(Value::String(s)), None) => s.clone(),
            (Some(other), _) => other.to_string(),
        }
    }
}

/// Quotes a field when it contains a comma, quote, CR or LF; inner quotes are doubled.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn csv_export(columns: &[ColumnSpec], rows: &[Value]) -> String {
    let mut out = String::from(BOM);
    let header: Vec<String> = columns.iter().map(|c| escape_field(c.label)).collect();
    out.push_str(&header.join(","));
    out.push_str("\r\n");

    for row in rows {
        let fields: Vec<String> = columns
            .iter()
            .map(|c| escape_field(&c.render(row)))
            .collect();
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    out
}

pub const ITEM_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("name", "ชื่อรายการ"),
    ColumnSpec::translated("category", "ประเภท", category_label),
    ColumnSpec::new("quantity", "คงเหลือ"),
    ColumnSpec::new("unit", "หน่วย"),
    ColumnSpec::new("location", "สถานที่จัดเก็บ"),
    ColumnSpec::new("min_quantity", "จำนวนขั้นต่ำ"),
    ColumnSpec::new("max_quantity", "จำนวนสูงสุด"),
    ColumnSpec::translated("status", "สถานะ", item_status_label),
];

pub const REQUISITION_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("pr_no", "เลขที่ใบขอซื้อ"),
    ColumnSpec::new("requester_id", "ผู้ขอซื้อ"),
    ColumnSpec::translated("status", "สถานะ", pr_status_label),
    ColumnSpec::new("approved_by", "ผู้อนุมัติ"),
    ColumnSpec::new("note", "หมายเหตุ"),
    ColumnSpec::new("created_at", "วันที่สร้าง"),
];

pub const RFQ_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("rfq_no", "เลขที่ใบขอใบเสนอราคา"),
    ColumnSpec::translated("status", "สถานะ", rfq_status_label),
    ColumnSpec::new("created_by", "ผู้จัดทำ"),
    ColumnSpec::new("created_at", "วันที่สร้าง"),
];

pub const PURCHASE_ORDER_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("po_no", "เลขที่ใบสั่งซื้อ"),
    ColumnSpec::new("supplier_name", "ผู้ขาย"),
    ColumnSpec::translated("status", "สถานะ", po_status_label),
    ColumnSpec::new("currency", "สกุลเงิน"),
    ColumnSpec::new("subtotal", "ยอดก่อนภาษี"),
    ColumnSpec::new("vat_amount", "ภาษีมูลค่าเพิ่ม"),
    ColumnSpec::new("grand_total", "ยอดรวมสุทธิ"),
    ColumnSpec::new("created_at", "วันที่สร้าง"),
];

pub const GOODS_RECEIPT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("gr_no", "เลขที่ใบรับของ"),
    ColumnSpec::new("gr_date", "วันที่รับ"),
    ColumnSpec::new("vendor", "ผู้ขาย"),
    ColumnSpec::new("delivery_note", "เลขที่ใบส่งของ"),
    ColumnSpec::translated("status", "สถานะ", gr_status_label),
    ColumnSpec::new("received_by", "ผู้รับ"),
];

pub const STOCK_MOVEMENT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("created_at", "วันที่"),
    ColumnSpec::new("item_name", "ชื่อรายการ"),
    ColumnSpec::translated("movement_type", "ประเภทรายการ", movement_type_label),
    ColumnSpec::new("quantity", "จำนวน"),
    ColumnSpec::new("balance_after", "คงเหลือ"),
    ColumnSpec::new("reference", "เอกสารอ้างอิง"),
    ColumnSpec::new("created_by", "ผู้ทำรายการ"),
];
