//! Thai display labels for enum values shown in exports.
//!
//! Every lookup is total: unknown keys map to [`UNKNOWN`].

pub const UNKNOWN: &str = "-";

pub type Translator = fn(&str) -> &'static str;

pub fn category_label(key: &str) -> &'static str {
    match key {
        "medicine" => "ยา",
        "medsup" => "เวชภัณฑ์มิใช่ยา",
        "equipment" => "ครุภัณฑ์",
        "meddevice" => "เครื่องมือแพทย์",
        "general" => "ของใช้ทั่วไป",
        _ => UNKNOWN,
    }
}

pub fn item_status_label(key: &str) -> &'static str {
    match key {
        "active" => "ใช้งาน",
        "inactive" => "ไม่ใช้งาน",
        _ => UNKNOWN,
    }
}

pub fn pr_status_label(key: &str) -> &'static str {
    match key {
        "draft" => "ฉบับร่าง",
        "submitted" => "รออนุมัติ",
        "approved" => "อนุมัติแล้ว",
        "rejected" => "ไม่อนุมัติ",
        "processed" => "ดำเนินการแล้ว",
        "canceled" => "ยกเลิก",
        _ => UNKNOWN,
    }
}

pub fn rfq_status_label(key: &str) -> &'static str {
    match key {
        "created" => "สร้างแล้ว",
        "open" => "เปิดรับใบเสนอราคา",
        "closed" => "ปิดรับใบเสนอราคา",
        "awarded" => "คัดเลือกผู้ขายแล้ว",
        "cancelled" => "ยกเลิก",
        _ => UNKNOWN,
    }
}

pub fn po_status_label(key: &str) -> &'static str {
    match key {
        "draft" => "ฉบับร่าง",
        "submitted" => "รออนุมัติ",
        "approved" => "อนุมัติแล้ว",
        "completed" => "รับของครบแล้ว",
        "canceled" => "ยกเลิก",
        _ => UNKNOWN,
    }
}

pub fn gr_status_label(key: &str) -> &'static str {
    match key {
        "pending" => "รอดำเนินการ",
        "partial" => "รับบางส่วน",
        "completed" => "รับครบ",
        _ => UNKNOWN,
    }
}

pub fn movement_type_label(key: &str) -> &'static str {
    match key {
        "in" => "รับเข้า",
        "out" => "เบิกออก",
        _ => UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        goods_receipt::GrStatus, item::ItemCategory, purchase_order::PoStatus,
        purchase_requisition::PrStatus, rfq::RfqStatus, stock_movement::MovementType,
    };
    use sea_orm::Iterable;

    #[test]
    fn every_category_has_a_label() {
        for category in ItemCategory::iter() {
            let label = category_label(category.as_ref());
            assert!(!label.is_empty());
            assert_ne!(label, UNKNOWN, "{} has no label", category);
        }
    }

    #[test]
    fn every_status_has_a_label() {
        for s in PrStatus::iter() {
            assert_ne!(pr_status_label(&s.to_string()), UNKNOWN);
        }
        for s in RfqStatus::iter() {
            assert_ne!(rfq_status_label(&s.to_string()), UNKNOWN);
        }
        for s in PoStatus::iter() {
            assert_ne!(po_status_label(&s.to_string()), UNKNOWN);
        }
        for s in GrStatus::iter() {
            assert_ne!(gr_status_label(&s.to_string()), UNKNOWN);
        }
        for s in MovementType::iter() {
            assert_ne!(movement_type_label(&s.to_string()), UNKNOWN);
        }
    }

    #[test]
    fn unknown_keys_fall_back() {
        assert_eq!(category_label("vehicle"), "-");
        assert_eq!(category_label(""), "-");
        assert_eq!(po_status_label("Approved"), "-");
    }
}
