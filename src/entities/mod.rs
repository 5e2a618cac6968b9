// Item catalog
pub mod item;
pub mod medicine_detail;
pub mod medsup_detail;
pub mod equipment_detail;
pub mod meddevice_detail;
pub mod general_detail;
pub mod stock_movement;

// Purchasing chain: PR -> RFQ -> quotation -> PO -> GR
pub mod purchase_requisition;
pub mod purchase_requisition_item;
pub mod rfq;
pub mod rfq_item;
pub mod quotation;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod po_attachment;
pub mod goods_receipt;
pub mod goods_receipt_item;
