// Shared workflow helpers
pub mod lifecycle;
pub mod numbering;

// Inventory
pub mod catalog;

// Purchasing chain: PR -> RFQ -> quotation -> PO -> GR
pub mod goods_receipts;
pub mod purchase_orders;
pub mod quotations;
pub mod requisitions;
pub mod rfqs;

// Exports
pub mod reports;
