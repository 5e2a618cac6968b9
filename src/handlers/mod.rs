pub mod common;
pub mod goods_receipts;
pub mod health;
pub mod items;
pub mod purchase_orders;
pub mod quotations;
pub mod reports;
pub mod requisitions;
pub mod rfqs;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    logging::component_logger,
    services::{
        catalog::CatalogService, goods_receipts::GoodsReceiptService,
        purchase_orders::PurchaseOrderService, quotations::QuotationService,
        reports::ReportService, requisitions::RequisitionService, rfqs::RfqService,
    },
};
use slog::Logger;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub requisitions: Arc<RequisitionService>,
    pub rfqs: Arc<RfqService>,
    pub quotations: Arc<QuotationService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub goods_receipts: Arc<GoodsReceiptService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    /// Wires every service against one pool and event channel. Each service
    /// logs audit lines under its own `component` key.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        logger: &Logger,
        config: &AppConfig,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(
            db_pool.clone(),
            event_sender.clone(),
            component_logger(logger, "catalog_service"),
        ));
        let requisitions = Arc::new(RequisitionService::new(
            db_pool.clone(),
            event_sender.clone(),
            component_logger(logger, "requisition_service"),
        ));
        let rfqs = Arc::new(RfqService::new(
            db_pool.clone(),
            event_sender.clone(),
            component_logger(logger, "rfq_service"),
        ));
        let quotations = Arc::new(QuotationService::new(
            db_pool.clone(),
            event_sender.clone(),
            component_logger(logger, "quotation_service"),
            config.default_currency.clone(),
        ));
        let purchase_orders = Arc::new(PurchaseOrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            component_logger(logger, "purchase_order_service"),
            config.vat_rate(),
        ));
        let goods_receipts = Arc::new(GoodsReceiptService::new(
            db_pool,
            catalog.clone(),
            event_sender,
            component_logger(logger, "goods_receipt_service"),
        ));
        let reports = Arc::new(ReportService::new(
            catalog.clone(),
            requisitions.clone(),
            rfqs.clone(),
            purchase_orders.clone(),
            goods_receipts.clone(),
            component_logger(logger, "report_service"),
        ));

        Self {
            catalog,
            requisitions,
            rfqs,
            quotations,
            purchase_orders,
            goods_receipts,
            reports,
        }
    }
}
