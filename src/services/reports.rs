use crate::{
    entities::item::ItemCategory,
    errors::ServiceError,
    reports::{
        csv_export, ColumnSpec, GOODS_RECEIPT_COLUMNS, ITEM_COLUMNS, PURCHASE_ORDER_COLUMNS,
        REQUISITION_COLUMNS, RFQ_COLUMNS, STOCK_MOVEMENT_COLUMNS,
    },
    services::{
        catalog::CatalogService, goods_receipts::GoodsReceiptService,
        purchase_orders::PurchaseOrderService, requisitions::RequisitionService, rfqs::RfqService,
    },
};
use serde::Serialize;
use serde_json::Value;
use slog::Logger;
use std::sync::Arc;
use tracing::instrument;

/// Builds CSV exports from the other services' read paths.
#[derive(Clone)]
pub struct ReportService {
    catalog: Arc<CatalogService>,
    requisitions: Arc<RequisitionService>,
    rfqs: Arc<RfqService>,
    purchase_orders: Arc<PurchaseOrderService>,
    goods_receipts: Arc<GoodsReceiptService>,
    logger: Logger,
}

impl ReportService {
    pub fn new(
        catalog: Arc<CatalogService>,
        requisitions: Arc<RequisitionService>,
        rfqs: Arc<RfqService>,
        purchase_orders: Arc<PurchaseOrderService>,
        goods_receipts: Arc<GoodsReceiptService>,
        logger: Logger,
    ) -> Self {
        Self {
            catalog,
            requisitions,
            rfqs,
            purchase_orders,
            goods_receipts,
            logger,
        }
    }

    #[instrument(skip(self))]
    pub async fn items_csv(
        &self,
        visible_categories: Option<Vec<ItemCategory>>,
    ) -> Result<String, ServiceError> {
        let items = self.catalog.all_items(visible_categories).await?;
        self.render("items", ITEM_COLUMNS, &items)
    }

    #[instrument(skip(self))]
    pub async fn requisitions_csv(&self) -> Result<String, ServiceError> {
        let rows = self.requisitions.all().await?;
        self.render("requisitions", REQUISITION_COLUMNS, &rows)
    }

    #[instrument(skip(self))]
    pub async fn rfqs_csv(&self) -> Result<String, ServiceError> {
        let rows = self.rfqs.all().await?;
        self.render("rfqs", RFQ_COLUMNS, &rows)
    }

    #[instrument(skip(self))]
    pub async fn purchase_orders_csv(&self) -> Result<String, ServiceError> {
        let rows = self.purchase_orders.all().await?;
        self.render("purchase-orders", PURCHASE_ORDER_COLUMNS, &rows)
    }

    #[instrument(skip(self))]
    pub async fn goods_receipts_csv(&self) -> Result<String, ServiceError> {
        let rows = self.goods_receipts.all().await?;
        self.render("goods-receipts", GOODS_RECEIPT_COLUMNS, &rows)
    }

    #[instrument(skip(self))]
    pub async fn stock_movements_csv(&self) -> Result<String, ServiceError> {
        let rows = self
            .catalog
            .all_movements()
            .await?
            .into_iter()
            .map(|(movement, item)| {
                let mut row = to_row(&movement)?;
                if let Value::Object(map) = &mut row {
                    map.insert(
                        "item_name".to_string(),
                        item.map(|i| Value::String(i.name)).unwrap_or(Value::Null),
                    );
                }
                Ok(row)
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;
        slog::info!(self.logger, "report exported"; "report" => "stock-movements", "rows" => rows.len());
        Ok(csv_export(STOCK_MOVEMENT_COLUMNS, &rows))
    }

    fn render<T: Serialize>(
        &self,
        report: &'static str,
        columns: &[ColumnSpec],
        rows: &[T],
    ) -> Result<String, ServiceError> {
        let rows = rows.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
        slog::info!(self.logger, "report exported"; "report" => report, "rows" => rows.len());
        Ok(csv_export(columns, &rows))
    }
}

fn to_row<T: Serialize>(model: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(model)
        .map_err(|e| ServiceError::InternalError(format!("failed to serialize report row: {}", e)))
}
