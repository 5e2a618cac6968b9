use axum::{response::IntoResponse, routing::get, Json, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MedStock API",
        version = "1.0.0",
        description = r#"
# MedStock Hospital Warehouse API

Item catalog and stock ledger for a hospital warehouse, plus the purchasing chain
from purchase requisition to goods receipt.

## Authentication

Send a bearer token in the Authorization header:

```
Authorization: Bearer <your-jwt-token>
```

The token's role decides which item categories and workflow steps
(purchasing, approval, reports) are available.

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default and maximum are configurable).
        "#
    ),
    modifiers(&SecurityAddon),
    security(("bearer_auth" = [])),
    tags(
        (name = "items", description = "Item catalog and stock movements"),
        (name = "requisitions", description = "Purchase requisitions"),
        (name = "rfqs", description = "Requests for quotation"),
        (name = "quotations", description = "Supplier quotations"),
        (name = "purchase_orders", description = "Purchase orders"),
        (name = "goods_receipts", description = "Goods receipts"),
        (name = "reports", description = "CSV exports"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        // Items
        crate::handlers::items::list_items,
        crate::handlers::items::create_item,
        crate::handlers::items::get_item,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,
        crate::handlers::items::stock_in,
        crate::handlers::items::stock_out,
        crate::handlers::items::list_movements,

        // Requisitions
        crate::handlers::requisitions::create_requisition,
        crate::handlers::requisitions::list_requisitions,
        crate::handlers::requisitions::get_requisition,
        crate::handlers::requisitions::submit_requisition,
        crate::handlers::requisitions::cancel_requisition,
        crate::handlers::requisitions::approve_requisition,
        crate::handlers::requisitions::reject_requisition,

        // RFQs and quotations
        crate::handlers::rfqs::create_rfq,
        crate::handlers::rfqs::list_rfqs,
        crate::handlers::rfqs::get_rfq,
        crate::handlers::rfqs::open_rfq,
        crate::handlers::rfqs::close_rfq,
        crate::handlers::rfqs::cancel_rfq,
        crate::handlers::rfqs::record_quotation,
        crate::handlers::rfqs::list_rfq_quotations,
        crate::handlers::quotations::get_quotation,
        crate::handlers::quotations::list_quotations,

        // Purchase orders
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::update_line_pricing,
        crate::handlers::purchase_orders::submit_purchase_order,
        crate::handlers::purchase_orders::approve_purchase_order,
        crate::handlers::purchase_orders::cancel_purchase_order,
        crate::handlers::purchase_orders::add_attachment,
        crate::handlers::purchase_orders::list_attachments,
        crate::handlers::purchase_orders::receipt_status,

        // Goods receipts
        crate::handlers::goods_receipts::post_goods_receipt,
        crate::handlers::goods_receipts::list_goods_receipts,
        crate::handlers::goods_receipts::get_goods_receipt,

        // Reports
        crate::handlers::reports::export_items,
        crate::handlers::reports::export_requisitions,
        crate::handlers::reports::export_rfqs,
        crate::handlers::reports::export_purchase_orders,
        crate::handlers::reports::export_goods_receipts,
        crate::handlers::reports::export_stock_movements,

        // Health
        crate::handlers::health::liveness_check,
        crate::handlers::health::readiness_check,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::handlers::common::PaginationMeta,
            crate::services::catalog::ItemDetail,
            crate::services::purchase_orders::Totals,
            crate::services::purchase_orders::LineReceiptStatus,
        )
    )
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDocV1::openapi())
}

/// Serves the generated document; unauthenticated.
pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(OPENAPI_JSON_PATH, get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_generation() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("MedStock API"));
        assert!(json.contains("/api/v1/items"));
        assert!(json.contains("/api/v1/gr"));
        assert!(json.contains("bearer_auth"));
    }
}
