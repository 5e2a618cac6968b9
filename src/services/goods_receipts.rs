use crate::{
    db::DbPool,
    entities::{
        goods_receipt::{self, Entity as GoodsReceiptEntity, GrStatus},
        goods_receipt_item::{self, Entity as GoodsReceiptItemEntity},
        purchase_order::{self, PoStatus},
        purchase_order_item::{self, Entity as PurchaseOrderItemEntity},
        stock_movement::MovementType,
    },
    errors::{OverReceiptLine, ServiceError},
    events::{Event, EventSender},
    services::{
        catalog::{apply_movement, find_item, CatalogService},
        lifecycle::{ensure_swapped, Lifecycle},
        numbering::{next_document_number, DocumentKind},
        purchase_orders::{advance_purchase_order, find_purchase_order, po_lines},
    },
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiptLineInput {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub qty_received: i32,
}

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct PostGoodsReceiptInput {
    pub po_id: Uuid,
    /// Defaults to today
    pub gr_date: Option<NaiveDate>,
    #[validate(length(max = 64))]
    pub delivery_note: Option<String>,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<ReceiptLineInput>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GoodsReceiptView {
    #[serde(flatten)]
    pub goods_receipt: goods_receipt::Model,
    pub items: Vec<goods_receipt_item::Model>,
    /// Whether this receipt completed its purchase order
    pub po_completed: bool,
}

/// Sums quantities of repeated items, keeping first-seen order.
fn merge_lines(lines: &[ReceiptLineInput]) -> Result<Vec<(Uuid, i32)>, ServiceError> {
    let mut merged: Vec<(Uuid, i32)> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|(id, _)| *id == line.item_id) {
            Some((_, qty)) => {
                *qty = qty.checked_add(line.qty_received).ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "received quantity for item {} is too large",
                        line.item_id
                    ))
                })?
            }
            None => merged.push((line.item_id, line.qty_received)),
        }
    }
    Ok(merged)
}

/// Every merged line that exceeds what is still outstanding on the order.
fn over_receipts(
    merged: &[(Uuid, i32)],
    order_lines: &[purchase_order_item::Model],
) -> Vec<OverReceiptLine> {
    merged
        .iter()
        .filter_map(|(item_id, qty)| {
            let line = order_lines.iter().find(|l| l.item_id == *item_id)?;
            (*qty > line.remaining()).then(|| OverReceiptLine {
                item_id: *item_id,
                ordered: line.qty_ordered,
                already_received: line.qty_received,
                attempted: *qty,
            })
        })
        .collect()
}

/// Receives goods against approved purchase orders and stocks them in.
#[derive(Clone)]
pub struct GoodsReceiptService {
    db_pool: Arc<DbPool>,
    catalog: Arc<CatalogService>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl GoodsReceiptService {
    pub fn new(
        db_pool: Arc<DbPool>,
        catalog: Arc<CatalogService>,
        event_sender: Arc<EventSender>,
        logger: Logger,
    ) -> Self {
        Self {
            db_pool,
            catalog,
            event_sender,
            logger,
        }
    }

    /// Posts a goods receipt.
    ///
    /// All lines are checked against the outstanding quantities first; if any
    /// line is over, nothing is written and every offending line is reported.
    /// Otherwise the receipt, the order line increments and the stock-in
    /// movements commit together.
    #[instrument(skip(self, input), fields(po_id = %input.po_id))]
    pub async fn post(
        &self,
        input: PostGoodsReceiptInput,
        actor: &str,
    ) -> Result<GoodsReceiptView, ServiceError> {
        input.validate()?;
        for line in &input.lines {
            line.validate()?;
        }
        let merged = merge_lines(&input.lines)?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let po = find_purchase_order(&txn, input.po_id).await?;
        if po.status != PoStatus::Approved {
            return Err(ServiceError::InvalidStatus(format!(
                "purchase order {} is {}, goods can only be received against an approved order",
                po.po_no, po.status
            )));
        }

        let order_lines = po_lines(&txn, po.id).await?;
        if let Some((item_id, _)) = merged
            .iter()
            .find(|(id, _)| !order_lines.iter().any(|l| l.item_id == *id))
        {
            return Err(ServiceError::ValidationError(format!(
                "item {} is not on purchase order {}",
                item_id, po.po_no
            )));
        }

        let violations = over_receipts(&merged, &order_lines);
        if !violations.is_empty() {
            warn!(po_no = %po.po_no, lines = violations.len(), "Over-receipt rejected");
            return Err(ServiceError::OverReceipt(violations));
        }

        let gr_id = Uuid::new_v4();
        let gr_no = next_document_number(DocumentKind::GoodsReceipt);
        let header = goods_receipt::ActiveModel {
            id: Set(gr_id),
            gr_no: Set(gr_no.clone()),
            po_id: Set(po.id),
            gr_date: Set(input.gr_date.unwrap_or_else(|| Utc::now().date_naive())),
            delivery_note: Set(input.delivery_note),
            vendor: Set(po.supplier_name.clone()),
            status: Set(GrStatus::Pending),
            received_by: Set(actor.to_string()),
            note: Set(input.note),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!("Failed to create goods receipt for {}: {}", po.po_no, e);
            ServiceError::db_error(e)
        })?;

        let mut items = Vec::with_capacity(merged.len());
        let mut moved = Vec::with_capacity(merged.len());
        for (item_id, qty) in &merged {
            let (item_id, qty) = (*item_id, *qty);
            let order_line = order_lines
                .iter()
                .find(|l| l.item_id == item_id)
                .ok_or_else(|| ServiceError::InternalError("order line vanished".to_string()))?;

            let result = PurchaseOrderItemEntity::update_many()
                .col_expr(
                    purchase_order_item::Column::QtyReceived,
                    Expr::col(purchase_order_item::Column::QtyReceived).add(qty),
                )
                .filter(purchase_order_item::Column::Id.eq(order_line.id))
                .filter(
                    Expr::col(purchase_order_item::Column::QtyReceived)
                        .lte(Expr::col(purchase_order_item::Column::QtyOrdered).sub(qty)),
                )
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if result.rows_affected == 0 {
                return Err(ServiceError::Conflict(format!(
                    "purchase order {} line for item {} was received concurrently",
                    po.po_no, item_id
                )));
            }

            let row = goods_receipt_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                gr_id: Set(gr_id),
                po_item_id: Set(order_line.id),
                item_id: Set(item_id),
                qty_received: Set(qty),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(row);

            let movement = apply_movement(
                &txn,
                item_id,
                MovementType::In,
                qty,
                Some(gr_no.clone()),
                None,
                actor,
            )
            .await?;
            moved.push((find_item(&txn, item_id).await?, movement));
        }

        let po_completed = po_lines(&txn, po.id)
            .await?
            .iter()
            .all(|l| l.remaining() == 0);
        let gr_status = if po_completed {
            GrStatus::Completed
        } else {
            GrStatus::Partial
        };
        header.status.ensure_transition(gr_status)?;
        let result = GoodsReceiptEntity::update_many()
            .set(goods_receipt::ActiveModel {
                status: Set(gr_status),
                ..Default::default()
            })
            .filter(goods_receipt::Column::Id.eq(gr_id))
            .filter(goods_receipt::Column::Status.eq(GrStatus::Pending))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        ensure_swapped(result.rows_affected, gr_id, GrStatus::Pending)?;

        if po_completed {
            advance_purchase_order(
                &txn,
                &po,
                PoStatus::Completed,
                <purchase_order::ActiveModel as Default>::default(),
            )
            .await?;
        }

        txn.commit().await.map_err(|e| {
            error!("Failed to commit goods receipt {}: {}", gr_no, e);
            ServiceError::db_error(e)
        })?;

        slog::info!(self.logger, "goods receipt posted";
            "gr_id" => %gr_id,
            "gr_no" => %gr_no,
            "po_no" => %po.po_no,
            "status" => %gr_status,
            "lines" => items.len(),
            "actor" => actor);
        if po_completed {
            slog::info!(self.logger, "purchase order status changed";
                "po_id" => %po.id, "from" => %po.status, "to" => %PoStatus::Completed, "actor" => actor);
            self.event_sender
                .send_or_log(Event::PurchaseOrderStatusChanged {
                    po_id: po.id,
                    from: po.status.to_string(),
                    to: PoStatus::Completed.to_string(),
                })
                .await;
        }
        for (item, movement) in &moved {
            self.catalog.notify_movement(item, movement).await;
        }
        self.event_sender
            .send_or_log(Event::GoodsReceiptPosted {
                gr_id,
                po_id: po.id,
                po_completed,
            })
            .await;

        info!(%gr_id, po_completed, "Goods receipt committed");
        Ok(GoodsReceiptView {
            goods_receipt: goods_receipt::Model {
                status: gr_status,
                ..header
            },
            items,
            po_completed,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<GoodsReceiptView, ServiceError> {
        let db = &*self.db_pool;
        let goods_receipt = GoodsReceiptEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Goods receipt {} not found", id)))?;
        let items = receipt_lines(db, id).await?;
        let po_completed = goods_receipt.status == GrStatus::Completed;
        Ok(GoodsReceiptView {
            goods_receipt,
            items,
            po_completed,
        })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        po_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<goods_receipt::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = GoodsReceiptEntity::find();
        if let Some(po_id) = po_id {
            query = query.filter(goods_receipt::Column::PoId.eq(po_id));
        }
        let paginator = query
            .order_by_desc(goods_receipt::Column::CreatedAt)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((rows, total))
    }

    pub async fn all(&self) -> Result<Vec<goods_receipt::Model>, ServiceError> {
        GoodsReceiptEntity::find()
            .order_by_asc(goods_receipt::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

async fn receipt_lines<C: ConnectionTrait>(
    conn: &C,
    gr_id: Uuid,
) -> Result<Vec<goods_receipt_item::Model>, ServiceError> {
    GoodsReceiptItemEntity::find()
        .filter(goods_receipt_item::Column::GrId.eq(gr_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;

    fn order_line(item_id: Uuid, ordered: i32, received: i32) -> purchase_order_item::Model {
        purchase_order_item::Model {
            id: Uuid::new_v4(),
            po_id: Uuid::nil(),
            item_id,
            unit: "box".into(),
            qty_ordered: ordered,
            qty_received: received,
            unit_price: Decimal::ONE,
            discount: Decimal::ZERO,
        }
    }

    fn receive(item_id: Uuid, qty: i32) -> ReceiptLineInput {
        ReceiptLineInput {
            item_id,
            qty_received: qty,
        }
    }

    #[test]
    fn repeated_items_are_merged() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_lines(&[receive(a, 2), receive(b, 1), receive(a, 3)]).unwrap();
        assert_eq!(merged, vec![(a, 5), (b, 1)]);
    }

    #[test]
    fn merged_quantity_overflow_is_a_validation_error() {
        let a = Uuid::new_v4();
        assert_matches!(
            merge_lines(&[receive(a, i32::MAX), receive(a, i32::MAX)]),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn exact_remaining_is_accepted() {
        let a = Uuid::new_v4();
        let lines = [order_line(a, 10, 4)];
        assert!(over_receipts(&[(a, 6)], &lines).is_empty());
    }

    #[test]
    fn every_violating_line_is_reported() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let lines = [order_line(a, 10, 4), order_line(b, 5, 0), order_line(c, 3, 3)];
        let violations = over_receipts(&[(a, 7), (b, 5), (c, 1)], &lines);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].item_id, a);
        assert_eq!(violations[0].remaining(), 6);
        assert_eq!(violations[1].item_id, c);
        assert_eq!(violations[1].remaining(), 0);
    }
}
