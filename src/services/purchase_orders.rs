use crate::{
    db::DbPool,
    entities::{
        po_attachment::{self, AttachmentType, Entity as AttachmentEntity},
        purchase_order::{self, Entity as PurchaseOrderEntity, PoStatus},
        purchase_order_item::{self, Entity as PurchaseOrderItemEntity},
        quotation::{self, Entity as QuotationEntity},
        rfq::RfqStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        catalog::find_item,
        lifecycle::{ensure_swapped, Lifecycle},
        numbering::{next_document_number, DocumentKind},
        quotations::find_quotation,
        rfqs::{advance, find_rfq, rfq_lines},
    },
};
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::{collections::HashSet, sync::Arc};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderLineInput {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[validate(length(min = 1, max = 32))]
    pub unit: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderInput {
    pub quotation_id: Uuid,
    /// Carried forward from the RFQ at price zero when omitted
    pub lines: Option<Vec<PurchaseOrderLineInput>>,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct LinePricingInput {
    pub item_id: Uuid,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
}

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct AddAttachmentInput {
    pub attachment_type: AttachmentType,
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1, max = 2048))]
    pub file_url: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Totals {
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub grand_total: Decimal,
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `subtotal = Σ max(qty * unit_price - discount, 0)`, VAT on top of the subtotal.
///
/// Amounts too large for `Decimal` are a validation error.
pub fn compute_totals(
    lines: &[purchase_order_item::Model],
    vat_rate: Decimal,
) -> Result<Totals, ServiceError> {
    let overflow =
        || ServiceError::ValidationError("order amounts are too large to total".to_string());

    let mut subtotal = Decimal::ZERO;
    for line in lines {
        subtotal = line
            .line_total()
            .and_then(|total| subtotal.checked_add(total))
            .ok_or_else(overflow)?;
    }
    let subtotal = round2(subtotal);
    let vat_amount = round2(subtotal.checked_mul(vat_rate).ok_or_else(overflow)?);
    let grand_total = subtotal.checked_add(vat_amount).ok_or_else(overflow)?;
    Ok(Totals {
        subtotal,
        vat_amount,
        grand_total,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LineReceiptStatus {
    NotReceived,
    Partial,
    Received,
}

impl LineReceiptStatus {
    pub fn of(line: &purchase_order_item::Model) -> Self {
        if line.qty_received == 0 {
            LineReceiptStatus::NotReceived
        } else if line.qty_received < line.qty_ordered {
            LineReceiptStatus::Partial
        } else {
            LineReceiptStatus::Received
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReceiptLineStatus {
    pub po_item_id: Uuid,
    pub item_id: Uuid,
    pub unit: String,
    pub ordered: i32,
    pub received: i32,
    pub remaining: i32,
    pub status: LineReceiptStatus,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReceiptStatus {
    pub po_id: Uuid,
    pub po_no: String,
    pub status: PoStatus,
    pub fully_received: bool,
    pub lines: Vec<ReceiptLineStatus>,
    pub totals: Totals,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PurchaseOrderView {
    #[serde(flatten)]
    pub purchase_order: purchase_order::Model,
    pub items: Vec<purchase_order_item::Model>,
    pub attachments: Vec<po_attachment::Model>,
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
    vat_rate: Decimal,
}

impl PurchaseOrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        logger: Logger,
        vat_rate: Decimal,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
            vat_rate,
        }
    }

    /// Creates a draft purchase order from a quotation, selects the quotation
    /// and awards its RFQ, all in one transaction.
    #[instrument(skip(self, input), fields(quotation_id = %input.quotation_id))]
    pub async fn create_from_quotation(
        &self,
        input: CreatePurchaseOrderInput,
        actor: &str,
    ) -> Result<PurchaseOrderView, ServiceError> {
        input.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let quotation = find_quotation(&txn, input.quotation_id).await?;
        let rfq = find_rfq(&txn, quotation.rfq_id).await?;
        let rfq_from = rfq.status;
        match rfq.status {
            RfqStatus::Open => {
                advance(&txn, &rfq, RfqStatus::Closed).await?;
                let closed = find_rfq(&txn, rfq.id).await?;
                advance(&txn, &closed, RfqStatus::Awarded).await?;
            }
            RfqStatus::Closed => {
                advance(&txn, &rfq, RfqStatus::Awarded).await?;
            }
            other => {
                return Err(ServiceError::InvalidStatus(format!(
                    "RFQ {} is {}, a purchase order needs an open or closed RFQ",
                    rfq.rfq_no, other
                )))
            }
        }

        QuotationEntity::update_many()
            .col_expr(quotation::Column::IsSelected, Expr::value(true))
            .filter(quotation::Column::Id.eq(quotation.id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let id = Uuid::new_v4();
        let mut lines = Vec::new();
        match input.lines {
            Some(given) => {
                if given.is_empty() {
                    return Err(ServiceError::ValidationError(
                        "a purchase order needs at least one line".to_string(),
                    ));
                }
                let mut seen = HashSet::new();
                for line in given {
                    line.validate()?;
                    check_pricing(line.unit_price, line.discount)?;
                    if !seen.insert(line.item_id) {
                        return Err(ServiceError::ValidationError(format!(
                            "item {} appears more than once",
                            line.item_id
                        )));
                    }
                    let item = find_item(&txn, line.item_id).await?;
                    lines.push(purchase_order_item::Model {
                        id: Uuid::new_v4(),
                        po_id: id,
                        item_id: item.id,
                        unit: line.unit.unwrap_or(item.unit),
                        qty_ordered: line.quantity,
                        qty_received: 0,
                        unit_price: line.unit_price,
                        discount: line.discount,
                    });
                }
            }
            None => {
                for line in rfq_lines(&txn, rfq.id).await? {
                    match lines.iter_mut().find(|l| l.item_id == line.item_id) {
                        Some(existing) => {
                            existing.qty_ordered =
                                existing.qty_ordered.checked_add(line.qty).ok_or_else(|| {
                                    ServiceError::ValidationError(format!(
                                        "quantity for item {} is too large",
                                        line.item_id
                                    ))
                                })?
                        }
                        None => lines.push(purchase_order_item::Model {
                            id: Uuid::new_v4(),
                            po_id: id,
                            item_id: line.item_id,
                            unit: line.unit,
                            qty_ordered: line.qty,
                            qty_received: 0,
                            unit_price: Decimal::ZERO,
                            discount: Decimal::ZERO,
                        }),
                    }
                }
            }
        }

        let vat_rate = if quotation.vat_included {
            self.vat_rate
        } else {
            Decimal::ZERO
        };
        let totals = compute_totals(&lines, vat_rate)?;
        let now = Utc::now();

        let created = purchase_order::ActiveModel {
            id: Set(id),
            po_no: Set(next_document_number(DocumentKind::PurchaseOrder)),
            rfq_id: Set(rfq.id),
            quotation_id: Set(quotation.id),
            supplier_name: Set(quotation.supplier_name.clone()),
            status: Set(PoStatus::Draft),
            currency: Set(quotation.currency.clone()),
            vat_rate: Set(vat_rate),
            subtotal: Set(totals.subtotal),
            vat_amount: Set(totals.vat_amount),
            grand_total: Set(totals.grand_total),
            note: Set(input.note),
            created_by: Set(actor.to_string()),
            approved_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!("Failed to create purchase order: {}", e);
            ServiceError::db_error(e)
        })?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let row = line
                .into_active_model()
                .reset_all()
                .insert(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            items.push(row);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "purchase order created";
            "po_id" => %id,
            "po_no" => %created.po_no,
            "quotation_id" => %quotation.id,
            "grand_total" => %created.grand_total,
            "actor" => actor);
        slog::info!(self.logger, "rfq status changed";
            "rfq_id" => %rfq.id, "from" => %rfq_from, "to" => %RfqStatus::Awarded, "actor" => actor);
        self.event_sender
            .send_or_log(Event::RfqStatusChanged {
                rfq_id: rfq.id,
                from: rfq_from.to_string(),
                to: RfqStatus::Awarded.to_string(),
            })
            .await;
        self.event_sender
            .send_or_log(Event::PurchaseOrderCreated {
                po_id: id,
                quotation_id: quotation.id,
            })
            .await;

        Ok(PurchaseOrderView {
            purchase_order: created,
            items,
            attachments: Vec::new(),
        })
    }

    /// Reprices lines of a draft order and recomputes its totals.
    #[instrument(skip(self, lines))]
    pub async fn update_line_pricing(
        &self,
        po_id: Uuid,
        lines: Vec<LinePricingInput>,
        actor: &str,
    ) -> Result<PurchaseOrderView, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "no lines to update".to_string(),
            ));
        }
        for line in &lines {
            check_pricing(line.unit_price, line.discount)?;
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let po = find_purchase_order(&txn, po_id).await?;
        if po.status != PoStatus::Draft {
            return Err(ServiceError::InvalidStatus(format!(
                "purchase order {} is {}, pricing can only change while draft",
                po.po_no, po.status
            )));
        }

        for line in lines {
            let result = PurchaseOrderItemEntity::update_many()
                .col_expr(purchase_order_item::Column::UnitPrice, Expr::value(line.unit_price))
                .col_expr(purchase_order_item::Column::Discount, Expr::value(line.discount))
                .filter(purchase_order_item::Column::PoId.eq(po_id))
                .filter(purchase_order_item::Column::ItemId.eq(line.item_id))
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if result.rows_affected == 0 {
                return Err(ServiceError::NotFound(format!(
                    "item {} is not on purchase order {}",
                    line.item_id, po.po_no
                )));
            }
        }

        let totals = compute_totals(&po_lines(&txn, po_id).await?, po.vat_rate)?;
        let result = PurchaseOrderEntity::update_many()
            .set(purchase_order::ActiveModel {
                subtotal: Set(totals.subtotal),
                vat_amount: Set(totals.vat_amount),
                grand_total: Set(totals.grand_total),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(purchase_order::Column::Id.eq(po_id))
            .filter(purchase_order::Column::Status.eq(PoStatus::Draft))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        ensure_swapped(result.rows_affected, po_id, PoStatus::Draft)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "purchase order repriced";
            "po_id" => %po_id, "grand_total" => %totals.grand_total, "actor" => actor);
        self.get(po_id).await
    }

    pub async fn submit(&self, id: Uuid, actor: &str) -> Result<PurchaseOrderView, ServiceError> {
        self.transition(id, PoStatus::Submitted, actor).await
    }

    pub async fn approve(&self, id: Uuid, actor: &str) -> Result<PurchaseOrderView, ServiceError> {
        self.transition(id, PoStatus::Approved, actor).await
    }

    pub async fn cancel(&self, id: Uuid, actor: &str) -> Result<PurchaseOrderView, ServiceError> {
        self.transition(id, PoStatus::Canceled, actor).await
    }

    #[instrument(skip(self))]
    async fn transition(
        &self,
        id: Uuid,
        next: PoStatus,
        actor: &str,
    ) -> Result<PurchaseOrderView, ServiceError> {
        let db = &*self.db_pool;
        let current = find_purchase_order(db, id).await?;
        let mut changes = <purchase_order::ActiveModel as Default>::default();
        if next == PoStatus::Approved {
            changes.approved_by = Set(Some(actor.to_string()));
        }
        advance_purchase_order(db, &current, next, changes).await?;

        slog::info!(self.logger, "purchase order status changed";
            "po_id" => %id, "from" => %current.status, "to" => %next, "actor" => actor);
        self.event_sender
            .send_or_log(Event::PurchaseOrderStatusChanged {
                po_id: id,
                from: current.status.to_string(),
                to: next.to_string(),
            })
            .await;

        self.get(id).await
    }

    #[instrument(skip(self, input))]
    pub async fn add_attachment(
        &self,
        po_id: Uuid,
        input: AddAttachmentInput,
        actor: &str,
    ) -> Result<po_attachment::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        find_purchase_order(db, po_id).await?;

        let attachment = po_attachment::ActiveModel {
            id: Set(Uuid::new_v4()),
            po_id: Set(po_id),
            attachment_type: Set(input.attachment_type),
            file_name: Set(input.file_name),
            file_url: Set(input.file_url),
            uploaded_by: Set(actor.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(%po_id, attachment_type = %attachment.attachment_type, "Attachment added");
        Ok(attachment)
    }

    pub async fn list_attachments(
        &self,
        po_id: Uuid,
    ) -> Result<Vec<po_attachment::Model>, ServiceError> {
        let db = &*self.db_pool;
        find_purchase_order(db, po_id).await?;
        attachments(db, po_id).await
    }

    /// Per-line receipt progress recomputed from the order lines.
    #[instrument(skip(self))]
    pub async fn receipt_status(&self, po_id: Uuid) -> Result<ReceiptStatus, ServiceError> {
        let db = &*self.db_pool;
        let po = find_purchase_order(db, po_id).await?;
        let lines = po_lines(db, po_id).await?;
        let fully_received = lines.iter().all(|l| l.remaining() == 0);
        Ok(ReceiptStatus {
            po_id,
            po_no: po.po_no,
            status: po.status,
            fully_received,
            totals: Totals {
                subtotal: po.subtotal,
                vat_amount: po.vat_amount,
                grand_total: po.grand_total,
            },
            lines: lines
                .iter()
                .map(|l| ReceiptLineStatus {
                    po_item_id: l.id,
                    item_id: l.item_id,
                    unit: l.unit.clone(),
                    ordered: l.qty_ordered,
                    received: l.qty_received,
                    remaining: l.remaining(),
                    status: LineReceiptStatus::of(l),
                })
                .collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<PurchaseOrderView, ServiceError> {
        let db = &*self.db_pool;
        let purchase_order = find_purchase_order(db, id).await?;
        let items = po_lines(db, id).await?;
        let attachments = attachments(db, id).await?;
        Ok(PurchaseOrderView {
            purchase_order,
            items,
            attachments,
        })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<PoStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = PurchaseOrderEntity::find();
        if let Some(status) = status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(purchase_order::Column::CreatedAt)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((rows, total))
    }

    /// All purchase orders, oldest first, for exports.
    pub async fn all(&self) -> Result<Vec<purchase_order::Model>, ServiceError> {
        PurchaseOrderEntity::find()
            .order_by_asc(purchase_order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

fn check_pricing(unit_price: Decimal, discount: Decimal) -> Result<(), ServiceError> {
    if unit_price < Decimal::ZERO || discount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "unit_price and discount must not be negative".to_string(),
        ));
    }
    Ok(())
}

pub(crate) async fn find_purchase_order<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<purchase_order::Model, ServiceError> {
    PurchaseOrderEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))
}

pub(crate) async fn po_lines<C: ConnectionTrait>(
    conn: &C,
    po_id: Uuid,
) -> Result<Vec<purchase_order_item::Model>, ServiceError> {
    PurchaseOrderItemEntity::find()
        .filter(purchase_order_item::Column::PoId.eq(po_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

async fn attachments<C: ConnectionTrait>(
    conn: &C,
    po_id: Uuid,
) -> Result<Vec<po_attachment::Model>, ServiceError> {
    AttachmentEntity::find()
        .filter(po_attachment::Column::PoId.eq(po_id))
        .order_by_asc(po_attachment::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Compare-and-set status change; `changes` may carry extra columns.
pub(crate) async fn advance_purchase_order<C: ConnectionTrait>(
    conn: &C,
    po: &purchase_order::Model,
    next: PoStatus,
    mut changes: purchase_order::ActiveModel,
) -> Result<(), ServiceError> {
    po.status.ensure_transition(next)?;
    changes.status = Set(next);
    changes.updated_at = Set(Utc::now());
    let result = PurchaseOrderEntity::update_many()
        .set(changes)
        .filter(purchase_order::Column::Id.eq(po.id))
        .filter(purchase_order::Column::Status.eq(po.status))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;
    ensure_swapped(result.rows_affected, po.id, po.status)
}
