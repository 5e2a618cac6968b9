use crate::{
    db::DbPool,
    entities::{
        purchase_requisition::{self, PrStatus},
        quotation::{self, Entity as QuotationEntity},
        rfq::{self, Entity as RfqEntity, RfqStatus},
        rfq_item::{self, Entity as RfqItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        lifecycle::{ensure_swapped, Lifecycle},
        numbering::{next_document_number, DocumentKind},
        requisitions::{self, find_requisition, requisition_lines},
    },
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use slog::Logger;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RfqView {
    #[serde(flatten)]
    pub rfq: rfq::Model,
    pub items: Vec<rfq_item::Model>,
    pub quotations: Vec<quotation::Model>,
}

#[derive(Clone)]
pub struct RfqService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl RfqService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// Creates an RFQ from an approved requisition, copying every line, and
    /// marks the requisition processed in the same transaction.
    #[instrument(skip(self))]
    pub async fn create_from_requisition(
        &self,
        pr_id: Uuid,
        actor: &str,
    ) -> Result<RfqView, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let requisition = find_requisition(&txn, pr_id).await?;
        if requisition.status != PrStatus::Approved {
            return Err(ServiceError::InvalidStatus(format!(
                "purchase requisition {} is {}, an RFQ needs an approved requisition",
                requisition.pr_no, requisition.status
            )));
        }

        let swapped = requisitions::swap_status(
            &txn,
            pr_id,
            PrStatus::Approved,
            purchase_requisition::ActiveModel {
                status: Set(PrStatus::Processed),
                updated_at: Set(Utc::now()),
                ..Default::default()
            },
        )
        .await?;
        ensure_swapped(swapped, pr_id, PrStatus::Approved)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let created = rfq::ActiveModel {
            id: Set(id),
            rfq_no: Set(next_document_number(DocumentKind::Rfq)),
            pr_id: Set(pr_id),
            created_by: Set(actor.to_string()),
            status: Set(RfqStatus::Created),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!("Failed to create RFQ for requisition {}: {}", pr_id, e);
            ServiceError::db_error(e)
        })?;

        let mut items = Vec::new();
        for line in requisition_lines(&txn, pr_id).await? {
            let row = rfq_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                rfq_id: Set(id),
                item_id: Set(line.item_id),
                qty: Set(line.requested_qty),
                unit: Set(line.unit),
                remark: Set(line.note),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(row);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "rfq created";
            "rfq_id" => %id, "rfq_no" => %created.rfq_no, "pr_no" => %requisition.pr_no, "actor" => actor);
        slog::info!(self.logger, "requisition status changed";
            "pr_id" => %pr_id, "from" => %PrStatus::Approved, "to" => %PrStatus::Processed, "actor" => actor);
        self.event_sender
            .send_or_log(Event::RfqCreated { rfq_id: id, pr_id })
            .await;
        self.event_sender
            .send_or_log(Event::RequisitionStatusChanged {
                pr_id,
                from: PrStatus::Approved.to_string(),
                to: PrStatus::Processed.to_string(),
            })
            .await;

        Ok(RfqView {
            rfq: created,
            items,
            quotations: Vec::new(),
        })
    }

    pub async fn open(&self, id: Uuid, actor: &str) -> Result<RfqView, ServiceError> {
        self.transition(id, RfqStatus::Open, actor).await
    }

    pub async fn close(&self, id: Uuid, actor: &str) -> Result<RfqView, ServiceError> {
        self.transition(id, RfqStatus::Closed, actor).await
    }

    pub async fn cancel(&self, id: Uuid, actor: &str) -> Result<RfqView, ServiceError> {
        self.transition(id, RfqStatus::Cancelled, actor).await
    }

    #[instrument(skip(self))]
    async fn transition(
        &self,
        id: Uuid,
        next: RfqStatus,
        actor: &str,
    ) -> Result<RfqView, ServiceError> {
        let db = &*self.db_pool;
        let current = find_rfq(db, id).await?;
        let from = advance(db, &current, next).await?;

        slog::info!(self.logger, "rfq status changed";
            "rfq_id" => %id, "from" => %from, "to" => %next, "actor" => actor);
        self.event_sender
            .send_or_log(Event::RfqStatusChanged {
                rfq_id: id,
                from: from.to_string(),
                to: next.to_string(),
            })
            .await;

        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<RfqView, ServiceError> {
        let db = &*self.db_pool;
        let rfq = find_rfq(db, id).await?;
        let items = rfq_lines(db, id).await?;
        let quotations = QuotationEntity::find()
            .filter(quotation::Column::RfqId.eq(id))
            .order_by_asc(quotation::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(RfqView {
            rfq,
            items,
            quotations,
        })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<RfqStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<rfq::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = RfqEntity::find();
        if let Some(status) = status {
            query = query.filter(rfq::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(rfq::Column::CreatedAt)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((rows, total))
    }

    pub async fn all(&self) -> Result<Vec<rfq::Model>, ServiceError> {
        RfqEntity::find()
            .order_by_asc(rfq::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

pub(crate) async fn find_rfq<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<rfq::Model, ServiceError> {
    RfqEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("RFQ {} not found", id)))
}

pub(crate) async fn rfq_lines<C: ConnectionTrait>(
    conn: &C,
    rfq_id: Uuid,
) -> Result<Vec<rfq_item::Model>, ServiceError> {
    RfqItemEntity::find()
        .filter(rfq_item::Column::RfqId.eq(rfq_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Moves `rfq` to `next` with a compare-and-set update and returns the
/// status it left.
pub(crate) async fn advance<C: ConnectionTrait>(
    conn: &C,
    rfq: &rfq::Model,
    next: RfqStatus,
) -> Result<RfqStatus, ServiceError> {
    rfq.status.ensure_transition(next)?;
    let result = RfqEntity::update_many()
        .set(rfq::ActiveModel {
            status: Set(next),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(rfq::Column::Id.eq(rfq.id))
        .filter(rfq::Column::Status.eq(rfq.status))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;
    ensure_swapped(result.rows_affected, rfq.id, rfq.status)?;
    Ok(rfq.status)
}
