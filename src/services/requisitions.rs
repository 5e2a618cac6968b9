use crate::{
    db::DbPool,
    entities::{
        purchase_requisition::{self, Entity as RequisitionEntity, PrStatus},
        purchase_requisition_item::{self, Entity as RequisitionItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        catalog::find_item,
        lifecycle::{ensure_swapped, Lifecycle},
        numbering::{next_document_number, DocumentKind},
    },
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::{collections::HashSet, sync::Arc};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RequisitionLineInput {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub qty: i32,
    /// Defaults to the catalog item's unit
    #[validate(length(min = 1, max = 32))]
    pub unit: Option<String>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRequisitionInput {
    #[validate(length(min = 1))]
    pub lines: Vec<RequisitionLineInput>,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
    /// Keep the requisition in `draft` instead of submitting it
    #[serde(default)]
    pub as_draft: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Validate, ToSchema)]
pub struct DecisionInput {
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RequisitionView {
    #[serde(flatten)]
    pub requisition: purchase_requisition::Model,
    pub items: Vec<purchase_requisition_item::Model>,
}

#[derive(Clone)]
pub struct RequisitionService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl RequisitionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// Creates a requisition with its lines. Catalog quantities are untouched.
    #[instrument(skip(self, input), fields(lines = input.lines.len()))]
    pub async fn create(
        &self,
        requester_id: &str,
        input: CreateRequisitionInput,
    ) -> Result<RequisitionView, ServiceError> {
        input.validate()?;
        let mut seen = HashSet::new();
        for line in &input.lines {
            line.validate()?;
            if !seen.insert(line.item_id) {
                return Err(ServiceError::ValidationError(format!(
                    "item {} appears more than once",
                    line.item_id
                )));
            }
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        let status = if input.as_draft {
            PrStatus::Draft
        } else {
            PrStatus::Submitted
        };

        let requisition = purchase_requisition::ActiveModel {
            id: Set(id),
            pr_no: Set(next_document_number(DocumentKind::Requisition)),
            requester_id: Set(requester_id.to_string()),
            status: Set(status),
            note: Set(input.note),
            approved_by: Set(None),
            decided_at: Set(None),
            decision_note: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!("Failed to create purchase requisition: {}", e);
            ServiceError::db_error(e)
        })?;

        let mut items = Vec::with_capacity(input.lines.len());
        for line in input.lines {
            let item = find_item(&txn, line.item_id).await?;
            let row = purchase_requisition_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                pr_id: Set(id),
                item_id: Set(item.id),
                requested_qty: Set(line.qty),
                unit: Set(line.unit.unwrap_or(item.unit)),
                note: Set(line.note),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(row);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "requisition created";
            "pr_id" => %id, "pr_no" => &requisition.pr_no, "status" => %status, "actor" => requester_id);
        self.event_sender
            .send_or_log(Event::RequisitionCreated(id))
            .await;

        Ok(RequisitionView { requisition, items })
    }

    pub async fn submit(&self, id: Uuid, actor: &str) -> Result<RequisitionView, ServiceError> {
        self.transition(id, PrStatus::Submitted, actor, None).await
    }

    pub async fn cancel(&self, id: Uuid, actor: &str) -> Result<RequisitionView, ServiceError> {
        self.transition(id, PrStatus::Canceled, actor, None).await
    }

    pub async fn approve(
        &self,
        id: Uuid,
        actor: &str,
        input: DecisionInput,
    ) -> Result<RequisitionView, ServiceError> {
        input.validate()?;
        self.transition(id, PrStatus::Approved, actor, input.note)
            .await
    }

    pub async fn reject(
        &self,
        id: Uuid,
        actor: &str,
        input: DecisionInput,
    ) -> Result<RequisitionView, ServiceError> {
        input.validate()?;
        self.transition(id, PrStatus::Rejected, actor, input.note)
            .await
    }

    #[instrument(skip(self, note))]
    async fn transition(
        &self,
        id: Uuid,
        next: PrStatus,
        actor: &str,
        note: Option<String>,
    ) -> Result<RequisitionView, ServiceError> {
        let db = &*self.db_pool;
        let current = find_requisition(db, id).await?;
        current.status.ensure_transition(next)?;

        let now = Utc::now();
        let mut changes = purchase_requisition::ActiveModel {
            status: Set(next),
            updated_at: Set(now),
            ..Default::default()
        };
        if matches!(next, PrStatus::Approved | PrStatus::Rejected) {
            changes.approved_by = Set(Some(actor.to_string()));
            changes.decided_at = Set(Some(now));
            changes.decision_note = Set(note);
        }

        let result = swap_status(db, id, current.status, changes).await?;
        ensure_swapped(result, id, current.status)?;

        slog::info!(self.logger, "requisition status changed";
            "pr_id" => %id, "from" => %current.status, "to" => %next, "actor" => actor);
        self.event_sender
            .send_or_log(Event::RequisitionStatusChanged {
                pr_id: id,
                from: current.status.to_string(),
                to: next.to_string(),
            })
            .await;

        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<RequisitionView, ServiceError> {
        let db = &*self.db_pool;
        let requisition = find_requisition(db, id).await?;
        let items = requisition_lines(db, id).await?;
        Ok(RequisitionView { requisition, items })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<PrStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<purchase_requisition::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = RequisitionEntity::find();
        if let Some(status) = status {
            query = query.filter(purchase_requisition::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(purchase_requisition::Column::CreatedAt)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(|e| {
            error!("Failed to count purchase requisitions: {}", e);
            ServiceError::db_error(e)
        })?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        info!(total, "Listed purchase requisitions");
        Ok((rows, total))
    }

    /// All requisitions, oldest first, for exports.
    pub async fn all(&self) -> Result<Vec<purchase_requisition::Model>, ServiceError> {
        RequisitionEntity::find()
            .order_by_asc(purchase_requisition::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

pub(crate) async fn find_requisition<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<purchase_requisition::Model, ServiceError> {
    RequisitionEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Purchase requisition {} not found", id)))
}

pub(crate) async fn requisition_lines<C: ConnectionTrait>(
    conn: &C,
    pr_id: Uuid,
) -> Result<Vec<purchase_requisition_item::Model>, ServiceError> {
    RequisitionItemEntity::find()
        .filter(purchase_requisition_item::Column::PrId.eq(pr_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// `UPDATE purchase_requisitions SET .. WHERE id = ? AND status = <expected>`,
/// returning the affected row count.
pub(crate) async fn swap_status<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    expected: PrStatus,
    changes: purchase_requisition::ActiveModel,
) -> Result<u64, ServiceError> {
    RequisitionEntity::update_many()
        .set(changes)
        .filter(purchase_requisition::Column::Id.eq(id))
        .filter(purchase_requisition::Column::Status.eq(expected))
        .exec(conn)
        .await
        .map(|r| r.rows_affected)
        .map_err(ServiceError::db_error)
}
