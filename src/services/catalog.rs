use crate::{
    db::DbPool,
    entities::{
        equipment_detail, general_detail,
        item::{self, Entity as ItemEntity, ItemCategory, ItemStatus},
        meddevice_detail, medicine_detail, medsup_detail,
        stock_movement::{self, Entity as StockMovementEntity, MovementType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Category specific attributes of an item.
///
/// The variant decides the item's category; there is no separate category
/// field to keep in sync.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "category", content = "attributes", rename_all = "snake_case")]
pub enum ItemDetail {
    Medicine(medicine_detail::Model),
    Medsup(medsup_detail::Model),
    Equipment(equipment_detail::Model),
    Meddevice(meddevice_detail::Model),
    General(general_detail::Model),
}

impl ItemDetail {
    pub fn category(&self) -> ItemCategory {
        match self {
            ItemDetail::Medicine(_) => ItemCategory::Medicine,
            ItemDetail::Medsup(_) => ItemCategory::Medsup,
            ItemDetail::Equipment(_) => ItemCategory::Equipment,
            ItemDetail::Meddevice(_) => ItemCategory::Meddevice,
            ItemDetail::General(_) => ItemCategory::General,
        }
    }

    fn for_item(mut self, item_id: Uuid) -> Self {
        match &mut self {
            ItemDetail::Medicine(d) => d.item_id = item_id,
            ItemDetail::Medsup(d) => d.item_id = item_id,
            ItemDetail::Equipment(d) => d.item_id = item_id,
            ItemDetail::Meddevice(d) => d.item_id = item_id,
            ItemDetail::General(d) => d.item_id = item_id,
        }
        self
    }

    /// Replaces the detail row of this variant's table.
    async fn write<C: ConnectionTrait>(self, conn: &C, item_id: Uuid) -> Result<(), sea_orm::DbErr> {
        match self.for_item(item_id) {
            ItemDetail::Medicine(d) => {
                medicine_detail::Entity::delete_by_id(item_id).exec(conn).await?;
                d.into_active_model().reset_all().insert(conn).await?;
            }
            ItemDetail::Medsup(d) => {
                medsup_detail::Entity::delete_by_id(item_id).exec(conn).await?;
                d.into_active_model().reset_all().insert(conn).await?;
            }
            ItemDetail::Equipment(d) => {
                equipment_detail::Entity::delete_by_id(item_id).exec(conn).await?;
                d.into_active_model().reset_all().insert(conn).await?;
            }
            ItemDetail::Meddevice(d) => {
                meddevice_detail::Entity::delete_by_id(item_id).exec(conn).await?;
                d.into_active_model().reset_all().insert(conn).await?;
            }
            ItemDetail::General(d) => {
                general_detail::Entity::delete_by_id(item_id).exec(conn).await?;
                d.into_active_model().reset_all().insert(conn).await?;
            }
        }
        Ok(())
    }

    /// Reads the single detail table selected by `category`.
    async fn read<C: ConnectionTrait>(
        conn: &C,
        item_id: Uuid,
        category: ItemCategory,
    ) -> Result<Option<ItemDetail>, sea_orm::DbErr> {
        Ok(match category {
            ItemCategory::Medicine => medicine_detail::Entity::find_by_id(item_id)
                .one(conn)
                .await?
                .map(ItemDetail::Medicine),
            ItemCategory::Medsup => medsup_detail::Entity::find_by_id(item_id)
                .one(conn)
                .await?
                .map(ItemDetail::Medsup),
            ItemCategory::Equipment => equipment_detail::Entity::find_by_id(item_id)
                .one(conn)
                .await?
                .map(ItemDetail::Equipment),
            ItemCategory::Meddevice => meddevice_detail::Entity::find_by_id(item_id)
                .one(conn)
                .await?
                .map(ItemDetail::Meddevice),
            ItemCategory::General => general_detail::Entity::find_by_id(item_id)
                .one(conn)
                .await?
                .map(ItemDetail::General),
        })
    }
}

/// Item with its derived low-stock flag and, for single reads, its detail.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: item::Model,
    pub low_stock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ItemDetail>,
}

impl ItemView {
    fn new(item: item::Model, detail: Option<ItemDetail>) -> Self {
        Self {
            low_stock: item.is_low_stock(),
            item,
            detail,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub unit: String,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    /// Opening balance, recorded as a stock-in movement when positive
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub min_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub max_quantity: Option<i32>,
    pub image_url: Option<String>,
    pub detail: ItemDetail,
}

#[derive(Clone, Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub unit: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    pub status: Option<ItemStatus>,
    pub image_url: Option<String>,
    #[validate(range(min = 0))]
    pub min_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub max_quantity: Option<i32>,
    /// Must be the same variant as the item's category
    pub detail: Option<ItemDetail>,
}

#[derive(Clone, Debug, Default)]
pub struct ItemFilter {
    pub category: Option<ItemCategory>,
    pub search: Option<String>,
    pub low_stock: bool,
    /// Categories the caller may see; `None` means unrestricted
    pub visible_categories: Option<Vec<ItemCategory>>,
}

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct StockMovementInput {
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(max = 64))]
    pub reference: Option<String>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// Item catalog and stock ledger.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_item(
        &self,
        input: CreateItemInput,
        actor: &str,
    ) -> Result<ItemView, ServiceError> {
        input.validate()?;
        check_min_max(input.min_quantity, input.max_quantity)?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        let category = input.detail.category();

        let created = item::ActiveModel {
            id: Set(id),
            category: Set(category),
            name: Set(input.name.trim().to_string()),
            quantity: Set(0),
            unit: Set(input.unit),
            location: Set(input.location),
            status: Set(ItemStatus::Active),
            is_deleted: Set(false),
            image_url: Set(input.image_url),
            min_quantity: Set(input.min_quantity),
            max_quantity: Set(input.max_quantity),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!("Failed to create item: {}", e);
            ServiceError::db_error(e)
        })?;

        input
            .detail
            .clone()
            .write(&txn, id)
            .await
            .map_err(ServiceError::db_error)?;

        let created = if input.quantity > 0 {
            apply_movement(
                &txn,
                id,
                MovementType::In,
                input.quantity,
                None,
                Some("opening balance".to_string()),
                actor,
            )
            .await?;
            find_item(&txn, id).await?
        } else {
            created
        };

        txn.commit().await.map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "item created";
            "item_id" => %id, "category" => %category, "actor" => actor);
        self.event_sender.send_or_log(Event::ItemCreated(id)).await;

        Ok(ItemView::new(created, Some(input.detail.for_item(id))))
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: Uuid) -> Result<ItemView, ServiceError> {
        let db = &*self.db_pool;
        let item = find_item(db, id).await?;
        let detail = ItemDetail::read(db, id, item.category)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(ItemView::new(item, detail))
    }

    /// Category of a live item; used by handlers for per-item permission checks.
    pub async fn item_category(&self, id: Uuid) -> Result<ItemCategory, ServiceError> {
        Ok(find_item(&*self.db_pool, id).await?.category)
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        filter: ItemFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ItemView>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = ItemEntity::find().filter(item::Column::IsDeleted.eq(false));

        if let Some(category) = filter.category {
            query = query.filter(item::Column::Category.eq(category));
        }
        if let Some(visible) = filter.visible_categories {
            query = query.filter(item::Column::Category.is_in(visible));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                query = query.filter(item::Column::Name.contains(search));
            }
        }
        if filter.low_stock {
            query = query.filter(
                Expr::col(item::Column::MinQuantity)
                    .is_not_null()
                    .and(Expr::col(item::Column::Quantity).lt(Expr::col(item::Column::MinQuantity))),
            );
        }

        let paginator = query
            .order_by_asc(item::Column::Name)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((
            items.into_iter().map(|i| ItemView::new(i, None)).collect(),
            total,
        ))
    }

    /// All live items, unpaginated, for exports.
    pub async fn all_items(
        &self,
        visible_categories: Option<Vec<ItemCategory>>,
    ) -> Result<Vec<item::Model>, ServiceError> {
        let mut query = ItemEntity::find().filter(item::Column::IsDeleted.eq(false));
        if let Some(visible) = visible_categories {
            query = query.filter(item::Column::Category.is_in(visible));
        }
        query
            .order_by_asc(item::Column::Category)
            .order_by_asc(item::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        id: Uuid,
        input: UpdateItemInput,
    ) -> Result<ItemView, ServiceError> {
        input.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let existing = find_item(&txn, id).await?;

        if let Some(detail) = &input.detail {
            if detail.category() != existing.category {
                return Err(ServiceError::ValidationError(format!(
                    "item category is {} and cannot be changed to {}",
                    existing.category,
                    detail.category()
                )));
            }
        }
        check_min_max(
            input.min_quantity.or(existing.min_quantity),
            input.max_quantity.or(existing.max_quantity),
        )?;

        let mut active: item::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(location) = input.location {
            active.location = Set(location);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if input.image_url.is_some() {
            active.image_url = Set(input.image_url);
        }
        if input.min_quantity.is_some() {
            active.min_quantity = Set(input.min_quantity);
        }
        if input.max_quantity.is_some() {
            active.max_quantity = Set(input.max_quantity);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await.map_err(|e| {
            error!("Failed to update item {}: {}", id, e);
            ServiceError::db_error(e)
        })?;

        if let Some(detail) = input.detail {
            detail.write(&txn, id).await.map_err(ServiceError::db_error)?;
        }
        let detail = ItemDetail::read(&txn, id, updated.category)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(item_id = %id, "Item updated");
        Ok(ItemView::new(updated, detail))
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: Uuid, actor: &str) -> Result<(), ServiceError> {
        let result = ItemEntity::update_many()
            .col_expr(item::Column::IsDeleted, Expr::value(true))
            .col_expr(item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(item::Column::Id.eq(id))
            .filter(item::Column::IsDeleted.eq(false))
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Item {} not found", id)));
        }

        slog::info!(self.logger, "item soft-deleted"; "item_id" => %id, "actor" => actor);
        self.event_sender.send_or_log(Event::ItemDeleted(id)).await;
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn stock_in(
        &self,
        id: Uuid,
        input: StockMovementInput,
        actor: &str,
    ) -> Result<stock_movement::Model, ServiceError> {
        self.move_stock(id, MovementType::In, input, actor).await
    }

    #[instrument(skip(self, input))]
    pub async fn stock_out(
        &self,
        id: Uuid,
        input: StockMovementInput,
        actor: &str,
    ) -> Result<stock_movement::Model, ServiceError> {
        self.move_stock(id, MovementType::Out, input, actor).await
    }

    async fn move_stock(
        &self,
        id: Uuid,
        movement_type: MovementType,
        input: StockMovementInput,
        actor: &str,
    ) -> Result<stock_movement::Model, ServiceError> {
        input.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let movement = apply_movement(
            &txn,
            id,
            movement_type,
            input.quantity,
            input.reference,
            input.note,
            actor,
        )
        .await?;
        let item = find_item(&txn, id).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "stock moved";
            "item_id" => %id,
            "movement" => %movement_type,
            "quantity" => movement.quantity,
            "balance_after" => movement.balance_after,
            "actor" => actor);
        self.notify_movement(&item, &movement).await;
        Ok(movement)
    }

    pub(crate) async fn notify_movement(
        &self,
        item: &item::Model,
        movement: &stock_movement::Model,
    ) {
        let delta = match movement.movement_type {
            MovementType::In => movement.quantity,
            MovementType::Out => -movement.quantity,
        };
        self.event_sender
            .send_or_log(Event::StockMoved {
                item_id: item.id,
                delta,
                balance_after: movement.balance_after,
                reference: movement.reference.clone(),
            })
            .await;

        if let (true, Some(min_quantity)) = (item.is_low_stock(), item.min_quantity) {
            warn!(item_id = %item.id, quantity = item.quantity, min_quantity, "Low stock");
            self.event_sender
                .send_or_log(Event::LowStock {
                    item_id: item.id,
                    quantity: item.quantity,
                    min_quantity,
                })
                .await;
        }
    }

    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        item_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = StockMovementEntity::find();
        if let Some(item_id) = item_id {
            query = query.filter(stock_movement::Column::ItemId.eq(item_id));
        }
        let paginator = query
            .order_by_desc(stock_movement::Column::CreatedAt)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((rows, total))
    }

    /// Every movement joined with its item, oldest first, for exports.
    pub async fn all_movements(
        &self,
    ) -> Result<Vec<(stock_movement::Model, Option<item::Model>)>, ServiceError> {
        StockMovementEntity::find()
            .find_also_related(ItemEntity)
            .order_by_asc(stock_movement::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

fn check_min_max(min: Option<i32>, max: Option<i32>) -> Result<(), ServiceError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(ServiceError::ValidationError(format!(
            "min_quantity {} exceeds max_quantity {}",
            min, max
        ))),
        _ => Ok(()),
    }
}

/// Loads a live (not soft-deleted) item.
pub(crate) async fn find_item<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<item::Model, ServiceError> {
    ItemEntity::find_by_id(id)
        .filter(item::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", id)))
}

/// Changes `items.quantity` with a bounded update and appends the ledger row.
///
/// Must run inside the caller's transaction so the balance read back belongs
/// to this movement.
pub(crate) async fn apply_movement<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    movement_type: MovementType,
    quantity: i32,
    reference: Option<String>,
    note: Option<String>,
    actor: &str,
) -> Result<stock_movement::Model, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "quantity must be at least 1".to_string(),
        ));
    }

    let now = Utc::now();
    let mut update = ItemEntity::update_many()
        .col_expr(item::Column::UpdatedAt, Expr::value(now))
        .filter(item::Column::Id.eq(item_id))
        .filter(item::Column::IsDeleted.eq(false));

    update = match movement_type {
        MovementType::In => update
            .col_expr(
                item::Column::Quantity,
                Expr::col(item::Column::Quantity).add(quantity),
            )
            .filter(item::Column::Quantity.lte(i32::MAX - quantity)),
        MovementType::Out => update
            .col_expr(
                item::Column::Quantity,
                Expr::col(item::Column::Quantity).sub(quantity),
            )
            .filter(item::Column::Quantity.gte(quantity)),
    };

    let result = update.exec(conn).await.map_err(ServiceError::db_error)?;
    if result.rows_affected == 0 {
        let item = find_item(conn, item_id).await?;
        return Err(match movement_type {
            MovementType::In => ServiceError::ValidationError(format!(
                "item {} has {} {} on hand, receiving {} more exceeds the storable quantity",
                item_id, item.quantity, item.unit, quantity
            )),
            MovementType::Out => ServiceError::InsufficientStock(format!(
                "item {} has {} {} on hand, cannot issue {}",
                item_id, item.quantity, item.unit, quantity
            )),
        });
    }

    let balance_after = find_item(conn, item_id).await?.quantity;

    stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        item_id: Set(item_id),
        movement_type: Set(movement_type),
        quantity: Set(quantity),
        balance_after: Set(balance_after),
        reference: Set(reference),
        note: Set(note),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(|e| {
        error!("Failed to record stock movement for {}: {}", item_id, e);
        ServiceError::db_error(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_variant_decides_category() {
        let detail: ItemDetail = serde_json::from_value(serde_json::json!({
            "category": "equipment",
            "attributes": { "brand": "Philips", "serial_no": "SN-1" }
        }))
        .unwrap();
        assert_eq!(detail.category(), ItemCategory::Equipment);
        let ItemDetail::Equipment(eq) = detail.clone().for_item(Uuid::nil()) else {
            panic!("expected equipment detail");
        };
        assert_eq!(eq.brand.as_deref(), Some("Philips"));
        assert!(eq.model_name.is_none());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let parsed = serde_json::from_value::<ItemDetail>(serde_json::json!({
            "category": "vehicle",
            "attributes": {}
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn min_above_max_is_invalid() {
        assert!(check_min_max(Some(10), Some(5)).is_err());
        assert!(check_min_max(Some(5), Some(5)).is_ok());
        assert!(check_min_max(None, Some(5)).is_ok());
    }
}
