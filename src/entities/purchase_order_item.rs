use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One line per catalog item per purchase order; `qty_received <= qty_ordered` always.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "purchase_order_items")]
#[schema(as = PurchaseOrderItem)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub po_id: Uuid,
    pub item_id: Uuid,
    pub unit: String,
    pub qty_ordered: i32,
    pub qty_received: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub discount: Decimal,
}

impl Model {
    pub fn remaining(&self) -> i32 {
        self.qty_ordered - self.qty_received
    }

    /// `max(qty * unit_price - discount, 0)`, `None` when it overflows.
    pub fn line_total(&self) -> Option<Decimal> {
        Decimal::from(self.qty_ordered)
            .checked_mul(self.unit_price)?
            .checked_sub(self.discount)
            .map(|total| total.max(Decimal::ZERO))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PoId",
        to = "super::purchase_order::Column::Id",
        on_delete = "Cascade"
    )]
    PurchaseOrder,
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
