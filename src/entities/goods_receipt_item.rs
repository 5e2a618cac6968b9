use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "goods_receipt_items")]
#[schema(as = GoodsReceiptItem)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub gr_id: Uuid,
    pub po_item_id: Uuid,
    pub item_id: Uuid,
    pub qty_received: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goods_receipt::Entity",
        from = "Column::GrId",
        to = "super::goods_receipt::Column::Id",
        on_delete = "Cascade"
    )]
    GoodsReceipt,
    #[sea_orm(
        belongs_to = "super::purchase_order_item::Entity",
        from = "Column::PoItemId",
        to = "super::purchase_order_item::Column::Id"
    )]
    PurchaseOrderItem,
}

impl Related<super::goods_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GoodsReceipt.def()
    }
}

impl Related<super::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
