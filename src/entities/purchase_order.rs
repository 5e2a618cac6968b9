use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PoStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "purchase_orders")]
#[schema(as = PurchaseOrder)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub po_no: String,
    pub rfq_id: Uuid,
    pub quotation_id: Uuid,
    pub supplier_name: String,
    pub status: PoStatus,
    pub currency: String,
    /// Rate applied to the subtotal; zero when the quotation carries no VAT
    #[sea_orm(column_type = "Decimal(Some((6, 4)))")]
    pub vat_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub vat_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub grand_total: Decimal,
    pub note: Option<String>,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_order_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::po_attachment::Entity")]
    Attachments,
    #[sea_orm(has_many = "super::goods_receipt::Entity")]
    GoodsReceipts,
    #[sea_orm(
        belongs_to = "super::quotation::Entity",
        from = "Column::QuotationId",
        to = "super::quotation::Column::Id"
    )]
    Quotation,
}

impl Related<super::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::po_attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::goods_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GoodsReceipts.def()
    }
}

impl Related<super::quotation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quotation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
