use chrono::{DateTime, Utc};
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
pub enum RfqStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "awarded")]
    Awarded,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Request for quotation, created from exactly one approved requisition.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "rfqs")]
#[schema(as = Rfq)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub rfq_no: String,
    #[sea_orm(unique)]
    pub pr_id: Uuid,
    pub created_by: String,
    pub status: RfqStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_requisition::Entity",
        from = "Column::PrId",
        to = "super::purchase_requisition::Column::Id"
    )]
    PurchaseRequisition,
    #[sea_orm(has_many = "super::rfq_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::quotation::Entity")]
    Quotations,
}

impl Related<super::purchase_requisition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseRequisition.def()
    }
}

impl Related<super::rfq_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::quotation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quotations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
