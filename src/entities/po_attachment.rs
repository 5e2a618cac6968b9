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
pub enum AttachmentType {
    #[sea_orm(string_value = "quotation")]
    Quotation,
    #[sea_orm(string_value = "delivery_note")]
    DeliveryNote,
    #[sea_orm(string_value = "tax_invoice")]
    TaxInvoice,
    #[sea_orm(string_value = "invoice")]
    Invoice,
    #[sea_orm(string_value = "payment_proof")]
    PaymentProof,
    #[sea_orm(string_value = "receipt")]
    Receipt,
    #[sea_orm(string_value = "contract")]
    Contract,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Reference to a document stored elsewhere; only metadata is kept here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "po_attachments")]
#[schema(as = PoAttachment)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub po_id: Uuid,
    pub attachment_type: AttachmentType,
    pub file_name: String,
    pub file_url: String,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
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
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
