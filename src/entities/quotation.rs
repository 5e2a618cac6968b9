use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Supplier quotation against an RFQ. Amounts are recorded as quoted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "quotations")]
#[schema(as = Quotation)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub quote_no: String,
    pub rfq_id: Uuid,
    pub supplier_name: String,
    pub supplier_contact: Option<String>,
    pub quote_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub currency: String,
    pub vat_included: bool,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_before_vat: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub vat_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_after_vat: Decimal,
    pub payment_terms: Option<String>,
    pub delivery_terms: Option<String>,
    pub is_selected: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rfq::Entity",
        from = "Column::RfqId",
        to = "super::rfq::Column::Id"
    )]
    Rfq,
}

impl Related<super::rfq::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rfq.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
