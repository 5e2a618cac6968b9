use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalog category; doubles as the permission tag for item access.
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
    strum::EnumString,
    strum::AsRefStr,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemCategory {
    #[sea_orm(string_value = "medicine")]
    Medicine,
    #[sea_orm(string_value = "medsup")]
    Medsup,
    #[sea_orm(string_value = "equipment")]
    Equipment,
    #[sea_orm(string_value = "meddevice")]
    Meddevice,
    #[sea_orm(string_value = "general")]
    General,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
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
pub enum ItemStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

/// The `items` table: one row per catalog entry, detail lives in a per-category table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "items")]
#[schema(as = Item)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category: ItemCategory,
    pub name: String,
    /// On-hand quantity, never negative
    pub quantity: i32,
    pub unit: String,
    pub location: String,
    pub status: ItemStatus,
    pub is_deleted: bool,
    pub image_url: Option<String>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Low when a minimum is configured and on-hand quantity is below it.
    pub fn is_low_stock(&self) -> bool {
        self.min_quantity.is_some_and(|min| self.quantity < min)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::medicine_detail::Entity")]
    MedicineDetail,
    #[sea_orm(has_one = "super::medsup_detail::Entity")]
    MedsupDetail,
    #[sea_orm(has_one = "super::equipment_detail::Entity")]
    EquipmentDetail,
    #[sea_orm(has_one = "super::meddevice_detail::Entity")]
    MeddeviceDetail,
    #[sea_orm(has_one = "super::general_detail::Entity")]
    GeneralDetail,
    #[sea_orm(has_many = "super::stock_movement::Entity")]
    StockMovements,
}

impl Related<super::medicine_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MedicineDetail.def()
    }
}

impl Related<super::medsup_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MedsupDetail.def()
    }
}

impl Related<super::equipment_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EquipmentDetail.def()
    }
}

impl Related<super::meddevice_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeddeviceDetail.def()
    }
}

impl Related<super::general_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GeneralDetail.def()
    }
}

impl Related<super::stock_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
