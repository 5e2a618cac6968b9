use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_item_catalog::Migration),
            Box::new(m20240601_000002_create_requisition_tables::Migration),
            Box::new(m20240601_000003_create_purchase_order_tables::Migration),
        ]
    }
}

mod m20240601_000001_create_item_catalog {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_item_catalog"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Items::Category).string_len(32).not_null())
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(
                            ColumnDef::new(Items::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Items::Unit).string_len(32).not_null())
                        .col(ColumnDef::new(Items::Location).string().not_null())
                        .col(ColumnDef::new(Items::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Items::IsDeleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Items::ImageUrl).string().null())
                        .col(ColumnDef::new(Items::MinQuantity).integer().null())
                        .col(ColumnDef::new(Items::MaxQuantity).integer().null())
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_category")
                        .table(Items::Table)
                        .col(Items::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MedicineDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MedicineDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MedicineDetails::GenericName).string().null())
                        .col(ColumnDef::new(MedicineDetails::DosageForm).string().null())
                        .col(ColumnDef::new(MedicineDetails::Strength).string().null())
                        .col(ColumnDef::new(MedicineDetails::LotNo).string().null())
                        .col(ColumnDef::new(MedicineDetails::ExpiryDate).date().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_medicine_details_item_id")
                                .from(MedicineDetails::Table, MedicineDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MedsupDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MedsupDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MedsupDetails::SupplyType).string().null())
                        .col(ColumnDef::new(MedsupDetails::Specification).string().null())
                        .col(ColumnDef::new(MedsupDetails::LotNo).string().null())
                        .col(ColumnDef::new(MedsupDetails::ExpiryDate).date().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_medsup_details_item_id")
                                .from(MedsupDetails::Table, MedsupDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EquipmentDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EquipmentDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EquipmentDetails::Brand).string().null())
                        .col(ColumnDef::new(EquipmentDetails::ModelName).string().null())
                        .col(ColumnDef::new(EquipmentDetails::SerialNo).string().null())
                        .col(ColumnDef::new(EquipmentDetails::WarrantyUntil).date().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_equipment_details_item_id")
                                .from(EquipmentDetails::Table, EquipmentDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MeddeviceDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MeddeviceDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MeddeviceDetails::DeviceType).string().null())
                        .col(ColumnDef::new(MeddeviceDetails::Brand).string().null())
                        .col(ColumnDef::new(MeddeviceDetails::ModelName).string().null())
                        .col(ColumnDef::new(MeddeviceDetails::SerialNo).string().null())
                        .col(
                            ColumnDef::new(MeddeviceDetails::CalibrationDue)
                                .date()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_meddevice_details_item_id")
                                .from(MeddeviceDetails::Table, MeddeviceDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GeneralDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GeneralDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GeneralDetails::Description).text().null())
                        .col(ColumnDef::new(GeneralDetails::Brand).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_general_details_item_id")
                                .from(GeneralDetails::Table, GeneralDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(StockMovements::BalanceAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Reference).string().null())
                        .col(ColumnDef::new(StockMovements::Note).string().null())
                        .col(ColumnDef::new(StockMovements::CreatedBy).string().not_null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_movements_item_id")
                                .from(StockMovements::Table, StockMovements::ItemId)
                                .to(Items::Table, Items::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_item_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::ItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GeneralDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MeddeviceDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(EquipmentDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MedsupDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MedicineDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Items {
        Table,
        Id,
        Category,
        Name,
        Quantity,
        Unit,
        Location,
        Status,
        IsDeleted,
        ImageUrl,
        MinQuantity,
        MaxQuantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum MedicineDetails {
        Table,
        ItemId,
        GenericName,
        DosageForm,
        Strength,
        LotNo,
        ExpiryDate,
    }

    #[derive(DeriveIden)]
    enum MedsupDetails {
        Table,
        ItemId,
        SupplyType,
        Specification,
        LotNo,
        ExpiryDate,
    }

    #[derive(DeriveIden)]
    enum EquipmentDetails {
        Table,
        ItemId,
        Brand,
        ModelName,
        SerialNo,
        WarrantyUntil,
    }

    #[derive(DeriveIden)]
    enum MeddeviceDetails {
        Table,
        ItemId,
        DeviceType,
        Brand,
        ModelName,
        SerialNo,
        CalibrationDue,
    }

    #[derive(DeriveIden)]
    enum GeneralDetails {
        Table,
        ItemId,
        Description,
        Brand,
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        ItemId,
        MovementType,
        Quantity,
        BalanceAfter,
        Reference,
        Note,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240601_000002_create_requisition_tables {
    use super::m20240601_000001_create_item_catalog::Items;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_requisition_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseRequisitions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseRequisitions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitions::PrNo)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitions::RequesterId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitions::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseRequisitions::Note).text().null())
                        .col(
                            ColumnDef::new(PurchaseRequisitions::ApprovedBy)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitions::DecidedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitions::DecisionNote)
                                .text()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_requisitions_status")
                        .table(PurchaseRequisitions::Table)
                        .col(PurchaseRequisitions::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseRequisitionItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseRequisitionItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitionItems::PrId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitionItems::ItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitionItems::RequestedQty)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequisitionItems::Unit)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseRequisitionItems::Note).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pr_items_pr_id")
                                .from(
                                    PurchaseRequisitionItems::Table,
                                    PurchaseRequisitionItems::PrId,
                                )
                                .to(PurchaseRequisitions::Table, PurchaseRequisitions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pr_items_item_id")
                                .from(
                                    PurchaseRequisitionItems::Table,
                                    PurchaseRequisitionItems::ItemId,
                                )
                                .to(Items::Table, Items::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Rfqs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Rfqs::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Rfqs::RfqNo)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        // one RFQ per requisition
                        .col(ColumnDef::new(Rfqs::PrId).uuid().not_null().unique_key())
                        .col(ColumnDef::new(Rfqs::CreatedBy).string().not_null())
                        .col(ColumnDef::new(Rfqs::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Rfqs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Rfqs::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_rfqs_pr_id")
                                .from(Rfqs::Table, Rfqs::PrId)
                                .to(PurchaseRequisitions::Table, PurchaseRequisitions::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RfqItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(RfqItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(RfqItems::RfqId).uuid().not_null())
                        .col(ColumnDef::new(RfqItems::ItemId).uuid().not_null())
                        .col(ColumnDef::new(RfqItems::Qty).integer().not_null())
                        .col(ColumnDef::new(RfqItems::Unit).string_len(32).not_null())
                        .col(ColumnDef::new(RfqItems::Remark).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_rfq_items_rfq_id")
                                .from(RfqItems::Table, RfqItems::RfqId)
                                .to(Rfqs::Table, Rfqs::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_rfq_items_item_id")
                                .from(RfqItems::Table, RfqItems::ItemId)
                                .to(Items::Table, Items::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Quotations::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Quotations::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Quotations::QuoteNo)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Quotations::RfqId).uuid().not_null())
                        .col(ColumnDef::new(Quotations::SupplierName).string().not_null())
                        .col(ColumnDef::new(Quotations::SupplierContact).string().null())
                        .col(ColumnDef::new(Quotations::QuoteDate).date().not_null())
                        .col(ColumnDef::new(Quotations::ValidUntil).date().null())
                        .col(ColumnDef::new(Quotations::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(Quotations::VatIncluded)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Quotations::TotalBeforeVat)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Quotations::VatAmount)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Quotations::TotalAfterVat)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Quotations::PaymentTerms).string().null())
                        .col(ColumnDef::new(Quotations::DeliveryTerms).string().null())
                        .col(
                            ColumnDef::new(Quotations::IsSelected)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Quotations::CreatedBy).string().not_null())
                        .col(
                            ColumnDef::new(Quotations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotations_rfq_id")
                                .from(Quotations::Table, Quotations::RfqId)
                                .to(Rfqs::Table, Rfqs::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quotations_rfq_id")
                        .table(Quotations::Table)
                        .col(Quotations::RfqId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Quotations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RfqItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Rfqs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseRequisitionItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseRequisitions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseRequisitions {
        Table,
        Id,
        PrNo,
        RequesterId,
        Status,
        Note,
        ApprovedBy,
        DecidedAt,
        DecisionNote,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseRequisitionItems {
        Table,
        Id,
        PrId,
        ItemId,
        RequestedQty,
        Unit,
        Note,
    }

    #[derive(DeriveIden)]
    pub(super) enum Rfqs {
        Table,
        Id,
        RfqNo,
        PrId,
        CreatedBy,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum RfqItems {
        Table,
        Id,
        RfqId,
        ItemId,
        Qty,
        Unit,
        Remark,
    }

    #[derive(DeriveIden)]
    pub(super) enum Quotations {
        Table,
        Id,
        QuoteNo,
        RfqId,
        SupplierName,
        SupplierContact,
        QuoteDate,
        ValidUntil,
        Currency,
        VatIncluded,
        TotalBeforeVat,
        VatAmount,
        TotalAfterVat,
        PaymentTerms,
        DeliveryTerms,
        IsSelected,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240601_000003_create_purchase_order_tables {
    use super::m20240601_000001_create_item_catalog::Items;
    use super::m20240601_000002_create_requisition_tables::{Quotations, Rfqs};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_purchase_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::PoNo)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::RfqId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::QuotationId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::SupplierName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Currency)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::VatRate)
                                .decimal_len(6, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Subtotal)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::VatAmount)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::GrandTotal)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Note).text().null())
                        .col(ColumnDef::new(PurchaseOrders::CreatedBy).string().not_null())
                        .col(ColumnDef::new(PurchaseOrders::ApprovedBy).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_rfq_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::RfqId)
                                .to(Rfqs::Table, Rfqs::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_quotation_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::QuotationId)
                                .to(Quotations::Table, Quotations::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_status")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderItems::PoId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrderItems::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Unit)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::QtyOrdered)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::QtyReceived)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::UnitPrice)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Discount)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .check(
                            Expr::col(PurchaseOrderItems::QtyReceived)
                                .lte(Expr::col(PurchaseOrderItems::QtyOrdered)),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_po_items_po_id")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::PoId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_po_items_item_id")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::ItemId)
                                .to(Items::Table, Items::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_po_items_po_item")
                        .table(PurchaseOrderItems::Table)
                        .col(PurchaseOrderItems::PoId)
                        .col(PurchaseOrderItems::ItemId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PoAttachments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PoAttachments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PoAttachments::PoId).uuid().not_null())
                        .col(
                            ColumnDef::new(PoAttachments::AttachmentType)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PoAttachments::FileName).string().not_null())
                        .col(ColumnDef::new(PoAttachments::FileUrl).text().not_null())
                        .col(ColumnDef::new(PoAttachments::UploadedBy).string().not_null())
                        .col(
                            ColumnDef::new(PoAttachments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_po_attachments_po_id")
                                .from(PoAttachments::Table, PoAttachments::PoId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceipts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceipts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceipts::GrNo)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(GoodsReceipts::PoId).uuid().not_null())
                        .col(ColumnDef::new(GoodsReceipts::GrDate).date().not_null())
                        .col(ColumnDef::new(GoodsReceipts::DeliveryNote).string().null())
                        .col(ColumnDef::new(GoodsReceipts::Vendor).string().not_null())
                        .col(
                            ColumnDef::new(GoodsReceipts::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceipts::ReceivedBy).string().not_null())
                        .col(ColumnDef::new(GoodsReceipts::Note).text().null())
                        .col(
                            ColumnDef::new(GoodsReceipts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_goods_receipts_po_id")
                                .from(GoodsReceipts::Table, GoodsReceipts::PoId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceiptItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceiptItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceiptItems::GrId).uuid().not_null())
                        .col(ColumnDef::new(GoodsReceiptItems::PoItemId).uuid().not_null())
                        .col(ColumnDef::new(GoodsReceiptItems::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(GoodsReceiptItems::QtyReceived)
                                .integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_gr_items_gr_id")
                                .from(GoodsReceiptItems::Table, GoodsReceiptItems::GrId)
                                .to(GoodsReceipts::Table, GoodsReceipts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_gr_items_po_item_id")
                                .from(GoodsReceiptItems::Table, GoodsReceiptItems::PoItemId)
                                .to(PurchaseOrderItems::Table, PurchaseOrderItems::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GoodsReceiptItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GoodsReceipts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PoAttachments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        PoNo,
        RfqId,
        QuotationId,
        SupplierName,
        Status,
        Currency,
        VatRate,
        Subtotal,
        VatAmount,
        GrandTotal,
        Note,
        CreatedBy,
        ApprovedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderItems {
        Table,
        Id,
        PoId,
        ItemId,
        Unit,
        QtyOrdered,
        QtyReceived,
        UnitPrice,
        Discount,
    }

    #[derive(DeriveIden)]
    enum PoAttachments {
        Table,
        Id,
        PoId,
        AttachmentType,
        FileName,
        FileUrl,
        UploadedBy,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum GoodsReceipts {
        Table,
        Id,
        GrNo,
        PoId,
        GrDate,
        DeliveryNote,
        Vendor,
        Status,
        ReceivedBy,
        Note,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum GoodsReceiptItems {
        Table,
        Id,
        GrId,
        PoItemId,
        ItemId,
        QtyReceived,
    }
}
