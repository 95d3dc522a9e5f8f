use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_suppliers_table::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_users_table::Migration),
            Box::new(m20240101_000004_create_clients_table::Migration),
            Box::new(m20240101_000005_create_sales_tables::Migration),
            Box::new(m20240101_000006_create_inventory_transactions_table::Migration),
            Box::new(m20240101_000007_create_sale_counters_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_suppliers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_suppliers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::CompanyName).string().null())
                        .col(ColumnDef::new(Suppliers::Document).string().null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(ColumnDef::new(Suppliers::Phone).string().null())
                        .col(ColumnDef::new(Suppliers::Address).json().not_null())
                        .col(ColumnDef::new(Suppliers::ContactPerson).json().not_null())
                        .col(ColumnDef::new(Suppliers::Categories).json().not_null())
                        .col(ColumnDef::new(Suppliers::PaymentTerms).string().null())
                        .col(
                            ColumnDef::new(Suppliers::MinOrderValue)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Suppliers::Observations).text().null())
                        .col(
                            ColumnDef::new(Suppliers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Suppliers::LastPurchase)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
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
                        .name("idx_suppliers_name")
                        .table(Suppliers::Table)
                        .col(Suppliers::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_suppliers_is_active")
                        .table(Suppliers::Table)
                        .col(Suppliers::IsActive)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        Name,
        CompanyName,
        Document,
        Email,
        Phone,
        Address,
        ContactPerson,
        Categories,
        PaymentTerms,
        MinOrderValue,
        Observations,
        IsActive,
        LastPurchase,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::Category).string().not_null())
                        .col(ColumnDef::new(Products::Price).decimal().not_null())
                        .col(ColumnDef::new(Products::CostPrice).decimal().not_null())
                        .col(
                            ColumnDef::new(Products::Stock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::MinStock)
                                .integer()
                                .not_null()
                                .default(5),
                        )
                        .col(ColumnDef::new(Products::Barcode).string().null())
                        .col(ColumnDef::new(Products::SupplierId).uuid().null())
                        .col(
                            ColumnDef::new(Products::ExpiryDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Products::Images).json().not_null())
                        .col(ColumnDef::new(Products::Flavors).json().not_null())
                        .col(ColumnDef::new(Products::Attributes).json().not_null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_supplier")
                                .from(Products::Table, Products::SupplierId)
                                .to(
                                    super::m20240101_000001_create_suppliers_table::Suppliers::Table,
                                    super::m20240101_000001_create_suppliers_table::Suppliers::Id,
                                )
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            // Barcode is unique when present (NULLs don't collide).
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_barcode")
                        .table(Products::Table)
                        .col(Products::Barcode)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category")
                        .table(Products::Table)
                        .col(Products::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_is_active")
                        .table(Products::Table)
                        .col(Products::IsActive)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        Description,
        Category,
        Price,
        CostPrice,
        Stock,
        MinStock,
        Barcode,
        SupplierId,
        ExpiryDate,
        IsActive,
        Images,
        Flavors,
        Attributes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::IsAdmin)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Users::Phone).string().null())
                        .col(
                            ColumnDef::new(Users::LastLogin)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
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
                        .name("idx_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Name,
        Email,
        PasswordHash,
        IsAdmin,
        Phone,
        LastLogin,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_clients_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_clients_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Clients::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Clients::Name).string().not_null())
                        .col(ColumnDef::new(Clients::Email).string().null())
                        .col(ColumnDef::new(Clients::Phone).string().null())
                        .col(ColumnDef::new(Clients::Address).json().not_null())
                        .col(ColumnDef::new(Clients::Document).string().null())
                        .col(
                            ColumnDef::new(Clients::Birthday)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Clients::Observations).text().null())
                        .col(
                            ColumnDef::new(Clients::LoyaltyPoints)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Clients::FavoriteCategory).string().null())
                        .col(ColumnDef::new(Clients::FavoriteProducts).json().not_null())
                        .col(
                            ColumnDef::new(Clients::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Clients::TotalPurchased)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Clients::LastPurchase)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Clients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Clients::UpdatedAt)
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
                        .name("idx_clients_name")
                        .table(Clients::Table)
                        .col(Clients::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_clients_is_active")
                        .table(Clients::Table)
                        .col(Clients::IsActive)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Clients {
        Table,
        Id,
        Name,
        Email,
        Phone,
        Address,
        Document,
        Birthday,
        Observations,
        LoyaltyPoints,
        FavoriteCategory,
        FavoriteProducts,
        IsActive,
        TotalPurchased,
        LastPurchase,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_sales_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Sales::SaleNumber).string().not_null())
                        .col(ColumnDef::new(Sales::ClientId).uuid().null())
                        .col(ColumnDef::new(Sales::Subtotal).decimal().not_null())
                        .col(
                            ColumnDef::new(Sales::Discount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Sales::Tax).decimal().not_null().default(0))
                        .col(ColumnDef::new(Sales::Total).decimal().not_null())
                        .col(ColumnDef::new(Sales::Profit).decimal().not_null())
                        .col(ColumnDef::new(Sales::PaymentMethod).string().not_null())
                        .col(ColumnDef::new(Sales::PaymentStatus).string().not_null())
                        .col(ColumnDef::new(Sales::Notes).text().null())
                        .col(ColumnDef::new(Sales::SellerId).uuid().not_null())
                        .col(
                            ColumnDef::new(Sales::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sales::UpdatedAt)
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
                        .name("idx_sales_sale_number")
                        .table(Sales::Table)
                        .col(Sales::SaleNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_client_id")
                        .table(Sales::Table)
                        .col(Sales::ClientId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_created_at")
                        .table(Sales::Table)
                        .col(Sales::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_payment_status")
                        .table(Sales::Table)
                        .col(Sales::PaymentStatus)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SaleItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SaleItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::Name).string().not_null())
                        .col(ColumnDef::new(SaleItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(SaleItems::Price).decimal().not_null())
                        .col(ColumnDef::new(SaleItems::CostPrice).decimal().not_null())
                        .col(
                            ColumnDef::new(SaleItems::Discount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(SaleItems::Total).decimal().not_null())
                        .col(
                            ColumnDef::new(SaleItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sale_items_sale")
                                .from(SaleItems::Table, SaleItems::SaleId)
                                .to(Sales::Table, Sales::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sale_items_sale_id")
                        .table(SaleItems::Table)
                        .col(SaleItems::SaleId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sale_items_product_id")
                        .table(SaleItems::Table)
                        .col(SaleItems::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Sales {
        Table,
        Id,
        SaleNumber,
        ClientId,
        Subtotal,
        Discount,
        Tax,
        Total,
        Profit,
        PaymentMethod,
        PaymentStatus,
        Notes,
        SellerId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum SaleItems {
        Table,
        Id,
        SaleId,
        ProductId,
        Name,
        Quantity,
        Price,
        CostPrice,
        Discount,
        Total,
        CreatedAt,
    }
}

mod m20240101_000006_create_inventory_transactions_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_inventory_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::Kind)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::PreviousStock)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::NewStock)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::CostPrice)
                                .decimal()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryTransactions::Reason).text().null())
                        .col(
                            ColumnDef::new(InventoryTransactions::ReferenceKind)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ReferenceId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::UserId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::CreatedAt)
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
                        .name("idx_inventory_transactions_product_id")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_reference")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::ReferenceKind)
                        .col(InventoryTransactions::ReferenceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_created_at")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(InventoryTransactions::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryTransactions {
        Table,
        Id,
        ProductId,
        Kind,
        Quantity,
        PreviousStock,
        NewStock,
        CostPrice,
        Reason,
        ReferenceKind,
        ReferenceId,
        UserId,
        CreatedAt,
    }
}

mod m20240101_000007_create_sale_counters_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_sale_counters_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SaleCounters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SaleCounters::Id)
                                .integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SaleCounters::CurrentValue)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            // Seed the single counter row so sale creation can always
            // find-and-bump it.
            let insert = Query::insert()
                .into_table(SaleCounters::Table)
                .columns([SaleCounters::Id, SaleCounters::CurrentValue])
                .values_panic([1.into(), 0.into()])
                .to_owned();
            manager.exec_stmt(insert).await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleCounters::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum SaleCounters {
        Table,
        Id,
        CurrentValue,
    }
}
