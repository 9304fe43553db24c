use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_products_table::Migration),
            Box::new(m20250601_000002_create_inventory_levels_table::Migration),
            Box::new(m20250601_000003_create_sales_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250601_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000001_create_products_table"
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
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string_len(200).not_null())
                        .col(
                            ColumnDef::new(Products::Category)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Cost).decimal().not_null())
                        .col(ColumnDef::new(Products::Price).decimal().not_null())
                        .col(
                            ColumnDef::new(Products::Supplier)
                                .string_len(120)
                                .not_null(),
                        )
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

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        Sku,
        Name,
        Category,
        Cost,
        Price,
        Supplier,
    }
}

mod m20250601_000002_create_inventory_levels_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000002_create_inventory_levels_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryLevels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryLevels::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::Sku)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::OnHand)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::ReorderPoint)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::LeadTimeDays)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryLevels::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum InventoryLevels {
        Table,
        Id,
        Sku,
        OnHand,
        ReorderPoint,
        LeadTimeDays,
    }
}

mod m20250601_000003_create_sales_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000003_create_sales_table"
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
                        .col(
                            ColumnDef::new(Sales::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Sales::Sku).string_len(64).not_null())
                        .col(ColumnDef::new(Sales::SoldOn).date().not_null())
                        .col(ColumnDef::new(Sales::Units).integer().not_null())
                        .col(ColumnDef::new(Sales::UnitPrice).decimal().not_null())
                        .to_owned(),
                )
                .await?;

            // One sale row per (sku, day); duplicate submissions are skipped at commit.
            manager
                .create_index(
                    Index::create()
                        .name("uq_sales_sku_sold_on")
                        .table(Sales::Table)
                        .col(Sales::Sku)
                        .col(Sales::SoldOn)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Sales {
        Table,
        Id,
        Sku,
        SoldOn,
        Units,
        UnitPrice,
    }
}
