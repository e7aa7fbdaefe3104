//! Create the off-chain `properties` metadata table
//!
//! One row per tokenized property contract. `contract_address` is stored
//! lowercased and is the join key against the on-chain registry.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Properties::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Properties::ContractAddress)
                            .string_len(42)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Properties::Name).string_len(255).null())
                    .col(ColumnDef::new(Properties::Description).text().null())
                    .col(ColumnDef::new(Properties::City).string_len(128).null())
                    .col(ColumnDef::new(Properties::Country).string_len(128).null())
                    .col(ColumnDef::new(Properties::StreetAddress).string_len(255).null())
                    .col(ColumnDef::new(Properties::PropertyType).small_integer().null())
                    .col(
                        ColumnDef::new(Properties::Details)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{\"schema_version\":1}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Properties::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Properties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        db.execute_unprepared(
            r#"
            CREATE OR REPLACE FUNCTION update_properties_updated_at()
            RETURNS TRIGGER AS $$
            BEGIN
                NEW.updated_at = NOW();
                RETURN NEW;
            END;
            $$ LANGUAGE plpgsql;
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            DROP TRIGGER IF EXISTS trigger_properties_updated_at ON properties;
            CREATE TRIGGER trigger_properties_updated_at
                BEFORE UPDATE ON properties
                FOR EACH ROW
                EXECUTE FUNCTION update_properties_updated_at();
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TRIGGER IF EXISTS trigger_properties_updated_at ON properties;")
            .await?;
        db.execute_unprepared("DROP FUNCTION IF EXISTS update_properties_updated_at();")
            .await?;

        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Properties {
    Table,
    Id,
    ContractAddress,
    Name,
    Description,
    City,
    Country,
    StreetAddress,
    PropertyType,
    Details,
    CreatedAt,
    UpdatedAt,
}
