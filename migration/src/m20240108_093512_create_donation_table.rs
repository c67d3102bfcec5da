use entity::donation;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(donation::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(donation::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(donation::Column::SevaSlug)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(donation::Column::SevaName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(donation::Column::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(donation::Column::FullName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(donation::Column::Email)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(donation::Column::Phone)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(donation::Column::Address).text().null())
                    .col(ColumnDef::new(donation::Column::Message).text().null())
                    .col(ColumnDef::new(donation::Column::TaxId).string_len(32).null())
                    .col(ColumnDef::new(donation::Column::Country).string_len(64).null())
                    .col(ColumnDef::new(donation::Column::OrderId).string_len(64).null())
                    .col(
                        ColumnDef::new(donation::Column::PaymentId)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(donation::Column::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending".to_owned()),
                    )
                    .col(
                        ColumnDef::new(donation::Column::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(donation::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(donation::Column::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_donations_order_id")
                    .col(donation::Column::OrderId)
                    .table(donation::Entity)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_donations_order_id")
                    .table(donation::Entity)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(donation::Entity).to_owned())
            .await
    }
}
