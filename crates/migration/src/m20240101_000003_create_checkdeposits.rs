//! Create `checkdeposits`; same layout as `moneyflow` plus check number and image.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Checkdeposits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Checkdeposits::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(Checkdeposits::Username).text().not_null().default(""))
                    .col(ColumnDef::new(Checkdeposits::Amount).double().not_null().default(0.0))
                    .col(ColumnDef::new(Checkdeposits::CheckNumber).text().not_null().default(""))
                    .col(ColumnDef::new(Checkdeposits::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Checkdeposits::Status).text().not_null().default("pending"))
                    .col(ColumnDef::new(Checkdeposits::Image).text().not_null().default(""))
                    .col(ColumnDef::new(Checkdeposits::Data).json_binary().not_null())
                    .col(ColumnDef::new(Checkdeposits::CreatedAt).text().not_null().default(""))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Checkdeposits::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Checkdeposits { Table, Id, Username, Amount, CheckNumber, Description, Status, Image, Data, CreatedAt }
