//! Create `moneyflow`; fields without a column are kept in the `data` JSON object.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Moneyflow::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Moneyflow::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(Moneyflow::Username).text().not_null().default(""))
                    .col(ColumnDef::new(Moneyflow::Type).text().not_null().default(""))
                    .col(ColumnDef::new(Moneyflow::Amount).double().not_null().default(0.0))
                    .col(ColumnDef::new(Moneyflow::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Moneyflow::Status).text().not_null().default("pending"))
                    .col(ColumnDef::new(Moneyflow::Data).json_binary().not_null())
                    .col(ColumnDef::new(Moneyflow::CreatedAt).text().not_null().default(""))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Moneyflow::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Moneyflow { Table, Id, Username, Type, Amount, Description, Status, Data, CreatedAt }
