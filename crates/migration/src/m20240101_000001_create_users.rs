//! Create `users` with one column per profile/account field.
//!
//! Username and email carry unique indexes; the transaction list is a JSON array column.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn text(col: Users) -> ColumnDef {
    ColumnDef::new(col).text().not_null().default("").to_owned()
}

fn money(col: Users) -> ColumnDef {
    ColumnDef::new(col).double().not_null().default(0.0).to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).text().not_null().unique_key())
                    .col(ColumnDef::new(Users::Password).text().not_null())
                    .col(ColumnDef::new(Users::Email).text().not_null().unique_key())
                    .col(text(Users::Fullname))
                    .col(text(Users::FirstName))
                    .col(text(Users::LastName))
                    .col(text(Users::Phone))
                    .col(text(Users::Dob))
                    .col(text(Users::Address))
                    .col(text(Users::City))
                    .col(text(Users::State))
                    .col(text(Users::Zip))
                    .col(text(Users::Country))
                    .col(text(Users::Ssn))
                    .col(text(Users::AccountType))
                    .col(text(Users::AccountNumber))
                    .col(text(Users::RoutingNumber))
                    .col(money(Users::Balance))
                    .col(money(Users::CheckingBalance))
                    .col(money(Users::SavingsBalance))
                    .col(ColumnDef::new(Users::Transactions).json_binary().not_null())
                    .col(ColumnDef::new(Users::Marketing).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::Status).text().not_null().default("active"))
                    .col(text(Users::TaxCode))
                    .col(text(Users::StatusReason))
                    .col(text(Users::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    Email,
    Fullname,
    FirstName,
    LastName,
    Phone,
    Dob,
    Address,
    City,
    State,
    Zip,
    Country,
    Ssn,
    AccountType,
    AccountNumber,
    RoutingNumber,
    Balance,
    CheckingBalance,
    SavingsBalance,
    Transactions,
    Marketing,
    Status,
    TaxCode,
    StatusReason,
    CreatedAt,
}
