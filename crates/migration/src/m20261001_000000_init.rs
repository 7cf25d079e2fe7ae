//! Initial schema of the wallet ledger.
//!
//! - `users`: identities, including the single `system` user owning the treasuries
//! - `currency_types`: registry of currencies
//! - `wallets`: one balance per (owner, currency), one treasury per currency
//! - `wallet_transactions`: append-only double-entry ledger

use sea_orm_migration::{prelude::*, sea_orm::ConnectionTrait};

/// At most one `system` user and one `system` wallet per currency.
/// Partial unique indexes in raw SQL; SQLite and Postgres share the syntax.
const SYSTEM_OWNER_INDEXES: [&str; 2] = [
    r#"CREATE UNIQUE INDEX IF NOT EXISTS "uidx-users-system" ON "users" ("role") WHERE "role" = 'system'"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS "uidx-wallets-system-currency_type_id" ON "wallets" ("currency_type_id") WHERE "owner_type" = 'system'"#,
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CurrencyTypes {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    OwnerType,
    OwnerId,
    CurrencyTypeId,
    Balance,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum WalletTransactions {
    Table,
    Id,
    WalletId,
    TransactionType,
    Amount,
    BalanceAfter,
    ReferenceId,
    IdempotencyKey,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
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
            .create_table(
                Table::create()
                    .table(CurrencyTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CurrencyTypes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CurrencyTypes::Name).string_len(50).not_null())
                    .col(
                        ColumnDef::new(CurrencyTypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CurrencyTypes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-currency_types-name")
                    .table(CurrencyTypes::Table)
                    .col(CurrencyTypes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Wallets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Wallets::OwnerType).string_len(16).not_null())
                    .col(ColumnDef::new(Wallets::OwnerId).string().not_null())
                    .col(ColumnDef::new(Wallets::CurrencyTypeId).string().not_null())
                    .col(
                        ColumnDef::new(Wallets::Balance)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Wallets::Balance).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Wallets::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Wallets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallets-currency_type_id")
                            .from(Wallets::Table, Wallets::CurrencyTypeId)
                            .to(CurrencyTypes::Table, CurrencyTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One wallet per owner and currency. Lazy creation relies on this to
        // detect a concurrent insert.
        manager
            .create_index(
                Index::create()
                    .name("uidx-wallets-owner_type-owner_id-currency_type_id")
                    .table(Wallets::Table)
                    .col(Wallets::OwnerType)
                    .col(Wallets::OwnerId)
                    .col(Wallets::CurrencyTypeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WalletTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::WalletId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::ReferenceId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::IdempotencyKey)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_transactions-wallet_id")
                            .from(WalletTransactions::Table, WalletTransactions::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-wallet_transactions-wallet_id-idempotency_key")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::WalletId)
                    .col(WalletTransactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        for sql in SYSTEM_OWNER_INDEXES {
            db.execute_unprepared(sql).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WalletTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CurrencyTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
