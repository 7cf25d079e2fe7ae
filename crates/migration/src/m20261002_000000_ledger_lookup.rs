use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum WalletTransactions {
    Table,
    WalletId,
    ReferenceId,
    IdempotencyKey,
    CreatedAt,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Replay checks look a key up across every wallet.
        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-idempotency_key")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::IdempotencyKey)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-reference_id")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::ReferenceId)
                    .to_owned(),
            )
            .await?;

        // History pages.
        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-wallet_id-created_at-id")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::WalletId)
                    .col(WalletTransactions::CreatedAt)
                    .col(WalletTransactions::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx-wallet_transactions-wallet_id-created_at-id",
            "idx-wallet_transactions-reference_id",
            "idx-wallet_transactions-idempotency_key",
        ] {
            manager
                .drop_index(
                    Index::drop()
                        .name(name)
                        .table(WalletTransactions::Table)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}
