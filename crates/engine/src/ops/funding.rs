//! Treasury-backed operations: top-up, bonus and spend.
//!
//! Each one resolves the owner's wallet (creating it on first use) and the
//! treasury wallet of the currency, then runs a single [`Engine::transfer`]
//! between them.

use uuid::Uuid;

use crate::{
    EngineError, FundingCmd, ResultEngine, TransactionType, TransferCmd, TransferOutcome,
    TransferRecord, Wallet, transactions::normalize_idempotency_key,
};

use super::{
    Engine, ensure_positive_amount,
    ledger::{find_by_idempotency_key, find_transfer},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    FromTreasury,
    ToTreasury,
}

/// Result of a top-up, bonus or spend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundingOutcome {
    pub outcome: TransferOutcome,
    /// The owner's wallet as it is after the operation.
    pub wallet: Wallet,
}

impl Engine {
    /// Credit the owner from the treasury (`top_up`).
    pub async fn top_up(&self, cmd: FundingCmd) -> ResultEngine<FundingOutcome> {
        self.fund(cmd, Direction::FromTreasury, TransactionType::TopUp)
            .await
    }

    /// Credit the owner from the treasury (`bonus`).
    pub async fn bonus(&self, cmd: FundingCmd) -> ResultEngine<FundingOutcome> {
        self.fund(cmd, Direction::FromTreasury, TransactionType::Bonus)
            .await
    }

    /// Debit the owner back into the treasury (`spend`).
    pub async fn spend(&self, cmd: FundingCmd) -> ResultEngine<FundingOutcome> {
        self.fund(cmd, Direction::ToTreasury, TransactionType::Spend)
            .await
    }

    async fn fund(
        &self,
        cmd: FundingCmd,
        direction: Direction,
        transaction_type: TransactionType,
    ) -> ResultEngine<FundingOutcome> {
        let FundingCmd {
            owner_id,
            currency_type_id,
            idempotency_key,
            amount,
        } = cmd;

        ensure_positive_amount(amount)?;
        let idempotency_key = normalize_idempotency_key(&idempotency_key)?;

        // Pre-flight replay check. The transfer repeats it under lock.
        if let Some(existing) = find_by_idempotency_key(&self.database, &idempotency_key).await? {
            let record = find_transfer(&self.database, &existing.reference_id.to_string()).await?;
            let wallet = self.owner_wallet_of(&record, owner_id).await?;
            tracing::info!(
                idempotency_key = %record.idempotency_key,
                %transaction_type,
                "request already processed"
            );
            return Ok(FundingOutcome {
                outcome: TransferOutcome::Replayed(record),
                wallet,
            });
        }

        let treasury = self.system_wallet(currency_type_id).await?;
        let wallet = self
            .resolve_or_create_wallet(owner_id, currency_type_id)
            .await?;

        let (from, to) = match direction {
            Direction::FromTreasury => (treasury.id, wallet.id),
            Direction::ToTreasury => (wallet.id, treasury.id),
        };
        let outcome = self
            .transfer(
                TransferCmd::new(from, to, currency_type_id, idempotency_key, amount)
                    .transaction_type(transaction_type),
            )
            .await?;
        let wallet = self.wallet(wallet.id).await?;

        Ok(FundingOutcome { outcome, wallet })
    }

    /// The leg of `record` that belongs to `owner_id`, as a fresh wallet read.
    async fn owner_wallet_of(
        &self,
        record: &TransferRecord,
        owner_id: Uuid,
    ) -> ResultEngine<Wallet> {
        for wallet_id in [record.credit.wallet_id, record.debit.wallet_id] {
            let wallet = self.wallet(wallet_id).await?;
            if wallet.owner_id == owner_id {
                return Ok(wallet);
            }
        }
        Err(EngineError::InvalidOperation(
            "idempotency key belongs to another owner".to_string(),
        ))
    }
}
