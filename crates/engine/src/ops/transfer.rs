use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ResultEngine, TransactionType, TransferCmd, TransferOutcome, TransferRecord,
    Wallet, WalletTransaction, error::conflict_or_database,
    transactions::{self, normalize_idempotency_key},
    wallets,
};

use super::{
    Engine, ensure_positive_amount,
    ledger::{find_by_idempotency_key, find_transfer},
    lock_order,
};

/// Validated input of a single transfer.
struct TransferPlan {
    from_wallet_id: Uuid,
    to_wallet_id: Uuid,
    currency_type_id: Uuid,
    idempotency_key: String,
    amount: i64,
    transaction_type: TransactionType,
}

impl TryFrom<TransferCmd> for TransferPlan {
    type Error = EngineError;

    fn try_from(cmd: TransferCmd) -> Result<Self, Self::Error> {
        ensure_positive_amount(cmd.amount)?;
        if cmd.from_wallet_id == cmd.to_wallet_id {
            return Err(EngineError::InvalidOperation(
                "cannot transfer to the same wallet".to_string(),
            ));
        }
        if !cmd.transaction_type.is_credit() {
            return Err(EngineError::InvalidOperation(format!(
                "{} is not a valid credit transaction type",
                cmd.transaction_type
            )));
        }
        Ok(Self {
            from_wallet_id: cmd.from_wallet_id,
            to_wallet_id: cmd.to_wallet_id,
            currency_type_id: cmd.currency_type_id,
            idempotency_key: normalize_idempotency_key(&cmd.idempotency_key)?,
            amount: cmd.amount,
            transaction_type: cmd.transaction_type,
        })
    }
}

enum Step {
    Applied(TransferRecord),
    Replayed(TransferRecord),
}

impl Engine {
    /// Atomically move `cmd.amount` from one wallet to another.
    ///
    /// Inside one database transaction the engine:
    /// 1. write-locks both wallets in [`lock_order`] and re-reads them,
    /// 2. checks that both belong to `cmd.currency_type_id`,
    /// 3. checks the source balance covers the amount,
    /// 4. looks the idempotency key up again under the locks; a hit rolls back
    ///    and returns [`TransferOutcome::Replayed`],
    /// 5. appends a debit leg and a credit leg sharing a fresh reference id,
    /// 6. writes both new balances and commits.
    ///
    /// Any error rolls the whole transaction back. Dropping the returned future
    /// (e.g. on a request timeout) rolls back as well.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferOutcome> {
        let plan = TransferPlan::try_from(cmd)?;

        let db_tx = self.database.begin().await?;
        match apply_transfer(&db_tx, &plan).await {
            Ok(Step::Applied(record)) => {
                db_tx.commit().await?;
                tracing::info!(
                    reference_id = %record.reference_id,
                    from_wallet_id = %plan.from_wallet_id,
                    to_wallet_id = %plan.to_wallet_id,
                    amount = plan.amount,
                    transaction_type = %plan.transaction_type,
                    "transfer applied"
                );
                Ok(TransferOutcome::Applied(record))
            }
            Ok(Step::Replayed(record)) => {
                db_tx.rollback().await?;
                log_replay(&plan, &record);
                Ok(TransferOutcome::Replayed(record))
            }
            // A transfer with the same key on the same wallet committed between
            // our check and our insert.
            Err(EngineError::Conflict(_)) => {
                db_tx.rollback().await?;
                let existing = find_by_idempotency_key(&self.database, &plan.idempotency_key)
                    .await?
                    .ok_or_else(|| {
                        EngineError::KeyNotFound("transaction not exists".to_string())
                    })?;
                let record =
                    find_transfer(&self.database, &existing.reference_id.to_string()).await?;
                log_replay(&plan, &record);
                Ok(TransferOutcome::Replayed(record))
            }
            Err(err) => {
                if let EngineError::InsufficientFunds(reason) = &err {
                    tracing::warn!(
                        from_wallet_id = %plan.from_wallet_id,
                        amount = plan.amount,
                        "transfer rejected: {reason}"
                    );
                }
                db_tx.rollback().await?;
                Err(err)
            }
        }
    }
}

fn log_replay(plan: &TransferPlan, record: &TransferRecord) {
    let same_request = record.debit.wallet_id == plan.from_wallet_id
        && record.credit.wallet_id == plan.to_wallet_id
        && record.amount() == plan.amount;
    if same_request {
        tracing::info!(
            idempotency_key = %plan.idempotency_key,
            reference_id = %record.reference_id,
            "transfer replayed"
        );
    } else {
        tracing::warn!(
            idempotency_key = %plan.idempotency_key,
            reference_id = %record.reference_id,
            "idempotency key reused with different transfer parameters"
        );
    }
}

/// Lock every wallet in `ids` in canonical order and return them by id.
async fn lock_wallets(
    db_tx: &DatabaseTransaction,
    ids: &[Uuid],
) -> ResultEngine<HashMap<Uuid, Wallet>> {
    let mut locked = HashMap::with_capacity(ids.len());
    for id in lock_order(ids) {
        let model = wallets::Entity::find_by_id(id.to_string())
            .lock_exclusive()
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        locked.insert(id, Wallet::try_from(model)?);
    }
    Ok(locked)
}

async fn apply_transfer(db_tx: &DatabaseTransaction, plan: &TransferPlan) -> ResultEngine<Step> {
    let mut locked = lock_wallets(db_tx, &[plan.from_wallet_id, plan.to_wallet_id]).await?;
    let from = locked
        .remove(&plan.from_wallet_id)
        .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
    let to = locked
        .remove(&plan.to_wallet_id)
        .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;

    for wallet in [&from, &to] {
        if wallet.currency_type_id != plan.currency_type_id {
            return Err(EngineError::InvalidOperation(format!(
                "wallet {} does not hold currency {}",
                wallet.id, plan.currency_type_id
            )));
        }
    }

    if from.balance < plan.amount {
        return Err(EngineError::InsufficientFunds(format!(
            "wallet {} has {}, needs {}",
            from.id, from.balance, plan.amount
        )));
    }

    if let Some(existing) = find_by_idempotency_key(db_tx, &plan.idempotency_key).await? {
        let record = find_transfer(db_tx, &existing.reference_id.to_string()).await?;
        return Ok(Step::Replayed(record));
    }

    let from_balance = from.balance - plan.amount;
    let to_balance = to
        .balance
        .checked_add(plan.amount)
        .ok_or_else(|| EngineError::InvalidOperation("balance overflow".to_string()))?;

    let now = Utc::now();
    let reference_id = Uuid::new_v4();
    let debit = WalletTransaction::debit(
        from.id,
        plan.amount,
        from_balance,
        reference_id,
        &plan.idempotency_key,
        now,
    );
    let credit = WalletTransaction::credit(
        to.id,
        plan.transaction_type,
        plan.amount,
        to_balance,
        reference_id,
        &plan.idempotency_key,
        now,
    );
    for leg in [&debit, &credit] {
        transactions::ActiveModel::from(leg)
            .insert(db_tx)
            .await
            .map_err(|err| conflict_or_database(err, &plan.idempotency_key))?;
    }

    for (wallet, balance) in [(&from, from_balance), (&to, to_balance)] {
        let wallet_model = wallets::ActiveModel {
            id: ActiveValue::Set(wallet.id.to_string()),
            balance: ActiveValue::Set(balance),
            version: ActiveValue::Set(wallet.version + 1),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        wallet_model.update(db_tx).await?;
    }

    Ok(Step::Applied(TransferRecord {
        reference_id,
        idempotency_key: plan.idempotency_key.clone(),
        debit,
        credit,
    }))
}
