//! Ledger primitives.
//!
//! A [`WalletTransaction`] is one leg of a transfer: a signed change applied to
//! a single wallet, together with the wallet balance right after the change.
//! Every transfer writes exactly two legs (a debit on the source, a credit on
//! the destination) sharing one `reference_id` and one `idempotency_key`, so
//! the amounts of a transfer always sum to zero.
//!
//! Legs are append-only: once written they are never updated or deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

const MAX_IDEMPOTENCY_KEY_LEN: usize = 64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[default]
    TopUp,
    Debit,
    Spend,
    Bonus,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopUp => "top_up",
            Self::Debit => "debit",
            Self::Spend => "spend",
            Self::Bonus => "bonus",
        }
    }

    /// Whether this type may tag the credit leg of a transfer.
    ///
    /// `debit` is reserved for the source leg.
    pub fn is_credit(self) -> bool {
        !matches!(self, Self::Debit)
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "top_up" => Ok(Self::TopUp),
            "debit" => Ok(Self::Debit),
            "spend" => Ok(Self::Spend),
            "bonus" => Ok(Self::Bonus),
            other => Err(EngineError::InvalidOperation(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

/// Validates a client-supplied idempotency key and returns it trimmed.
pub(crate) fn normalize_idempotency_key(key: &str) -> ResultEngine<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(EngineError::InvalidOperation(
            "idempotency_key must not be empty".to_string(),
        ));
    }
    if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(EngineError::InvalidOperation(format!(
            "idempotency_key must be at most {MAX_IDEMPOTENCY_KEY_LEN} bytes"
        )));
    }
    Ok(key.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub transaction_type: TransactionType,
    /// Signed: negative for the debit leg, positive for the credit leg.
    pub amount: i64,
    pub balance_after: i64,
    pub reference_id: Uuid,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletTransaction {
    pub(crate) fn debit(
        wallet_id: Uuid,
        amount: i64,
        balance_after: i64,
        reference_id: Uuid,
        idempotency_key: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            transaction_type: TransactionType::Debit,
            amount: -amount,
            balance_after,
            reference_id,
            idempotency_key: idempotency_key.to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    pub(crate) fn credit(
        wallet_id: Uuid,
        transaction_type: TransactionType,
        amount: i64,
        balance_after: i64,
        reference_id: Uuid,
        idempotency_key: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            transaction_type,
            amount,
            balance_after,
            reference_id,
            idempotency_key: idempotency_key.to_string(),
            created_at: at,
            updated_at: at,
        }
    }
}

/// Both legs of one transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub reference_id: Uuid,
    pub idempotency_key: String,
    pub debit: WalletTransaction,
    pub credit: WalletTransaction,
}

impl TransferRecord {
    /// Pair up the legs sharing a reference id. Fails unless there is exactly
    /// one debit and one credit leg.
    pub(crate) fn from_legs(legs: Vec<WalletTransaction>) -> ResultEngine<Self> {
        let mut debit = None;
        let mut credit = None;
        for leg in legs {
            let slot = if leg.amount < 0 { &mut debit } else { &mut credit };
            if slot.replace(leg).is_some() {
                return Err(EngineError::InvalidOperation(
                    "transfer has more than two legs".to_string(),
                ));
            }
        }
        match (debit, credit) {
            (Some(debit), Some(credit)) if debit.reference_id == credit.reference_id => {
                Ok(Self {
                    reference_id: debit.reference_id,
                    idempotency_key: debit.idempotency_key.clone(),
                    debit,
                    credit,
                })
            }
            _ => Err(EngineError::KeyNotFound("transfer legs not exists".to_string())),
        }
    }

    pub fn amount(&self) -> i64 {
        self.credit.amount
    }
}

/// What `transfer` did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "transfer", rename_all = "snake_case")]
pub enum TransferOutcome {
    /// A new transfer was recorded.
    Applied(TransferRecord),
    /// The idempotency key was already used; nothing changed.
    Replayed(TransferRecord),
}

impl TransferOutcome {
    pub fn record(&self) -> &TransferRecord {
        match self {
            Self::Applied(record) | Self::Replayed(record) => record,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub wallet_id: String,
    pub transaction_type: String,
    pub amount: i64,
    pub balance_after: i64,
    pub reference_id: String,
    pub idempotency_key: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&WalletTransaction> for ActiveModel {
    fn from(tx: &WalletTransaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            wallet_id: ActiveValue::Set(tx.wallet_id.to_string()),
            transaction_type: ActiveValue::Set(tx.transaction_type.as_str().to_string()),
            amount: ActiveValue::Set(tx.amount),
            balance_after: ActiveValue::Set(tx.balance_after),
            reference_id: ActiveValue::Set(tx.reference_id.to_string()),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for WalletTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let parse = |raw: &str| {
            Uuid::parse_str(raw)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))
        };
        Ok(Self {
            id: parse(&model.id)?,
            wallet_id: parse(&model.wallet_id)?,
            transaction_type: TransactionType::try_from(model.transaction_type.as_str())?,
            amount: model.amount,
            balance_after: model.balance_after,
            reference_id: parse(&model.reference_id)?,
            idempotency_key: model.idempotency_key,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
