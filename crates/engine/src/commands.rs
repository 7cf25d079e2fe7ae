//! Command structs for engine operations.
//!
//! These types group parameters for write operations (transfer, top-up,
//! spend, bonus), keeping call sites readable and avoiding long argument
//! lists.

use uuid::Uuid;

use crate::TransactionType;

/// Move `amount` from one wallet to another.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_wallet_id: Uuid,
    pub to_wallet_id: Uuid,
    pub currency_type_id: Uuid,
    pub idempotency_key: String,
    pub amount: i64,
    /// Type recorded on the credit leg. The debit leg is always `debit`.
    pub transaction_type: TransactionType,
}

impl TransferCmd {
    /// Build a transfer whose credit leg defaults to `top_up`.
    #[must_use]
    pub fn new(
        from_wallet_id: Uuid,
        to_wallet_id: Uuid,
        currency_type_id: Uuid,
        idempotency_key: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            from_wallet_id,
            to_wallet_id,
            currency_type_id,
            idempotency_key: idempotency_key.into(),
            amount,
            transaction_type: TransactionType::default(),
        }
    }

    #[must_use]
    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }
}

/// Top-up, spend or bonus for one owner against the treasury.
#[derive(Clone, Debug)]
pub struct FundingCmd {
    pub owner_id: Uuid,
    pub currency_type_id: Uuid,
    pub idempotency_key: String,
    pub amount: i64,
}

impl FundingCmd {
    #[must_use]
    pub fn new(
        owner_id: Uuid,
        currency_type_id: Uuid,
        idempotency_key: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            owner_id,
            currency_type_id,
            idempotency_key: idempotency_key.into(),
            amount,
        }
    }
}
