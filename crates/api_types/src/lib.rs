use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum OwnerRole {
        User,
        System,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub name: String,
        pub role: OwnerRole,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod currency {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyTypeView {
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyTypeList {
        pub currencies: Vec<CurrencyTypeView>,
    }
}

pub mod wallet {
    use super::{user::OwnerRole, *};

    /// Request body shared by top-up, spend and bonus.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct WalletOperation {
        /// Client token; resending the same key never applies the operation twice.
        pub idempotency_key: String,
        pub owner_id: Uuid,
        pub currency_type_id: Uuid,
        /// Must be > 0.
        pub amount: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum OperationStatus {
        /// The operation was recorded by this request.
        Applied,
        /// The idempotency key was already used; nothing changed.
        Replayed,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionType {
        TopUp,
        Debit,
        Spend,
        Bonus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub owner_type: OwnerRole,
        pub owner_id: Uuid,
        pub currency_type_id: Uuid,
        pub balance: i64,
        pub version: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// One ledger row.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub wallet_id: Uuid,
        pub transaction_type: TransactionType,
        /// Signed: negative on the debit leg.
        pub amount: i64,
        pub balance_after: i64,
        pub reference_id: Uuid,
        pub idempotency_key: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OperationResponse {
        pub message: String,
        pub status: OperationStatus,
        pub reference_id: Uuid,
        /// The owner's wallet after the operation.
        pub wallet: WalletView,
        /// Debit leg first, then credit leg.
        pub transactions: Vec<TransactionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceQuery {
        /// Defaults to `user`.
        pub owner_type: Option<OwnerRole>,
        pub owner_id: Uuid,
        pub currency_type_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryQuery {
        pub limit: Option<u64>,
        /// Opaque pagination cursor, from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}
