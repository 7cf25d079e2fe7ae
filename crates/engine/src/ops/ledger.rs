use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{Condition, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{EngineError, ResultEngine, TransferRecord, WalletTransaction, transactions};

use super::Engine;

/// Upper bound for a single history page.
const MAX_PAGE_SIZE: u64 = 200;

/// One page of a wallet's ledger history, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletTransactionsPage {
    pub transactions: Vec<WalletTransaction>,
    /// Opaque cursor for the next (older) page, `None` on the last page.
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LedgerCursor {
    created_at: DateTime<Utc>,
    transaction_id: String,
}

impl LedgerCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidOperation("invalid ledger cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidOperation("invalid ledger cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidOperation("invalid ledger cursor".to_string()))
    }
}

/// First ledger row carrying `key`, on any connection (pool or open
/// transaction).
pub(super) async fn find_by_idempotency_key<C: ConnectionTrait>(
    db: &C,
    key: &str,
) -> ResultEngine<Option<WalletTransaction>> {
    transactions::Entity::find()
        .filter(transactions::Column::IdempotencyKey.eq(key))
        .order_by_asc(transactions::Column::CreatedAt)
        .one(db)
        .await?
        .map(WalletTransaction::try_from)
        .transpose()
}

pub(super) async fn find_transfer<C: ConnectionTrait>(
    db: &C,
    reference_id: &str,
) -> ResultEngine<TransferRecord> {
    let legs = transactions::Entity::find()
        .filter(transactions::Column::ReferenceId.eq(reference_id))
        .all(db)
        .await?
        .into_iter()
        .map(WalletTransaction::try_from)
        .collect::<ResultEngine<Vec<_>>>()?;
    TransferRecord::from_legs(legs)
}

impl Engine {
    /// Ledger lookup by idempotency key.
    ///
    /// This is the single source of truth for "has this operation already been
    /// applied".
    pub async fn transaction_by_idempotency_key(
        &self,
        key: &str,
    ) -> ResultEngine<WalletTransaction> {
        find_by_idempotency_key(&self.database, key.trim())
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    /// Both legs of the transfer identified by `reference_id`.
    pub async fn transfer_legs(&self, reference_id: Uuid) -> ResultEngine<TransferRecord> {
        find_transfer(&self.database, &reference_id.to_string()).await
    }

    /// Lists the ledger entries of a wallet with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(created_at DESC, id DESC)`.
    pub async fn wallet_transactions_page(
        &self,
        wallet_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<WalletTransactionsPage> {
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(EngineError::InvalidOperation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        // Unknown wallets are NotFound rather than an empty page.
        self.wallet(wallet_id).await?;

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit.saturating_add(1));

        if let Some(cursor) = cursor {
            let cursor = LedgerCursor::decode(cursor)?;
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::CreatedAt.lt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(transactions::Column::CreatedAt.eq(cursor.created_at))
                            .add(transactions::Column::Id.lt(cursor.transaction_id)),
                    ),
            );
        }

        let rows = query.all(&self.database).await?;
        let has_more = rows.len() > limit as usize;
        let transactions = rows
            .into_iter()
            .take(limit as usize)
            .map(WalletTransaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let next_cursor = if has_more {
            transactions
                .last()
                .map(|tx| LedgerCursor {
                    created_at: tx.created_at,
                    transaction_id: tx.id.to_string(),
                })
                .map(|c| c.encode())
                .transpose()?
        } else {
            None
        };

        Ok(WalletTransactionsPage {
            transactions,
            next_cursor,
        })
    }
}
