//! Wallet API endpoints

use api_types::{
    user::OwnerRole as ApiRole,
    wallet::{
        BalanceQuery, HistoryQuery, HistoryResponse, OperationResponse, OperationStatus,
        TransactionType as ApiType, TransactionView, WalletOperation, WalletView,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use engine::{FundingCmd, FundingOutcome, TransferOutcome};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user::map_role};

const DEFAULT_PAGE_SIZE: u64 = 50;

#[derive(Clone, Copy)]
enum Operation {
    TopUp,
    Spend,
    Bonus,
}

impl Operation {
    fn message(self, replayed: bool) -> String {
        let done = match self {
            Self::TopUp => "Top-up successful",
            Self::Spend => "Spend successful",
            Self::Bonus => "Bonus added",
        };
        if replayed {
            format!("{done} (idempotent)")
        } else {
            done.to_string()
        }
    }
}

fn map_type(kind: engine::TransactionType) -> ApiType {
    match kind {
        engine::TransactionType::TopUp => ApiType::TopUp,
        engine::TransactionType::Debit => ApiType::Debit,
        engine::TransactionType::Spend => ApiType::Spend,
        engine::TransactionType::Bonus => ApiType::Bonus,
    }
}

fn wallet_view(wallet: engine::Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        owner_type: map_role(wallet.owner_type),
        owner_id: wallet.owner_id,
        currency_type_id: wallet.currency_type_id,
        balance: wallet.balance,
        version: wallet.version,
        created_at: wallet.created_at,
        updated_at: wallet.updated_at,
    }
}

fn transaction_view(tx: engine::WalletTransaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        wallet_id: tx.wallet_id,
        transaction_type: map_type(tx.transaction_type),
        amount: tx.amount,
        balance_after: tx.balance_after,
        reference_id: tx.reference_id,
        idempotency_key: tx.idempotency_key,
        created_at: tx.created_at,
    }
}

fn operation_response(operation: Operation, funded: FundingOutcome) -> OperationResponse {
    let (status, record) = match funded.outcome {
        TransferOutcome::Applied(record) => (OperationStatus::Applied, record),
        TransferOutcome::Replayed(record) => (OperationStatus::Replayed, record),
    };
    OperationResponse {
        message: operation.message(status == OperationStatus::Replayed),
        status,
        reference_id: record.reference_id,
        wallet: wallet_view(funded.wallet),
        transactions: vec![transaction_view(record.debit), transaction_view(record.credit)],
    }
}

async fn operate(
    state: &ServerState,
    operation: Operation,
    payload: WalletOperation,
) -> Result<Json<OperationResponse>, ServerError> {
    if payload.idempotency_key.trim().is_empty() {
        return Err(ServerError::Generic("idempotency_key is required".to_string()));
    }
    let cmd = FundingCmd::new(
        payload.owner_id,
        payload.currency_type_id,
        payload.idempotency_key,
        payload.amount,
    );
    let engine = &state.engine;
    let funded = match operation {
        Operation::TopUp => state.deadline(engine.top_up(cmd)).await?,
        Operation::Spend => state.deadline(engine.spend(cmd)).await?,
        Operation::Bonus => state.deadline(engine.bonus(cmd)).await?,
    };

    Ok(Json(operation_response(operation, funded)))
}

/// Credit the owner from the treasury.
pub async fn top_up(
    State(state): State<ServerState>,
    Json(payload): Json<WalletOperation>,
) -> Result<Json<OperationResponse>, ServerError> {
    operate(&state, Operation::TopUp, payload).await
}

/// Debit the owner back into the treasury.
pub async fn spend(
    State(state): State<ServerState>,
    Json(payload): Json<WalletOperation>,
) -> Result<Json<OperationResponse>, ServerError> {
    operate(&state, Operation::Spend, payload).await
}

pub async fn bonus(
    State(state): State<ServerState>,
    Json(payload): Json<WalletOperation>,
) -> Result<Json<OperationResponse>, ServerError> {
    operate(&state, Operation::Bonus, payload).await
}

/// Read-only lookup. Does not create the wallet.
pub async fn balance(
    State(state): State<ServerState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<WalletView>, ServerError> {
    let owner_type = match query.owner_type.unwrap_or(ApiRole::User) {
        ApiRole::User => engine::OwnerRole::User,
        ApiRole::System => engine::OwnerRole::System,
    };
    let wallet = state
        .deadline(
            state
                .engine
                .wallet_by_owner(owner_type, query.owner_id, query.currency_type_id),
        )
        .await?;

    Ok(Json(wallet_view(wallet)))
}

pub async fn history(
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let page = state
        .deadline(state.engine.wallet_transactions_page(
            wallet_id,
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.cursor.as_deref(),
        ))
        .await?;

    Ok(Json(HistoryResponse {
        transactions: page.transactions.into_iter().map(transaction_view).collect(),
        next_cursor: page.next_cursor,
    }))
}
