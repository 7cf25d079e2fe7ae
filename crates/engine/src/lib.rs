//! Multi-currency wallet ledger engine.
//!
//! The engine owns wallets, the append-only ledger of wallet transactions and
//! the transfer algorithm that moves value between two wallets atomically.
//! Value only enters or leaves circulation through the per-currency treasury
//! (system) wallets; every other movement is a balanced debit/credit pair.
//!
//! All coordination between concurrent transfers is delegated to the database:
//! wallets are locked with row-level write locks, always in the canonical
//! order returned by [`lock_order`].

pub use commands::{FundingCmd, TransferCmd};
pub use currency::{CurrencyType, DEFAULT_CURRENCY_NAMES};
pub use error::EngineError;
pub use ops::{
    DEFAULT_TREASURY_BALANCE, Engine, EngineBuilder, FundingOutcome, WalletTransactionsPage,
    lock_order,
};
pub use transactions::{TransactionType, TransferOutcome, TransferRecord, WalletTransaction};
pub use users::{OwnerRole, SYSTEM_USER_ID, SYSTEM_USER_NAME, User};
pub use wallets::Wallet;

mod commands;
mod currency;
mod error;
mod ops;
mod transactions;
mod users;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
