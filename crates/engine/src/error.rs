//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a wallet, user, currency or ledger entry is
//!   not found.
//! - [`Conflict`] thrown when a unique constraint rejects an insert.
//! - [`InsufficientFunds`] thrown when the source wallet cannot cover a
//!   transfer.
//! - [`InvalidOperation`] thrown for caller errors (non-positive amounts,
//!   self-transfers, currency mismatches, malformed input).
//! - [`Database`] wraps any other storage failure. It is the only retryable
//!   variant.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Conflict`]: EngineError::Conflict
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`InvalidOperation`]: EngineError::InvalidOperation
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    Conflict(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` when the failure came from the storage layer and the same
    /// request can be sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Maps a unique-constraint violation to [`EngineError::Conflict`], leaving
/// every other database error untouched.
pub(crate) fn conflict_or_database(err: DbErr, what: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::Conflict(what.to_string()),
        _ => EngineError::Database(err),
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidOperation(a), Self::InvalidOperation(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
