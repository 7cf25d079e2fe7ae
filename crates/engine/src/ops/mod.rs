use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

mod bootstrap;
mod currencies;
mod funding;
mod ledger;
mod transfer;
mod users;
mod wallets;

pub use bootstrap::DEFAULT_TREASURY_BALANCE;
pub use funding::FundingOutcome;
pub use ledger::WalletTransactionsPage;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Canonical order in which a set of wallets must be locked.
///
/// Ids are sorted ascending and deduplicated. `Uuid` ordering is byte order,
/// which is the same as the lexicographic order of the stored hyphenated ids.
/// Every code path that locks more than one wallet goes through this.
pub fn lock_order(wallet_ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = wallet_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn ensure_positive_amount(amount: i64) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::InvalidOperation(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
