#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database};
use tempfile::TempDir;

use engine::{
    CurrencyType, DEFAULT_TREASURY_BALANCE, Engine, FundingCmd, OwnerRole, User, Wallet,
};
use migration::MigratorTrait;
use uuid::Uuid;

/// A migrated in-memory database behind an engine.
///
/// The pool holds a single connection so every task sees the same database;
/// concurrent transfers queue on it instead of on row locks.
pub async fn engine() -> Engine {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    connect(options).await
}

/// A migrated SQLite file behind a pool of several connections, so
/// concurrent tasks run overlapping transactions.
///
/// The database lives as long as the returned directory.
pub async fn file_engine() -> (Engine, TempDir) {
    let dir = TempDir::new().expect("failed to create tempdir");
    let path = dir.path().join("wallet.db");
    let mut options = ConnectOptions::new(format!("sqlite:{}?mode=rwc", path.display()));
    options.sqlx_logging(false);
    (connect(options).await, dir)
}

async fn connect(options: ConnectOptions) -> Engine {
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

pub struct Fixture {
    pub engine: Arc<Engine>,
    pub gold: CurrencyType,
    pub treasury: Wallet,
    pub alice: User,
    pub bob: User,
    _store: Option<TempDir>,
}

/// `gold` with a treasury of [`DEFAULT_TREASURY_BALANCE`] and two users
/// without wallets.
pub async fn fixture() -> Fixture {
    populate(engine().await, None).await
}

/// [`fixture`] on a multi-connection file database.
pub async fn file_fixture() -> Fixture {
    let (engine, dir) = file_engine().await;
    populate(engine, Some(dir)).await
}

async fn populate(engine: Engine, store: Option<TempDir>) -> Fixture {
    let gold = engine.ensure_currency_type("gold").await.unwrap();
    let treasury = engine
        .ensure_treasury(gold.id, DEFAULT_TREASURY_BALANCE)
        .await
        .unwrap();
    let alice = engine.new_user("alice", OwnerRole::User).await.unwrap();
    let bob = engine.new_user("bob", OwnerRole::User).await.unwrap();
    Fixture {
        engine: Arc::new(engine),
        gold,
        treasury,
        alice,
        bob,
        _store: store,
    }
}

impl Fixture {
    /// Top `owner` up from the treasury and return the owner's wallet.
    pub async fn fund(&self, owner: Uuid, amount: i64) -> Wallet {
        self.engine
            .top_up(FundingCmd::new(
                owner,
                self.gold.id,
                format!("fund-{}", Uuid::new_v4()),
                amount,
            ))
            .await
            .unwrap()
            .wallet
    }

    pub async fn balance(&self, wallet_id: Uuid) -> i64 {
        self.engine.wallet(wallet_id).await.unwrap().balance
    }

    /// Sum of every ledger amount posted to `wallet_id`.
    pub async fn ledger_sum(&self, wallet_id: Uuid) -> i64 {
        let mut sum = 0;
        let mut cursor = None;
        loop {
            let page = self
                .engine
                .wallet_transactions_page(wallet_id, 200, cursor.as_deref())
                .await
                .unwrap();
            sum += page.transactions.iter().map(|tx| tx.amount).sum::<i64>();
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return sum,
            }
        }
    }

    pub async fn ledger_len(&self, wallet_id: Uuid) -> usize {
        self.engine
            .wallet_transactions_page(wallet_id, 200, None)
            .await
            .unwrap()
            .transactions
            .len()
    }
}
