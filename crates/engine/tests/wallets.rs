mod common;

use std::{collections::HashSet, sync::Arc};

use engine::{
    DEFAULT_CURRENCY_NAMES, DEFAULT_TREASURY_BALANCE, EngineError, FundingCmd, OwnerRole,
    SYSTEM_USER_ID, SYSTEM_USER_NAME, Wallet,
};
use uuid::Uuid;

use common::{engine, file_engine, fixture};

#[tokio::test]
async fn first_use_creates_an_empty_wallet_once() {
    let fx = fixture().await;

    let created = fx
        .engine
        .resolve_or_create_wallet(fx.alice.id, fx.gold.id)
        .await
        .unwrap();
    assert_eq!(created.balance, 0);
    assert_eq!(created.version, 0);
    assert_eq!(created.owner_type, OwnerRole::User);
    assert_eq!(created.owner_id, fx.alice.id);

    let again = fx
        .engine
        .resolve_or_create_wallet(fx.alice.id, fx.gold.id)
        .await
        .unwrap();
    assert_eq!(again.id, created.id);

    let by_owner = fx
        .engine
        .wallet_by_owner(OwnerRole::User, fx.alice.id, fx.gold.id)
        .await
        .unwrap();
    assert_eq!(by_owner, created);
}

#[tokio::test]
async fn concurrent_first_use_yields_one_wallet() {
    let fx = fixture().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = fx.engine.clone();
        let (owner, currency) = (fx.bob.id, fx.gold.id);
        handles.push(tokio::spawn(async move {
            engine.resolve_or_create_wallet(owner, currency).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn duplicate_wallet_insert_is_a_conflict() {
    let fx = fixture().await;
    let existing = fx
        .engine
        .resolve_or_create_wallet(fx.alice.id, fx.gold.id)
        .await
        .unwrap();

    let err = fx
        .engine
        .create_wallet(&Wallet::new(OwnerRole::User, fx.alice.id, fx.gold.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    // The winner's row is untouched.
    assert_eq!(fx.engine.wallet(existing.id).await.unwrap(), existing);
}

#[tokio::test]
async fn unknown_owner_or_currency_is_not_found() {
    let fx = fixture().await;

    let err = fx
        .engine
        .resolve_or_create_wallet(Uuid::new_v4(), fx.gold.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = fx
        .engine
        .resolve_or_create_wallet(fx.alice.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert!(matches!(
        fx.engine.wallet(Uuid::new_v4()).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn system_user_resolves_to_the_treasury() {
    let fx = fixture().await;
    let system = fx.engine.ensure_system_user().await.unwrap();
    assert_eq!(system.name, SYSTEM_USER_NAME);
    assert_eq!(system.role, OwnerRole::System);
    assert_eq!(fx.engine.owner_role(system.id).await.unwrap(), OwnerRole::System);

    let wallet = fx
        .engine
        .resolve_or_create_wallet(system.id, fx.gold.id)
        .await
        .unwrap();
    assert_eq!(wallet.id, fx.treasury.id);
    assert!(wallet.is_system());
    assert_eq!(
        fx.engine.system_wallet(fx.gold.id).await.unwrap().id,
        fx.treasury.id
    );
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let engine = engine().await;

    let mut currencies = Vec::new();
    for name in DEFAULT_CURRENCY_NAMES {
        currencies.push(engine.ensure_currency_type(name).await.unwrap());
    }
    let again = engine.ensure_currency_type(" Gold ").await.unwrap();
    assert_eq!(again.id, currencies[0].id);
    assert_eq!(engine.currency_types().await.unwrap().len(), 3);
    assert_eq!(
        engine.currency_type_by_name("DIAMOND").await.unwrap().id,
        currencies[1].id
    );

    let first = engine.ensure_treasury(currencies[0].id, 1_000).await.unwrap();
    let second = engine.ensure_treasury(currencies[0].id, 5_000).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.balance, 1_000);

    let system = engine.ensure_system_user().await.unwrap();
    assert_eq!(engine.ensure_system_user().await.unwrap().id, system.id);
    assert_eq!(first.owner_id, system.id);
}

#[tokio::test]
async fn treasury_needs_a_known_currency() {
    let engine = engine().await;
    assert!(matches!(
        engine.ensure_treasury(Uuid::new_v4(), 10).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.system_wallet(Uuid::new_v4()).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn users_with_fixed_ids() {
    let engine = engine().await;
    let id = Uuid::new_v4();
    let user = engine
        .new_user_with_id(id, "Alice", OwnerRole::User)
        .await
        .unwrap();
    assert_eq!(user.id, id);
    assert_eq!(engine.user(id).await.unwrap(), user);

    assert!(matches!(
        engine.new_user_with_id(id, "Alice", OwnerRole::User).await,
        Err(EngineError::Conflict(_))
    ));
    assert!(matches!(
        engine.new_user("   ", OwnerRole::User).await,
        Err(EngineError::InvalidOperation(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bootstraps_open_one_treasury() {
    let (engine, _dir) = file_engine().await;
    let engine = Arc::new(engine);
    let gold = engine.ensure_currency_type("gold").await.unwrap().id;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.ensure_treasury(gold, DEFAULT_TREASURY_BALANCE).await
        }));
    }

    let mut treasuries = HashSet::new();
    for handle in handles {
        let treasury = handle.await.unwrap().unwrap();
        assert_eq!(treasury.owner_id, SYSTEM_USER_ID);
        assert_eq!(treasury.balance, DEFAULT_TREASURY_BALANCE);
        treasuries.insert(treasury.id);
    }
    assert_eq!(treasuries.len(), 1);

    let system = engine.ensure_system_user().await.unwrap();
    assert_eq!(system.id, SYSTEM_USER_ID);
    assert!(treasuries.contains(&engine.system_wallet(gold).await.unwrap().id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_system_user_creation_yields_one_user() {
    let (engine, _dir) = file_engine().await;
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move { engine.ensure_system_user().await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().id, SYSTEM_USER_ID);
    }
}

#[tokio::test]
async fn system_role_is_reserved() {
    let fx = fixture().await;

    assert!(matches!(
        fx.engine.new_user("ops", OwnerRole::System).await,
        Err(EngineError::InvalidOperation(_))
    ));
    assert!(matches!(
        fx.engine
            .new_user_with_id(Uuid::new_v4(), "ops", OwnerRole::System)
            .await,
        Err(EngineError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn treasury_cannot_be_shadowed() {
    let fx = fixture().await;

    // A second system wallet in the same currency is refused by the store.
    let rogue = Wallet::new(OwnerRole::System, Uuid::new_v4(), fx.gold.id);
    assert!(matches!(
        fx.engine.create_wallet(&rogue).await,
        Err(EngineError::Conflict(_))
    ));

    // The system user only gets a treasury through bootstrap.
    let silver = fx.engine.ensure_currency_type("silver").await.unwrap();
    assert!(matches!(
        fx.engine
            .resolve_or_create_wallet(SYSTEM_USER_ID, silver.id)
            .await,
        Err(EngineError::InvalidOperation(_))
    ));

    let funded = fx
        .engine
        .top_up(FundingCmd::new(fx.alice.id, fx.gold.id, "after-rogue", 10))
        .await
        .unwrap();
    assert_eq!(funded.wallet.balance, 10);
    assert_eq!(
        fx.engine.system_wallet(fx.gold.id).await.unwrap().balance,
        DEFAULT_TREASURY_BALANCE - 10
    );
}
