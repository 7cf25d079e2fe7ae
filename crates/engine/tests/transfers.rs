mod common;

use std::collections::HashSet;

use engine::{EngineError, FundingCmd, OwnerRole, TransactionType, TransferCmd, TransferOutcome};

use common::{file_fixture, fixture};

#[tokio::test]
async fn top_up_moves_value_out_of_the_treasury() {
    let fx = fixture().await;
    let user_wallet = fx
        .engine
        .resolve_or_create_wallet(fx.alice.id, fx.gold.id)
        .await
        .unwrap();
    assert_eq!(user_wallet.balance, 0);

    let outcome = fx
        .engine
        .transfer(
            TransferCmd::new(fx.treasury.id, user_wallet.id, fx.gold.id, "k1", 500)
                .transaction_type(TransactionType::TopUp),
        )
        .await
        .unwrap();

    let TransferOutcome::Applied(record) = outcome else {
        panic!("expected an applied transfer");
    };
    assert_eq!(fx.balance(fx.treasury.id).await, 999_500);
    assert_eq!(fx.balance(user_wallet.id).await, 500);

    assert_eq!(record.debit.wallet_id, fx.treasury.id);
    assert_eq!(record.debit.amount, -500);
    assert_eq!(record.debit.balance_after, 999_500);
    assert_eq!(record.debit.transaction_type, TransactionType::Debit);
    assert_eq!(record.credit.wallet_id, user_wallet.id);
    assert_eq!(record.credit.amount, 500);
    assert_eq!(record.credit.balance_after, 500);
    assert_eq!(record.credit.transaction_type, TransactionType::TopUp);
    assert_eq!(record.debit.reference_id, record.credit.reference_id);
    assert_eq!(record.debit.idempotency_key, "k1");
    assert_eq!(record.credit.idempotency_key, "k1");

    let stored = fx.engine.transfer_legs(record.reference_id).await.unwrap();
    assert_eq!(stored, record);
    assert_eq!(stored.debit.amount + stored.credit.amount, 0);
}

#[tokio::test]
async fn replaying_a_key_changes_nothing() {
    let fx = fixture().await;
    let user_wallet = fx
        .engine
        .resolve_or_create_wallet(fx.alice.id, fx.gold.id)
        .await
        .unwrap();
    let cmd = TransferCmd::new(fx.treasury.id, user_wallet.id, fx.gold.id, "k1", 500);

    let first = fx.engine.transfer(cmd.clone()).await.unwrap();
    let second = fx.engine.transfer(cmd).await.unwrap();

    assert!(!first.is_replay());
    assert!(second.is_replay());
    assert_eq!(first.record(), second.record());
    assert_eq!(fx.balance(fx.treasury.id).await, 999_500);
    assert_eq!(fx.balance(user_wallet.id).await, 500);
    assert_eq!(fx.ledger_len(user_wallet.id).await, 1);
    assert_eq!(fx.ledger_len(fx.treasury.id).await, 1);
}

#[tokio::test]
async fn spend_beyond_balance_is_rejected_without_side_effects() {
    let fx = fixture().await;
    let user_wallet = fx.fund(fx.alice.id, 100).await;
    let treasury_before = fx.balance(fx.treasury.id).await;

    let err = fx
        .engine
        .transfer(
            TransferCmd::new(user_wallet.id, fx.treasury.id, fx.gold.id, "k2", 500)
                .transaction_type(TransactionType::Spend),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert!(!err.is_retryable());
    assert_eq!(fx.balance(user_wallet.id).await, 100);
    assert_eq!(fx.balance(fx.treasury.id).await, treasury_before);
    assert_eq!(fx.ledger_len(user_wallet.id).await, 1);
    assert!(matches!(
        fx.engine.transaction_by_idempotency_key("k2").await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn invalid_transfers_are_rejected() {
    let fx = fixture().await;
    let wallet = fx.fund(fx.alice.id, 100).await;
    let silver = fx.engine.ensure_currency_type("silver").await.unwrap();
    let silver_wallet = fx
        .engine
        .resolve_or_create_wallet(fx.alice.id, silver.id)
        .await
        .unwrap();

    let cases = [
        TransferCmd::new(wallet.id, wallet.id, fx.gold.id, "self", 10),
        TransferCmd::new(wallet.id, fx.treasury.id, fx.gold.id, "zero", 0),
        TransferCmd::new(wallet.id, fx.treasury.id, fx.gold.id, "negative", -10),
        TransferCmd::new(wallet.id, silver_wallet.id, fx.gold.id, "mismatch", 10),
        TransferCmd::new(wallet.id, fx.treasury.id, silver.id, "wrong-currency", 10),
        TransferCmd::new(wallet.id, fx.treasury.id, fx.gold.id, "  ", 10),
        TransferCmd::new(wallet.id, fx.treasury.id, fx.gold.id, "debit-credit", 10)
            .transaction_type(TransactionType::Debit),
    ];
    for cmd in cases {
        let key = cmd.idempotency_key.clone();
        let err = fx.engine.transfer(cmd).await.unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidOperation(_)),
            "{key}: unexpected {err:?}"
        );
    }

    assert_eq!(fx.balance(wallet.id).await, 100);
    assert_eq!(fx.ledger_len(wallet.id).await, 1);
}

#[tokio::test]
async fn transfer_to_unknown_wallet_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .engine
        .transfer(TransferCmd::new(
            fx.treasury.id,
            uuid::Uuid::new_v4(),
            fx.gold.id,
            "ghost",
            10,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert_eq!(fx.balance(fx.treasury.id).await, 1_000_000);
}

#[tokio::test]
async fn transfers_conserve_value_and_balance_the_ledger() {
    let fx = fixture().await;
    let alice = fx.fund(fx.alice.id, 300).await;
    let bob = fx.fund(fx.bob.id, 200).await;

    for (i, (from, to, amount)) in [(alice.id, bob.id, 120), (bob.id, alice.id, 50)]
        .into_iter()
        .enumerate()
    {
        let before = fx.balance(from).await + fx.balance(to).await;
        fx.engine
            .transfer(TransferCmd::new(from, to, fx.gold.id, format!("p2p-{i}"), amount))
            .await
            .unwrap();
        let after = fx.balance(from).await + fx.balance(to).await;
        assert_eq!(before, after);
    }

    assert_eq!(fx.balance(alice.id).await, 230);
    assert_eq!(fx.balance(bob.id).await, 270);

    // Every wallet's ledger replays to its balance and all legs sum to zero.
    let mut total = 0;
    for wallet_id in [fx.treasury.id, alice.id, bob.id] {
        let posted = fx.ledger_sum(wallet_id).await;
        let wallet = fx.engine.wallet(wallet_id).await.unwrap();
        let opening = if wallet.is_system() { 1_000_000 } else { 0 };
        assert_eq!(opening + posted, wallet.balance);
        total += posted;
    }
    assert_eq!(total, 0);
}

#[tokio::test]
async fn versions_increase_with_each_balance_change() {
    let fx = fixture().await;
    let wallet = fx.fund(fx.alice.id, 10).await;
    assert_eq!(wallet.version, 1);
    let wallet = fx.fund(fx.alice.id, 10).await;
    assert_eq!(wallet.version, 2);
    assert_eq!(fx.engine.wallet(fx.treasury.id).await.unwrap().version, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_spends_never_overdraw() {
    let fx = file_fixture().await;
    let wallet = fx.fund(fx.alice.id, 100).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let engine = fx.engine.clone();
        let cmd = FundingCmd::new(fx.alice.id, fx.gold.id, format!("spend-{i}"), 30);
        handles.push(tokio::spawn(async move { engine.spend(cmd).await }));
    }

    let mut applied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                assert!(!outcome.outcome.is_replay());
                assert!(outcome.wallet.balance >= 0);
                applied += 1;
            }
            Err(EngineError::InsufficientFunds(_)) => {}
            Err(err) => panic!("unexpected error: {err:?}"),
        }
    }

    assert_eq!(applied, 3);
    assert_eq!(fx.balance(wallet.id).await, 10);
    assert_eq!(fx.balance(fx.treasury.id).await, 1_000_000 - 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_transfers_on_one_pair_all_complete() {
    let fx = file_fixture().await;
    let alice = fx.fund(fx.alice.id, 100).await;
    let bob = fx.fund(fx.bob.id, 100).await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = fx.engine.clone();
        let (from, to) = if i % 2 == 0 {
            (alice.id, bob.id)
        } else {
            (bob.id, alice.id)
        };
        let cmd = TransferCmd::new(from, to, fx.gold.id, format!("swap-{i}"), 5);
        handles.push(tokio::spawn(async move { engine.transfer(cmd).await }));
    }
    for handle in handles {
        assert!(!handle.await.unwrap().unwrap().is_replay());
    }

    assert_eq!(fx.balance(alice.id).await, 100);
    assert_eq!(fx.balance(bob.id).await, 100);
    assert_eq!(fx.ledger_len(alice.id).await, 21);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_retries_apply_once() {
    let fx = file_fixture().await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let engine = fx.engine.clone();
        let cmd = FundingCmd::new(fx.alice.id, fx.gold.id, "retry-me", 40);
        handles.push(tokio::spawn(async move { engine.top_up(cmd).await }));
    }

    let mut references = HashSet::new();
    let mut applied = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if !outcome.outcome.is_replay() {
            applied += 1;
        }
        assert_eq!(outcome.wallet.owner_id, fx.alice.id);
        references.insert(outcome.outcome.record().reference_id);
    }

    assert_eq!(applied, 1);
    assert_eq!(references.len(), 1);
    let wallet = fx
        .engine
        .wallet_by_owner(OwnerRole::User, fx.alice.id, fx.gold.id)
        .await
        .unwrap();
    assert_eq!(wallet.balance, 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_swaps_and_spends_conserve_value() {
    let fx = file_fixture().await;
    let alice = fx.fund(fx.alice.id, 500).await;
    let bob = fx.fund(fx.bob.id, 500).await;

    let mut handles = Vec::new();
    for i in 0..200 {
        let engine = fx.engine.clone();
        let (alice_id, bob_id, gold) = (fx.alice.id, fx.bob.id, fx.gold.id);
        let (from, to) = if i % 2 == 0 {
            (alice.id, bob.id)
        } else {
            (bob.id, alice.id)
        };
        handles.push(tokio::spawn(async move {
            match i % 4 {
                0 | 1 => engine
                    .transfer(TransferCmd::new(from, to, gold, format!("mix-{i}"), 7))
                    .await
                    .map(|_| ()),
                2 => engine
                    .spend(FundingCmd::new(alice_id, gold, format!("mix-{i}"), 13))
                    .await
                    .map(|_| ()),
                _ => engine
                    .spend(FundingCmd::new(bob_id, gold, format!("mix-{i}"), 13))
                    .await
                    .map(|_| ()),
            }
        }));
    }

    let (mut applied, mut insufficient) = (0, 0);
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => applied += 1,
            Err(EngineError::InsufficientFunds(_)) => insufficient += 1,
            Err(err) => panic!("unexpected error: {err:?}"),
        }
    }
    assert_eq!(applied + insufficient, 200);

    let balances = [
        fx.balance(alice.id).await,
        fx.balance(bob.id).await,
        fx.balance(fx.treasury.id).await,
    ];
    assert!(balances.iter().all(|balance| *balance >= 0));
    assert_eq!(balances.iter().sum::<i64>(), 1_000_000);
    assert_eq!(fx.ledger_sum(alice.id).await, balances[0]);
    assert_eq!(fx.ledger_sum(bob.id).await, balances[1]);
}
