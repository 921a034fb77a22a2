use engine::{BalanceType, EngineError};

mod common;

use common::engine_with_db;

#[tokio::test]
async fn duplicate_wallet_name_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    engine.save_wallet("Checking", None, 0).await.unwrap();
    let err = engine
        .save_wallet("checking", Some("same name"), 0)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("wallet.validate.duplicated"));
}

#[tokio::test]
async fn opening_balance_is_recorded_in_history() {
    let (engine, _db) = engine_with_db().await;

    let wallet = engine
        .save_wallet("Checking", None, 150_00)
        .await
        .unwrap();
    assert_eq!(wallet.balance, 150_00);

    let history = engine.list_wallet_balances(wallet.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_balance, 0);
    assert_eq!(history[0].actual_balance, 150_00);
    assert_eq!(history[0].moved_value, 150_00);
    assert_eq!(history[0].balance_type, BalanceType::Adjustment);
}

#[tokio::test]
async fn zero_opening_balance_writes_no_history() {
    let (engine, _db) = engine_with_db().await;

    let wallet = engine.save_wallet("Checking", None, 0).await.unwrap();

    let history = engine.list_wallet_balances(wallet.id).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn adjust_balance_records_history_and_publishes() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine
        .save_wallet("Checking", None, 100_00)
        .await
        .unwrap();

    let mut events = engine.subscribe_balance_changes();
    let change = engine
        .adjust_wallet_balance(wallet.id, 80_00, Some("reconciliation"))
        .await
        .unwrap();

    assert_eq!(change.old_balance, 100_00);
    assert_eq!(change.new_balance, 80_00);
    assert_eq!(change.moved_value, -20_00);
    assert_eq!(change.balance_type, BalanceType::Adjustment);

    let event = events.recv().await.unwrap();
    assert_eq!(event.wallet_id, wallet.id);
    assert_eq!(event.new_balance, 80_00);

    let wallet = engine.find_wallet_by_id(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, 80_00);

    let history = engine.list_wallet_balances(wallet.id).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn update_wallet_never_touches_balance() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine
        .save_wallet("Checking", None, 100_00)
        .await
        .unwrap();

    let updated = engine
        .update_wallet(wallet.id, "Main checking", Some("renamed"), true)
        .await
        .unwrap();

    assert_eq!(updated.name, "Main checking");
    assert!(updated.blocked);
    assert_eq!(updated.balance, 100_00);
}

#[tokio::test]
async fn blocked_filter_narrows_wallet_list() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.save_wallet("Checking", None, 0).await.unwrap();
    engine.save_wallet("Savings", None, 0).await.unwrap();
    engine
        .update_wallet(wallet.id, "Checking", None, true)
        .await
        .unwrap();

    let active = engine.list_wallets(Some(false)).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Savings");

    let all = engine.list_wallets(None).await.unwrap();
    assert_eq!(all.len(), 2);
}
