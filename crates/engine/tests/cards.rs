use engine::{CardType, EngineError};

mod common;

use common::engine_with_db;

#[tokio::test]
async fn debit_cards_must_name_a_wallet() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .save_card("Everyday", CardType::Debit, None, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("card.validate.no-wallet"));

    let wallet = engine.save_wallet("Checking", None, 0).await.unwrap();
    let card = engine
        .save_card("Everyday", CardType::Debit, Some("brand"), Some(wallet.id))
        .await
        .unwrap();
    assert_eq!(card.wallet_id, Some(wallet.id));
    assert_eq!(card.flag.as_deref(), Some("brand"));
}

#[tokio::test]
async fn name_is_unique_per_card_type() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.save_wallet("Checking", None, 0).await.unwrap();

    engine
        .save_card("Platinum", CardType::Credit, None, None)
        .await
        .unwrap();

    let err = engine
        .save_card("platinum", CardType::Credit, None, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("card.validate.duplicated"));

    // Same name on the other type is a different card.
    engine
        .save_card("Platinum", CardType::Debit, None, Some(wallet.id))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_keeps_the_uniqueness_rule() {
    let (engine, _db) = engine_with_db().await;

    engine
        .save_card("Platinum", CardType::Credit, None, None)
        .await
        .unwrap();
    let gold = engine
        .save_card("Gold", CardType::Credit, None, None)
        .await
        .unwrap();

    let err = engine
        .update_card(gold.id, "Platinum", CardType::Credit, None, None, false)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("card.validate.duplicated"));

    // Renaming a card onto its own name is not a duplicate.
    let updated = engine
        .update_card(gold.id, "Gold", CardType::Credit, Some("new brand"), None, true)
        .await
        .unwrap();
    assert_eq!(updated.flag.as_deref(), Some("new brand"));
    assert!(updated.blocked);
}

#[tokio::test]
async fn blocked_filter_narrows_the_card_list() {
    let (engine, _db) = engine_with_db().await;

    let platinum = engine
        .save_card("Platinum", CardType::Credit, None, None)
        .await
        .unwrap();
    engine
        .save_card("Gold", CardType::Credit, None, None)
        .await
        .unwrap();
    engine
        .update_card(platinum.id, "Platinum", CardType::Credit, None, None, true)
        .await
        .unwrap();

    let active = engine.list_cards(Some(false)).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Gold");

    let all = engine.list_cards(None).await.unwrap();
    assert_eq!(all.len(), 2);
}
