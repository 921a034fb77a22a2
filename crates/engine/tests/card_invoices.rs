use chrono::NaiveDate;
use uuid::Uuid;

use engine::{
    ApportionmentDraft, BalanceType, CardType, ClassType, Engine, EngineError, FinancialPeriod,
    Movement, MovementDraft, MovementState, PaymentDraft, PaymentMethod,
};

mod common;

use common::engine_with_db;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

async fn open_period(engine: &Engine) -> FinancialPeriod {
    engine
        .open_financial_period("03/2026", date(2026, 3, 1), date(2026, 3, 31))
        .await
        .unwrap()
}

async fn expense_class(engine: &Engine) -> Uuid {
    let center = engine
        .save_cost_center("Household", None, None, 0, 0)
        .await
        .unwrap();
    engine
        .save_movement_class("Card spending", ClassType::Out, center.id, 0)
        .await
        .unwrap()
        .id
}

/// Creates a movement in the period and settles it on the card.
async fn credit_purchase(
    engine: &Engine,
    period_id: Uuid,
    class_id: Uuid,
    card_id: Uuid,
    description: &str,
    value: i64,
    day: u32,
) -> Movement {
    let movement = engine
        .save_movement(&MovementDraft {
            description: description.to_string(),
            value,
            due_date: date(2026, 3, day),
            financial_period_id: period_id,
            apportionments: vec![ApportionmentDraft {
                movement_class_id: class_id,
                value,
            }],
        })
        .await
        .unwrap();
    engine
        .pay_movement(
            movement.id,
            &PaymentDraft {
                paid_on: date(2026, 3, day),
                method: PaymentMethod::CreditCard,
                wallet_id: None,
                card_id: Some(card_id),
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn invoice_collects_uninvoiced_credit_movements() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let class = expense_class(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 500_00).await.unwrap();
    let card = engine
        .save_card("Platinum", CardType::Credit, None, None)
        .await
        .unwrap();
    let other_card = engine
        .save_card("Gold", CardType::Credit, None, None)
        .await
        .unwrap();

    credit_purchase(&engine, period.id, class, card.id, "Online order", 60_00, 5).await;
    credit_purchase(&engine, period.id, class, card.id, "Streaming", 40_00, 12).await;
    // On another card, must stay out of this invoice.
    credit_purchase(&engine, period.id, class, other_card.id, "Fuel", 70_00, 8).await;
    // Cash payments never join an invoice.
    let cash = engine
        .save_movement(&MovementDraft {
            description: "Market".to_string(),
            value: 30_00,
            due_date: date(2026, 3, 9),
            financial_period_id: period.id,
            apportionments: vec![ApportionmentDraft {
                movement_class_id: class,
                value: 30_00,
            }],
        })
        .await
        .unwrap();
    engine
        .pay_movement(
            cash.id,
            &PaymentDraft {
                paid_on: date(2026, 3, 9),
                method: PaymentMethod::Cash,
                wallet_id: Some(wallet.id),
                card_id: None,
            },
        )
        .await
        .unwrap();

    let invoice = engine
        .create_card_invoice(card.id, period.id, class)
        .await
        .unwrap();

    assert_eq!(invoice.identification, "Platinum 03/2026");
    assert_eq!(invoice.total, 100_00);

    let members = engine
        .list_movements_by_card_invoice(invoice.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|member| {
        member.card_invoice_id == Some(invoice.id) && !member.card_invoice_paid
    }));

    let consolidated = engine
        .find_movement_by_id(invoice.movement_id.unwrap())
        .await
        .unwrap();
    assert_eq!(consolidated.description, "Platinum 03/2026");
    assert_eq!(consolidated.value, 100_00);
    assert_eq!(consolidated.due_date, period.ends_on);
    assert_eq!(consolidated.state, MovementState::Open);

    let found = engine
        .find_card_invoice_by_movement(consolidated.id)
        .await
        .unwrap();
    assert_eq!(found, Some(invoice.clone()));

    let err = engine
        .create_card_invoice(card.id, period.id, class)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("card-invoice.validate.duplicated"));
}

#[tokio::test]
async fn invoice_needs_at_least_one_member() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let class = expense_class(&engine).await;
    let card = engine
        .save_card("Platinum", CardType::Credit, None, None)
        .await
        .unwrap();

    let err = engine
        .create_card_invoice(card.id, period.id, class)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("card-invoice.validate.empty"));
}

#[tokio::test]
async fn paying_the_invoice_locks_its_members() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let class = expense_class(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 500_00).await.unwrap();
    let card = engine
        .save_card("Platinum", CardType::Credit, None, None)
        .await
        .unwrap();

    let member = credit_purchase(&engine, period.id, class, card.id, "Online order", 60_00, 5).await;
    let invoice = engine
        .create_card_invoice(card.id, period.id, class)
        .await
        .unwrap();

    engine
        .pay_movement(
            invoice.movement_id.unwrap(),
            &PaymentDraft {
                paid_on: date(2026, 4, 5),
                method: PaymentMethod::Cash,
                wallet_id: Some(wallet.id),
                card_id: None,
            },
        )
        .await
        .unwrap();

    let wallet = engine.find_wallet_by_id(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, 440_00);

    let member = engine.find_movement_by_id(member.id).await.unwrap();
    assert!(member.card_invoice_paid);

    let err = engine.delete_movement(member.id).await.unwrap_err();
    assert_eq!(err, EngineError::violation("movement.validate.has-card-invoice"));
}

#[tokio::test]
async fn deleting_the_invoice_movement_detaches_members() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let class = expense_class(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 200_00).await.unwrap();
    let card = engine
        .save_card("Platinum", CardType::Credit, None, None)
        .await
        .unwrap();

    let member = credit_purchase(&engine, period.id, class, card.id, "Online order", 100_00, 5).await;
    let invoice = engine
        .create_card_invoice(card.id, period.id, class)
        .await
        .unwrap();
    let consolidated_id = invoice.movement_id.unwrap();

    engine
        .pay_movement(
            consolidated_id,
            &PaymentDraft {
                paid_on: date(2026, 4, 5),
                method: PaymentMethod::Cash,
                wallet_id: Some(wallet.id),
                card_id: None,
            },
        )
        .await
        .unwrap();
    engine.delete_card_invoice_movement(consolidated_id).await.unwrap();

    // The paid value came back to the wallet.
    let wallet = engine.find_wallet_by_id(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, 200_00);
    let history = engine.list_wallet_balances(wallet.id).await.unwrap();
    assert!(history
        .iter()
        .any(|row| row.balance_type == BalanceType::BalanceReturn && row.moved_value == 100_00));

    let member = engine.find_movement_by_id(member.id).await.unwrap();
    assert_eq!(member.card_invoice_id, None);
    assert!(!member.card_invoice_paid);

    let err = engine.find_movement_by_id(consolidated_id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert_eq!(
        engine.find_card_invoice_by_movement(consolidated_id).await.unwrap(),
        None
    );
    assert!(engine.list_card_invoices_by_card(card.id).await.unwrap().is_empty());

    // Detached members can be removed normally again.
    engine.delete_movement(member.id).await.unwrap();
}
