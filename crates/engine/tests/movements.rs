use chrono::NaiveDate;
use uuid::Uuid;

use engine::{
    ApportionmentDraft, BalanceType, CardType, ClassType, Engine, EngineError, FinancialPeriod,
    MovementDraft, MovementFilter, MovementState, PageRequest, PaymentDraft, PaymentMethod,
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

/// A cost center without budget control plus one class per direction.
async fn classes(engine: &Engine) -> (Uuid, Uuid) {
    let center = engine
        .save_cost_center("Household", None, None, 0, 0)
        .await
        .unwrap();
    let groceries = engine
        .save_movement_class("Groceries", ClassType::Out, center.id, 0)
        .await
        .unwrap();
    let salary = engine
        .save_movement_class("Salary", ClassType::In, center.id, 0)
        .await
        .unwrap();
    (groceries.id, salary.id)
}

fn draft(
    description: &str,
    value: i64,
    due_date: NaiveDate,
    financial_period_id: Uuid,
    splits: &[(Uuid, i64)],
) -> MovementDraft {
    MovementDraft {
        description: description.to_string(),
        value,
        due_date,
        financial_period_id,
        apportionments: splits
            .iter()
            .map(|(movement_class_id, value)| ApportionmentDraft {
                movement_class_id: *movement_class_id,
                value: *value,
            })
            .collect(),
    }
}

fn cash(wallet_id: Uuid) -> PaymentDraft {
    PaymentDraft {
        paid_on: date(2026, 3, 10),
        method: PaymentMethod::Cash,
        wallet_id: Some(wallet_id),
        card_id: None,
    }
}

#[tokio::test]
async fn split_sum_must_match_the_movement_value() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;

    let err = engine
        .save_movement(&draft(
            "Market",
            100_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 60_00)],
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::violation_with(
            "movement.validate.apportionment-value",
            vec!["40.00".to_string()]
        )
    );

    let err = engine
        .save_movement(&draft("Market", 100_00, date(2026, 3, 10), period.id, &[]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::violation("movement.validate.empty-apportionment")
    );
}

#[tokio::test]
async fn saved_movement_gets_a_code_and_starts_open() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, salary) = classes(&engine).await;

    let movement = engine
        .save_movement(&draft(
            "Mixed entry",
            100_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 70_00), (salary, 30_00)],
        ))
        .await
        .unwrap();

    assert!(!movement.code.is_empty());
    assert_eq!(movement.state, MovementState::Open);
    assert_eq!(movement.apportionments.len(), 2);
    assert!(movement.payment_id.is_none());

    let found = engine.find_movement_by_id(movement.id).await.unwrap();
    assert_eq!(found.code, movement.code);
    assert_eq!(found.value, 100_00);
    assert_eq!(found.due_date, date(2026, 3, 10));
    assert_eq!(found.apportionments.len(), 2);
}

#[tokio::test]
async fn update_rewrites_the_split_set() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, salary) = classes(&engine).await;

    let movement = engine
        .save_movement(&draft(
            "Market",
            100_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 100_00)],
        ))
        .await
        .unwrap();

    let updated = engine
        .update_movement(
            movement.id,
            &draft(
                "Market and refund",
                120_00,
                date(2026, 3, 12),
                period.id,
                &[(groceries, 90_00), (salary, 30_00)],
            ),
        )
        .await
        .unwrap();

    assert_eq!(updated.description, "Market and refund");
    assert_eq!(updated.value, 120_00);
    assert_eq!(updated.due_date, date(2026, 3, 12));
    assert_eq!(updated.apportionments.len(), 2);
    // The code never changes on edit.
    assert_eq!(updated.code, movement.code);
}

#[tokio::test]
async fn cash_expense_payment_debits_the_wallet() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 200_00).await.unwrap();

    let movement = engine
        .save_movement(&draft(
            "Market",
            80_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 80_00)],
        ))
        .await
        .unwrap();

    let mut events = engine.subscribe_balance_changes();
    let paid = engine.pay_movement(movement.id, &cash(wallet.id)).await.unwrap();

    assert_eq!(paid.state, MovementState::Paid);
    assert!(paid.payment_id.is_some());

    let wallet = engine.find_wallet_by_id(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, 120_00);

    let history = engine.list_wallet_balances(wallet.id).await.unwrap();
    let entry = history
        .iter()
        .find(|row| row.balance_type == BalanceType::Payment)
        .unwrap();
    assert_eq!(entry.moved_value, -80_00);
    assert_eq!(entry.actual_balance, 120_00);
    assert_eq!(entry.movement_code.as_deref(), Some(paid.code.as_str()));

    let event = events.recv().await.unwrap();
    assert_eq!(event.wallet_id, wallet.id);
    assert_eq!(event.new_balance, 120_00);
    assert_eq!(event.movement_code.as_deref(), Some(paid.code.as_str()));
}

#[tokio::test]
async fn cash_revenue_payment_credits_the_wallet() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (_, salary) = classes(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 100_00).await.unwrap();

    let movement = engine
        .save_movement(&draft(
            "March salary",
            50_00,
            date(2026, 3, 5),
            period.id,
            &[(salary, 50_00)],
        ))
        .await
        .unwrap();
    engine.pay_movement(movement.id, &cash(wallet.id)).await.unwrap();

    let wallet = engine.find_wallet_by_id(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, 150_00);

    let history = engine.list_wallet_balances(wallet.id).await.unwrap();
    let entry = history
        .iter()
        .find(|row| row.balance_type == BalanceType::Revenue)
        .unwrap();
    assert_eq!(entry.moved_value, 50_00);
}

#[tokio::test]
async fn a_movement_cannot_be_paid_twice() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 200_00).await.unwrap();

    let movement = engine
        .save_movement(&draft(
            "Market",
            80_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 80_00)],
        ))
        .await
        .unwrap();
    engine.pay_movement(movement.id, &cash(wallet.id)).await.unwrap();

    let err = engine
        .pay_movement(movement.id, &cash(wallet.id))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("movement.validate.already-paid"));

    // The failed attempt must not move the wallet again.
    let wallet = engine.find_wallet_by_id(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, 120_00);
}

#[tokio::test]
async fn credit_card_payment_leaves_wallets_alone() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 200_00).await.unwrap();
    let card = engine
        .save_card("Platinum", CardType::Credit, None, None)
        .await
        .unwrap();

    let movement = engine
        .save_movement(&draft(
            "Online order",
            60_00,
            date(2026, 3, 15),
            period.id,
            &[(groceries, 60_00)],
        ))
        .await
        .unwrap();
    let paid = engine
        .pay_movement(
            movement.id,
            &PaymentDraft {
                paid_on: date(2026, 3, 15),
                method: PaymentMethod::CreditCard,
                wallet_id: None,
                card_id: Some(card.id),
            },
        )
        .await
        .unwrap();

    assert_eq!(paid.state, MovementState::Paid);

    let wallet = engine.find_wallet_by_id(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, 200_00);
    let history = engine.list_wallet_balances(wallet.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn debit_card_payment_uses_the_card_wallet() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 300_00).await.unwrap();
    let card = engine
        .save_card("Everyday", CardType::Debit, None, Some(wallet.id))
        .await
        .unwrap();

    let movement = engine
        .save_movement(&draft(
            "Market",
            80_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 80_00)],
        ))
        .await
        .unwrap();
    engine
        .pay_movement(
            movement.id,
            &PaymentDraft {
                paid_on: date(2026, 3, 10),
                method: PaymentMethod::DebitCard,
                wallet_id: None,
                card_id: Some(card.id),
            },
        )
        .await
        .unwrap();

    let wallet = engine.find_wallet_by_id(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, 220_00);
}

#[tokio::test]
async fn debit_card_without_wallet_cannot_pay() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;
    let card = engine
        .save_card("Orphan", CardType::Debit, None, None)
        .await
        .unwrap();

    let movement = engine
        .save_movement(&draft(
            "Market",
            80_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 80_00)],
        ))
        .await
        .unwrap();
    let err = engine
        .pay_movement(
            movement.id,
            &PaymentDraft {
                paid_on: date(2026, 3, 10),
                method: PaymentMethod::DebitCard,
                wallet_id: None,
                card_id: Some(card.id),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("card.validate.no-wallet"));

    let movement = engine.find_movement_by_id(movement.id).await.unwrap();
    assert_eq!(movement.state, MovementState::Open);
}

#[tokio::test]
async fn payment_method_requires_its_instrument() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;

    let movement = engine
        .save_movement(&draft(
            "Market",
            80_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 80_00)],
        ))
        .await
        .unwrap();

    let err = engine
        .pay_movement(
            movement.id,
            &PaymentDraft {
                paid_on: date(2026, 3, 10),
                method: PaymentMethod::Cash,
                wallet_id: None,
                card_id: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("payment.validate.missing-wallet"));

    for method in [PaymentMethod::DebitCard, PaymentMethod::CreditCard] {
        let err = engine
            .pay_movement(
                movement.id,
                &PaymentDraft {
                    paid_on: date(2026, 3, 10),
                    method,
                    wallet_id: None,
                    card_id: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::violation("payment.validate.missing-card"));
    }
}

#[tokio::test]
async fn deleting_a_paid_cash_movement_returns_the_money() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 200_00).await.unwrap();

    let movement = engine
        .save_movement(&draft(
            "Market",
            80_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 80_00)],
        ))
        .await
        .unwrap();
    engine.pay_movement(movement.id, &cash(wallet.id)).await.unwrap();
    engine.delete_movement(movement.id).await.unwrap();

    let wallet = engine.find_wallet_by_id(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, 200_00);

    let history = engine.list_wallet_balances(wallet.id).await.unwrap();
    let entry = history
        .iter()
        .find(|row| row.balance_type == BalanceType::BalanceReturn)
        .unwrap();
    assert_eq!(entry.moved_value, 80_00);

    let err = engine.find_movement_by_id(movement.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn movements_of_a_closed_period_are_immutable() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 200_00).await.unwrap();

    let movement = engine
        .save_movement(&draft(
            "Market",
            80_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 80_00)],
        ))
        .await
        .unwrap();
    engine.pay_movement(movement.id, &cash(wallet.id)).await.unwrap();
    engine.close_financial_period(period.id).await.unwrap();

    let err = engine
        .update_movement(
            movement.id,
            &draft(
                "Edited",
                80_00,
                date(2026, 3, 10),
                period.id,
                &[(groceries, 80_00)],
            ),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::violation("movement.validate.closed-financial-period")
    );

    let err = engine.delete_movement(movement.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::violation("movement.validate.closed-financial-period")
    );
}

#[tokio::test]
async fn filter_matches_text_state_and_direction() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, salary) = classes(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 0).await.unwrap();

    engine
        .save_movement(&draft(
            "Groceries run",
            50_00,
            date(2026, 3, 8),
            period.id,
            &[(groceries, 50_00)],
        ))
        .await
        .unwrap();
    let income = engine
        .save_movement(&draft(
            "March salary",
            3000_00,
            date(2026, 3, 5),
            period.id,
            &[(salary, 3000_00)],
        ))
        .await
        .unwrap();
    engine.pay_movement(income.id, &cash(wallet.id)).await.unwrap();

    let by_text = engine
        .list_movements_by_filter(
            &MovementFilter {
                text: Some("salary".to_string()),
                ..Default::default()
            },
            PageRequest::new(0, 10),
        )
        .await
        .unwrap();
    assert_eq!(by_text.items.len(), 1);
    assert_eq!(by_text.items[0].description, "March salary");

    let by_state = engine
        .list_movements_by_filter(
            &MovementFilter {
                state: Some(MovementState::Paid),
                ..Default::default()
            },
            PageRequest::new(0, 10),
        )
        .await
        .unwrap();
    assert_eq!(by_state.items.len(), 1);
    assert_eq!(by_state.items[0].id, income.id);

    let by_direction = engine
        .list_movements_by_filter(
            &MovementFilter {
                direction: Some(ClassType::In),
                ..Default::default()
            },
            PageRequest::new(0, 10),
        )
        .await
        .unwrap();
    assert_eq!(by_direction.items.len(), 1);
    assert_eq!(by_direction.items[0].id, income.id);
}

#[tokio::test]
async fn filter_pages_newest_due_date_first() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;

    for day in [5, 10, 15] {
        engine
            .save_movement(&draft(
                &format!("Entry {day}"),
                10_00,
                date(2026, 3, day),
                period.id,
                &[(groceries, 10_00)],
            ))
            .await
            .unwrap();
    }

    let first = engine
        .list_movements_by_filter(&MovementFilter::default(), PageRequest::new(0, 2))
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);
    assert!(first.has_more);
    assert_eq!(first.items[0].due_date, date(2026, 3, 15));
    assert_eq!(first.items[1].due_date, date(2026, 3, 10));

    let second = engine
        .list_movements_by_filter(&MovementFilter::default(), PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(!second.has_more);
    assert_eq!(second.items[0].due_date, date(2026, 3, 5));
}

#[tokio::test]
async fn due_date_listing_optionally_includes_overdue() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let (groceries, _) = classes(&engine).await;
    let wallet = engine.save_wallet("Checking", None, 100_00).await.unwrap();

    let early = engine
        .save_movement(&draft(
            "Water bill",
            20_00,
            date(2026, 3, 5),
            period.id,
            &[(groceries, 20_00)],
        ))
        .await
        .unwrap();
    engine
        .save_movement(&draft(
            "Power bill",
            30_00,
            date(2026, 3, 8),
            period.id,
            &[(groceries, 30_00)],
        ))
        .await
        .unwrap();
    engine
        .save_movement(&draft(
            "Rent",
            40_00,
            date(2026, 3, 10),
            period.id,
            &[(groceries, 40_00)],
        ))
        .await
        .unwrap();

    let exact = engine
        .list_movements_by_due_date(date(2026, 3, 10), false)
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].description, "Rent");

    let with_overdue = engine
        .list_movements_by_due_date(date(2026, 3, 10), true)
        .await
        .unwrap();
    assert_eq!(with_overdue.len(), 3);

    // Paid movements drop out of the due listing.
    engine.pay_movement(early.id, &cash(wallet.id)).await.unwrap();
    let with_overdue = engine
        .list_movements_by_due_date(date(2026, 3, 10), true)
        .await
        .unwrap();
    assert_eq!(with_overdue.len(), 2);
}
