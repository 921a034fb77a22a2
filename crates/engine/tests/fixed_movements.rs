use chrono::NaiveDate;
use uuid::Uuid;

use engine::{
    ApportionmentDraft, ClassType, Engine, EngineError, FinancialPeriod, FixedMovementDraft,
    FixedMovementState, MovementState,
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
        .save_movement_class("Recurring", ClassType::Out, center.id, 0)
        .await
        .unwrap()
        .id
}

fn template(
    identification: &str,
    value: i64,
    installments: Option<i32>,
    auto_launch: bool,
    class_id: Uuid,
) -> FixedMovementDraft {
    FixedMovementDraft {
        identification: identification.to_string(),
        description: format!("{identification} every month"),
        value,
        installments,
        auto_launch,
        apportionments: vec![ApportionmentDraft {
            movement_class_id: class_id,
            value,
        }],
    }
}

#[tokio::test]
async fn template_saves_with_its_splits() {
    let (engine, _db) = engine_with_db().await;
    let class = expense_class(&engine).await;

    let fixed = engine
        .save_fixed_movement(&template("Rent", 900_00, Some(12), true, class))
        .await
        .unwrap();

    assert_eq!(fixed.state, FixedMovementState::Active);
    assert_eq!(fixed.apportionments.len(), 1);
    assert_eq!(fixed.apportionments[0].value, 900_00);

    let found = engine.find_fixed_movement_by_id(fixed.id).await.unwrap();
    assert_eq!(found.identification, "Rent");
    assert_eq!(found.installments, Some(12));
    assert_eq!(found.apportionments.len(), 1);

    let mut broken = template("Loan", 500_00, None, false, class);
    broken.apportionments[0].value = 300_00;
    let err = engine.save_fixed_movement(&broken).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::violation_with(
            "movement.validate.apportionment-value",
            vec!["2.00".to_string()]
        )
    );
}

#[tokio::test]
async fn launches_number_quotes_in_order() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let class = expense_class(&engine).await;
    let fixed = engine
        .save_fixed_movement(&template("Rent", 900_00, Some(3), false, class))
        .await
        .unwrap();

    let first = engine
        .launch_fixed_movement(fixed.id, period.id)
        .await
        .unwrap();
    assert_eq!(first.description, "Rent 1/3");
    assert_eq!(first.value, 900_00);
    assert_eq!(first.due_date, period.ends_on);
    assert_eq!(first.state, MovementState::Open);
    assert_eq!(first.apportionments.len(), 1);

    let second = engine
        .launch_fixed_movement(fixed.id, period.id)
        .await
        .unwrap();
    assert_eq!(second.description, "Rent 2/3");

    assert_eq!(engine.last_launch_quote(fixed.id).await.unwrap(), 2);

    let launches = engine.list_launches_for(fixed.id).await.unwrap();
    assert_eq!(launches.len(), 2);
    assert_eq!(launches[0].quote_number, 1);
    assert_eq!(launches[0].movement_id, first.id);
    assert_eq!(launches[1].quote_number, 2);
    assert_eq!(launches[1].movement_id, second.id);
}

#[tokio::test]
async fn template_finishes_on_the_last_installment() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let class = expense_class(&engine).await;
    let fixed = engine
        .save_fixed_movement(&template("Loan", 200_00, Some(2), false, class))
        .await
        .unwrap();

    engine.launch_fixed_movement(fixed.id, period.id).await.unwrap();
    let found = engine.find_fixed_movement_by_id(fixed.id).await.unwrap();
    assert_eq!(found.state, FixedMovementState::Active);

    engine.launch_fixed_movement(fixed.id, period.id).await.unwrap();
    let found = engine.find_fixed_movement_by_id(fixed.id).await.unwrap();
    assert_eq!(found.state, FixedMovementState::Finished);

    let err = engine
        .launch_fixed_movement(fixed.id, period.id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("fixed-movement.validate.finished"));
}

#[tokio::test]
async fn open_ended_templates_never_finish() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let class = expense_class(&engine).await;
    let fixed = engine
        .save_fixed_movement(&template("Gym", 45_00, None, false, class))
        .await
        .unwrap();

    for _ in 0..3 {
        engine.launch_fixed_movement(fixed.id, period.id).await.unwrap();
    }

    let found = engine.find_fixed_movement_by_id(fixed.id).await.unwrap();
    assert_eq!(found.state, FixedMovementState::Active);
    assert_eq!(engine.last_launch_quote(fixed.id).await.unwrap(), 3);

    let launches = engine.list_launches_for(fixed.id).await.unwrap();
    let third = engine
        .find_movement_by_id(launches[2].movement_id)
        .await
        .unwrap();
    assert_eq!(third.description, "Gym 3");
}

#[tokio::test]
async fn launching_into_a_closed_period_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let class = expense_class(&engine).await;
    let fixed = engine
        .save_fixed_movement(&template("Rent", 900_00, None, false, class))
        .await
        .unwrap();

    engine.close_financial_period(period.id).await.unwrap();

    let err = engine
        .launch_fixed_movement(fixed.id, period.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::violation("financial-period.validate.already-closed")
    );
}

#[tokio::test]
async fn auto_launch_raises_only_active_auto_templates() {
    let (engine, _db) = engine_with_db().await;
    let period = open_period(&engine).await;
    let class = expense_class(&engine).await;

    let rent = engine
        .save_fixed_movement(&template("Rent", 900_00, None, true, class))
        .await
        .unwrap();
    // Manual template, skipped by the auto pass.
    engine
        .save_fixed_movement(&template("Gym", 45_00, None, false, class))
        .await
        .unwrap();
    // Single installment, finished before the auto pass runs.
    let loan = engine
        .save_fixed_movement(&template("Loan", 200_00, Some(1), true, class))
        .await
        .unwrap();
    engine.launch_fixed_movement(loan.id, period.id).await.unwrap();

    let launched = engine
        .launch_auto_fixed_movements(period.id)
        .await
        .unwrap();
    assert_eq!(launched, 1);
    assert_eq!(engine.last_launch_quote(rent.id).await.unwrap(), 1);

    // The pass can run again for the next cycle.
    let launched = engine
        .launch_auto_fixed_movements(period.id)
        .await
        .unwrap();
    assert_eq!(launched, 1);
    assert_eq!(engine.last_launch_quote(rent.id).await.unwrap(), 2);

    let movements = engine.list_movements_by_period(period.id).await.unwrap();
    let descriptions: Vec<&str> = movements
        .iter()
        .map(|movement| movement.description.as_str())
        .collect();
    assert!(descriptions.contains(&"Rent 1"));
    assert!(descriptions.contains(&"Rent 2"));
    assert!(descriptions.contains(&"Loan 1/1"));
    assert!(!descriptions.iter().any(|text| text.starts_with("Gym")));
}
