use engine::{ClassType, EngineError};

mod common;

use common::engine_with_db;

#[tokio::test]
async fn classes_cannot_exceed_the_cost_center_ceiling() {
    let (engine, _db) = engine_with_db().await;
    let center = engine
        .save_cost_center("Household", None, None, 0, 100_00)
        .await
        .unwrap();

    engine
        .save_movement_class("Groceries", ClassType::Out, center.id, 60_00)
        .await
        .unwrap();

    let err = engine
        .save_movement_class("Utilities", ClassType::Out, center.id, 50_00)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::violation_with(
            "movement-class.validate.no-budget",
            vec!["40.00".to_string()]
        )
    );

    engine
        .save_movement_class("Utilities", ClassType::Out, center.id, 40_00)
        .await
        .unwrap();
}

#[tokio::test]
async fn ceiling_applies_per_direction() {
    let (engine, _db) = engine_with_db().await;
    let center = engine
        .save_cost_center("Household", None, None, 50_00, 100_00)
        .await
        .unwrap();

    engine
        .save_movement_class("Rent", ClassType::Out, center.id, 100_00)
        .await
        .unwrap();

    // The expenses ceiling is spent but revenues are checked on their own.
    engine
        .save_movement_class("Salary", ClassType::In, center.id, 50_00)
        .await
        .unwrap();
}

#[tokio::test]
async fn zero_ceiling_means_no_budget_control() {
    let (engine, _db) = engine_with_db().await;
    let center = engine
        .save_cost_center("Household", None, None, 0, 0)
        .await
        .unwrap();

    engine
        .save_movement_class("Groceries", ClassType::Out, center.id, 500_00)
        .await
        .unwrap();
}

#[tokio::test]
async fn updating_a_class_excludes_its_own_budget_from_the_check() {
    let (engine, _db) = engine_with_db().await;
    let center = engine
        .save_cost_center("Household", None, None, 0, 100_00)
        .await
        .unwrap();
    let class = engine
        .save_movement_class("Groceries", ClassType::Out, center.id, 100_00)
        .await
        .unwrap();

    // Re-saving with the full ceiling passes because the old budget of the
    // same class does not count against it.
    let updated = engine
        .update_movement_class(class.id, "Groceries", ClassType::Out, center.id, 100_00, false)
        .await
        .unwrap();
    assert_eq!(updated.budget, 100_00);
}

#[tokio::test]
async fn duplicate_name_type_and_center_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let center = engine
        .save_cost_center("Household", None, None, 0, 0)
        .await
        .unwrap();
    engine
        .save_movement_class("Groceries", ClassType::Out, center.id, 0)
        .await
        .unwrap();

    let err = engine
        .save_movement_class("groceries", ClassType::Out, center.id, 0)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::violation("movement-class.validate.duplicated")
    );

    // Same name with the other direction is a different class.
    engine
        .save_movement_class("Groceries", ClassType::In, center.id, 0)
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_cost_center_under_same_parent_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let root = engine
        .save_cost_center("Household", None, None, 0, 0)
        .await
        .unwrap();

    let err = engine
        .save_cost_center("household", None, None, 0, 0)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::violation("cost-center.validate.duplicated"));

    // The same name under a different parent is fine.
    engine
        .save_cost_center("Household", None, Some(root.id), 0, 0)
        .await
        .unwrap();
}

#[tokio::test]
async fn negative_budgets_are_invalid() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .save_cost_center("Household", None, None, -1, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidValue(_)));

    let center = engine
        .save_cost_center("Household", None, None, 0, 0)
        .await
        .unwrap();
    let err = engine
        .save_movement_class("Groceries", ClassType::Out, center.id, -5)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidValue(_)));
}

#[tokio::test]
async fn class_list_by_center_skips_blocked_classes() {
    let (engine, _db) = engine_with_db().await;
    let center = engine
        .save_cost_center("Household", None, None, 0, 0)
        .await
        .unwrap();
    engine
        .save_movement_class("Groceries", ClassType::Out, center.id, 0)
        .await
        .unwrap();
    let blocked = engine
        .save_movement_class("Old class", ClassType::Out, center.id, 0)
        .await
        .unwrap();
    engine
        .update_movement_class(blocked.id, "Old class", ClassType::Out, center.id, 0, true)
        .await
        .unwrap();

    let usable = engine
        .list_movement_classes_by_cost_center_and_type(center.id, ClassType::Out)
        .await
        .unwrap();
    assert_eq!(usable.len(), 1);
    assert_eq!(usable[0].name, "Groceries");
}
