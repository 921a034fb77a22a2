use chrono::NaiveDate;
use uuid::Uuid;

use sea_orm::{DatabaseTransaction, QueryFilter, Statement, TransactionTrait, prelude::*};

use crate::{ClassType, MovementState, ResultEngine, movements};

use super::{Engine, with_tx};

/// Total consumed on one due date for a single direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyUse {
    pub due_date: NaiveDate,
    pub total: i64,
}

/// The numbers behind a financial period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeriodSummary {
    pub open_movements: usize,
    pub paid_movements: usize,
    pub revenues: i64,
    pub expenses: i64,
}

impl PeriodSummary {
    /// Revenues minus expenses.
    pub fn balance(&self) -> i64 {
        self.revenues - self.expenses
    }
}

impl Engine {
    /// Per-due-date totals of a period's movements for one direction.
    pub async fn daily_use(
        &self,
        financial_period_id: Uuid,
        direction: ClassType,
    ) -> ResultEngine<Vec<DailyUse>> {
        with_tx!(self, |db_tx| {
            self.require_period(&db_tx, financial_period_id).await?;

            let stmt = Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                "SELECT m.due_date AS due_date, COALESCE(SUM(a.value), 0) AS total \
                 FROM apportionments a \
                 JOIN movements m ON m.id = a.movement_id \
                 JOIN movement_classes c ON c.id = a.movement_class_id \
                 WHERE m.financial_period_id = ? \
                   AND c.class_type = ? \
                 GROUP BY m.due_date \
                 ORDER BY m.due_date",
                vec![
                    financial_period_id.to_string().into(),
                    direction.as_str().into(),
                ],
            );

            let rows = db_tx.query_all(stmt).await?;
            let mut usage = Vec::with_capacity(rows.len());
            for row in rows {
                usage.push(DailyUse {
                    due_date: row.try_get("", "due_date")?,
                    total: row.try_get("", "total")?,
                });
            }
            Ok(usage)
        })
    }

    /// Open and paid counts plus directional totals of one period.
    pub async fn period_summary(
        &self,
        financial_period_id: Uuid,
    ) -> ResultEngine<PeriodSummary> {
        with_tx!(self, |db_tx| {
            self.require_period(&db_tx, financial_period_id).await?;

            let open_movements = movements::Entity::find()
                .filter(movements::Column::FinancialPeriodId.eq(financial_period_id.to_string()))
                .filter(movements::Column::State.eq(MovementState::Open.as_str()))
                .all(&db_tx)
                .await?
                .len();
            let paid_movements = movements::Entity::find()
                .filter(movements::Column::FinancialPeriodId.eq(financial_period_id.to_string()))
                .filter(movements::Column::State.eq(MovementState::Paid.as_str()))
                .all(&db_tx)
                .await?
                .len();

            let revenues = direction_total(&db_tx, financial_period_id, ClassType::In).await?;
            let expenses = direction_total(&db_tx, financial_period_id, ClassType::Out).await?;

            Ok(PeriodSummary {
                open_movements,
                paid_movements,
                revenues,
                expenses,
            })
        })
    }
}

/// Sums the apportioned values of one direction inside a period.
async fn direction_total(
    db_tx: &DatabaseTransaction,
    financial_period_id: Uuid,
    direction: ClassType,
) -> ResultEngine<i64> {
    let stmt = Statement::from_sql_and_values(
        db_tx.get_database_backend(),
        "SELECT COALESCE(SUM(a.value), 0) AS sum \
         FROM apportionments a \
         JOIN movements m ON m.id = a.movement_id \
         JOIN movement_classes c ON c.id = a.movement_class_id \
         WHERE m.financial_period_id = ? \
           AND c.class_type = ?",
        vec![
            financial_period_id.to_string().into(),
            direction.as_str().into(),
        ],
    );
    let row = db_tx.query_one(stmt).await?;
    Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
}
