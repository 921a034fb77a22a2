use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, FinancialPeriod, ResultEngine, financial_periods, movements,
    movements::MovementState,
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Opens a financial period.
    ///
    /// The window must be ordered, the identification unique, and the window
    /// must not overlap any other open period.
    pub async fn open_financial_period(
        &self,
        identification: &str,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> ResultEngine<FinancialPeriod> {
        let identification =
            normalize_required_name(identification, "financial period identification")?;
        if starts_on >= ends_on {
            return Err(EngineError::violation(
                "financial-period.validate.invalid-dates",
            ));
        }
        with_tx!(self, |db_tx| {
            let exists = financial_periods::Entity::find()
                .filter(Expr::cust("LOWER(identification)").eq(identification.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::violation(
                    "financial-period.validate.duplicated",
                ));
            }

            let overlapping = financial_periods::Entity::find()
                .filter(financial_periods::Column::Closed.eq(false))
                .filter(financial_periods::Column::StartsOn.lte(ends_on))
                .filter(financial_periods::Column::EndsOn.gte(starts_on))
                .one(&db_tx)
                .await?
                .is_some();
            if overlapping {
                return Err(EngineError::violation("financial-period.validate.overlap"));
            }

            let period = FinancialPeriod::new(identification, starts_on, ends_on);
            financial_periods::ActiveModel::from(&period)
                .insert(&db_tx)
                .await?;
            Ok(period)
        })
    }

    /// Closes a financial period, freezing its movements.
    ///
    /// Every movement of the period must be paid before the close goes
    /// through.
    pub async fn close_financial_period(
        &self,
        financial_period_id: Uuid,
    ) -> ResultEngine<FinancialPeriod> {
        with_tx!(self, |db_tx| {
            let model = self.require_period(&db_tx, financial_period_id).await?;
            if model.closed {
                return Err(EngineError::violation(
                    "financial-period.validate.already-closed",
                ));
            }

            let open_movements = movements::Entity::find()
                .filter(movements::Column::FinancialPeriodId.eq(financial_period_id.to_string()))
                .filter(movements::Column::State.eq(MovementState::Open.as_str()))
                .all(&db_tx)
                .await?
                .len();
            if open_movements > 0 {
                return Err(EngineError::violation_with(
                    "financial-period.validate.open-movements",
                    vec![open_movements.to_string()],
                ));
            }

            let active = financial_periods::ActiveModel {
                id: ActiveValue::Set(financial_period_id.to_string()),
                closed: ActiveValue::Set(true),
                closed_at: ActiveValue::Set(Some(Utc::now())),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            let period = FinancialPeriod::try_from(model)?;
            Ok(period)
        })
    }

    pub async fn find_financial_period_by_id(
        &self,
        financial_period_id: Uuid,
    ) -> ResultEngine<FinancialPeriod> {
        with_tx!(self, |db_tx| {
            let model = self.require_period(&db_tx, financial_period_id).await?;
            FinancialPeriod::try_from(model)
        })
    }

    /// The open period that started most recently, if any.
    pub async fn find_active_financial_period(&self) -> ResultEngine<Option<FinancialPeriod>> {
        with_tx!(self, |db_tx| {
            let model = financial_periods::Entity::find()
                .filter(financial_periods::Column::Closed.eq(false))
                .order_by_desc(financial_periods::Column::StartsOn)
                .one(&db_tx)
                .await?;
            model.map(FinancialPeriod::try_from).transpose()
        })
    }

    /// Lists periods newest first, optionally only open or closed ones.
    pub async fn list_financial_periods(
        &self,
        closed: Option<bool>,
    ) -> ResultEngine<Vec<FinancialPeriod>> {
        with_tx!(self, |db_tx| {
            let mut query = financial_periods::Entity::find()
                .order_by_desc(financial_periods::Column::StartsOn);
            if let Some(closed) = closed {
                query = query.filter(financial_periods::Column::Closed.eq(closed));
            }
            let models = query.all(&db_tx).await?;
            models.into_iter().map(FinancialPeriod::try_from).collect()
        })
    }
}
