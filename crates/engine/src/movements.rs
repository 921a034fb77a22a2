//! Movement primitives.
//!
//! A `Movement` is a single income or expense record living inside a
//! financial period; its value is split across movement classes by
//! `Apportionment`s.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, apportionments::Apportionment};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementState {
    Open,
    Paid,
}

impl MovementState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Paid => "paid",
        }
    }
}

impl TryFrom<&str> for MovementState {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::InvalidValue(format!(
                "invalid movement state: {other}"
            ))),
        }
    }
}

/// A single financial movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    /// Short human identifier used in logs and balance history.
    pub code: String,
    pub description: String,
    pub value: i64,
    pub due_date: NaiveDate,
    pub state: MovementState,
    pub financial_period_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub card_invoice_id: Option<Uuid>,
    /// Set when the owning card invoice's consolidated movement was paid.
    pub card_invoice_paid: bool,
    pub created_at: DateTime<Utc>,
    pub apportionments: Vec<Apportionment>,
}

impl Movement {
    pub fn new(
        code: String,
        description: String,
        value: i64,
        due_date: NaiveDate,
        financial_period_id: Uuid,
    ) -> ResultEngine<Self> {
        if value <= 0 {
            return Err(EngineError::InvalidValue(
                "movement value must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            code,
            description,
            value,
            due_date,
            state: MovementState::Open,
            financial_period_id,
            payment_id: None,
            card_invoice_id: None,
            card_invoice_paid: false,
            created_at: Utc::now(),
            apportionments: Vec::new(),
        })
    }

    pub fn is_paid(&self) -> bool {
        self.state == MovementState::Paid
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub value: i64,
    pub due_date: Date,
    pub state: String,
    pub financial_period_id: String,
    pub payment_id: Option<String>,
    pub card_invoice_id: Option<String>,
    pub card_invoice_paid: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::financial_periods::Entity",
        from = "Column::FinancialPeriodId",
        to = "super::financial_periods::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    FinancialPeriods,
    #[sea_orm(
        belongs_to = "super::payments::Entity",
        from = "Column::PaymentId",
        to = "super::payments::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Payments,
    #[sea_orm(has_many = "super::apportionments::Entity")]
    Apportionments,
}

impl Related<super::financial_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialPeriods.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::apportionments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Apportionments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Movement> for ActiveModel {
    fn from(value: &Movement) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            code: ActiveValue::Set(value.code.clone()),
            description: ActiveValue::Set(value.description.clone()),
            value: ActiveValue::Set(value.value),
            due_date: ActiveValue::Set(value.due_date),
            state: ActiveValue::Set(value.state.as_str().to_string()),
            financial_period_id: ActiveValue::Set(value.financial_period_id.to_string()),
            payment_id: ActiveValue::Set(value.payment_id.map(|id| id.to_string())),
            card_invoice_id: ActiveValue::Set(value.card_invoice_id.map(|id| id.to_string())),
            card_invoice_paid: ActiveValue::Set(value.card_invoice_paid),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("movement not exists".to_string()))?,
            code: model.code,
            description: model.description,
            value: model.value,
            due_date: model.due_date,
            state: MovementState::try_from(model.state.as_str())?,
            financial_period_id: Uuid::parse_str(&model.financial_period_id).map_err(|_| {
                EngineError::KeyNotFound("financial period not exists".to_string())
            })?,
            payment_id: model.payment_id.and_then(|s| Uuid::parse_str(&s).ok()),
            card_invoice_id: model.card_invoice_id.and_then(|s| Uuid::parse_str(&s).ok()),
            card_invoice_paid: model.card_invoice_paid,
            created_at: model.created_at,
            apportionments: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_value() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let err = Movement::new(
            "000001".to_string(),
            "Rent".to_string(),
            0,
            due,
            Uuid::new_v4(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            EngineError::InvalidValue("movement value must be > 0".to_string())
        );
    }
}
