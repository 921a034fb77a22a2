//! The module contains `FinancialPeriod` struct and its implementation.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// A financial period.
///
/// A period is a closable time window bounding editable movements. Once
/// closed, its movements are immutable for structural edits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub id: Uuid,
    pub identification: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub closed: bool,
    pub closed_at: Option<DateTime<Utc>>,
}

impl FinancialPeriod {
    pub fn new(identification: String, starts_on: NaiveDate, ends_on: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            identification,
            starts_on,
            ends_on,
            closed: false,
            closed_at: None,
        }
    }

    /// Whether a calendar date falls inside the period window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.starts_on && date <= self.ends_on
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "financial_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub identification: String,
    pub starts_on: Date,
    pub ends_on: Date,
    pub closed: bool,
    pub closed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
    #[sea_orm(has_many = "super::card_invoices::Entity")]
    CardInvoices,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl Related<super::card_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FinancialPeriod> for ActiveModel {
    fn from(value: &FinancialPeriod) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            identification: ActiveValue::Set(value.identification.clone()),
            starts_on: ActiveValue::Set(value.starts_on),
            ends_on: ActiveValue::Set(value.ends_on),
            closed: ActiveValue::Set(value.closed),
            closed_at: ActiveValue::Set(value.closed_at),
        }
    }
}

impl TryFrom<Model> for FinancialPeriod {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| {
                EngineError::KeyNotFound("financial period not exists".to_string())
            })?,
            identification: model.identification,
            starts_on: model.starts_on,
            ends_on: model.ends_on,
            closed: model.closed,
            closed_at: model.closed_at,
        })
    }
}
