//! The module contains `CardInvoice` struct and its implementation.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// A card invoice.
///
/// Groups the credit card movements of one financial period. Raising the
/// invoice creates a consolidated movement for the total; deleting that
/// movement detaches the members and removes the invoice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInvoice {
    pub id: Uuid,
    pub identification: String,
    pub card_id: Uuid,
    pub financial_period_id: Uuid,
    /// The consolidated movement raised for this invoice.
    pub movement_id: Option<Uuid>,
    pub total: i64,
}

impl CardInvoice {
    pub fn new(
        identification: String,
        card_id: Uuid,
        financial_period_id: Uuid,
        total: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identification,
            card_id,
            financial_period_id,
            movement_id: None,
            total,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "card_invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub identification: String,
    pub total: i64,
    pub card_id: String,
    pub financial_period_id: String,
    pub movement_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cards::Entity",
        from = "Column::CardId",
        to = "super::cards::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Cards,
    #[sea_orm(
        belongs_to = "super::financial_periods::Entity",
        from = "Column::FinancialPeriodId",
        to = "super::financial_periods::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    FinancialPeriods,
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cards.def()
    }
}

impl Related<super::financial_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CardInvoice> for ActiveModel {
    fn from(value: &CardInvoice) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            identification: ActiveValue::Set(value.identification.clone()),
            total: ActiveValue::Set(value.total),
            card_id: ActiveValue::Set(value.card_id.to_string()),
            financial_period_id: ActiveValue::Set(value.financial_period_id.to_string()),
            movement_id: ActiveValue::Set(value.movement_id.map(|id| id.to_string())),
        }
    }
}

impl TryFrom<Model> for CardInvoice {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("card invoice not exists".to_string()))?,
            identification: model.identification,
            card_id: Uuid::parse_str(&model.card_id)
                .map_err(|_| EngineError::KeyNotFound("card not exists".to_string()))?,
            financial_period_id: Uuid::parse_str(&model.financial_period_id).map_err(|_| {
                EngineError::KeyNotFound("financial period not exists".to_string())
            })?,
            movement_id: model.movement_id.and_then(|s| Uuid::parse_str(&s).ok()),
            total: model.total,
        })
    }
}
