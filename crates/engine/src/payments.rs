//! The module contains `Payment` struct and its implementation.

use chrono::NaiveDate;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// How a movement was settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    DebitCard,
    CreditCard,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::DebitCard => "debit_card",
            Self::CreditCard => "credit_card",
        }
    }

    /// Whether this method moves a wallet balance at payment time.
    ///
    /// Credit card payments do not; they settle later through the card
    /// invoice.
    pub fn touches_wallet(self) -> bool {
        matches!(self, Self::Cash | Self::DebitCard)
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "debit_card" => Ok(Self::DebitCard),
            "credit_card" => Ok(Self::CreditCard),
            other => Err(EngineError::InvalidValue(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

/// A settlement record for one movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub paid_on: NaiveDate,
    pub method: PaymentMethod,
    /// Set for cash payments.
    pub wallet_id: Option<Uuid>,
    /// Set for card payments.
    pub card_id: Option<Uuid>,
}

impl Payment {
    pub fn new(
        paid_on: NaiveDate,
        method: PaymentMethod,
        wallet_id: Option<Uuid>,
        card_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            paid_on,
            method,
            wallet_id,
            card_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub paid_on: Date,
    pub method: String,
    pub wallet_id: Option<String>,
    pub card_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
    #[sea_orm(
        belongs_to = "super::cards::Entity",
        from = "Column::CardId",
        to = "super::cards::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Cards,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payment> for ActiveModel {
    fn from(value: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            paid_on: ActiveValue::Set(value.paid_on),
            method: ActiveValue::Set(value.method.as_str().to_string()),
            wallet_id: ActiveValue::Set(value.wallet_id.map(|id| id.to_string())),
            card_id: ActiveValue::Set(value.card_id.map(|id| id.to_string())),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("payment not exists".to_string()))?,
            paid_on: model.paid_on,
            method: PaymentMethod::try_from(model.method.as_str())?,
            wallet_id: model.wallet_id.and_then(|s| Uuid::parse_str(&s).ok()),
            card_id: model.card_id.and_then(|s| Uuid::parse_str(&s).ok()),
        })
    }
}
