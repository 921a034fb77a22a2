//! The module contains `Card` struct and its implementation.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Debit,
    Credit,
}

impl CardType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl TryFrom<&str> for CardType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(EngineError::InvalidValue(format!(
                "invalid card type: {other}"
            ))),
        }
    }
}

/// A debit or credit card.
///
/// Debit cards draw directly from their backing wallet when a payment goes
/// through; credit card movements accumulate until they are grouped into a
/// card invoice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub name: String,
    pub card_type: CardType,
    /// Issuer label shown next to the name, for example "Visa".
    pub flag: Option<String>,
    pub wallet_id: Option<Uuid>,
    pub blocked: bool,
}

impl Card {
    pub fn new(
        name: String,
        card_type: CardType,
        flag: Option<String>,
        wallet_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            card_type,
            flag,
            wallet_id,
            blocked: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub card_type: String,
    pub flag: Option<String>,
    pub wallet_id: Option<String>,
    pub blocked: bool,
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
    #[sea_orm(has_many = "super::card_invoices::Entity")]
    CardInvoices,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::card_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Card> for ActiveModel {
    fn from(value: &Card) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            card_type: ActiveValue::Set(value.card_type.as_str().to_string()),
            flag: ActiveValue::Set(value.flag.clone()),
            wallet_id: ActiveValue::Set(value.wallet_id.map(|id| id.to_string())),
            blocked: ActiveValue::Set(value.blocked),
        }
    }
}

impl TryFrom<Model> for Card {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("card not exists".to_string()))?,
            name: model.name,
            card_type: CardType::try_from(model.card_type.as_str())?,
            flag: model.flag,
            wallet_id: model.wallet_id.and_then(|s| Uuid::parse_str(&s).ok()),
            blocked: model.blocked,
        })
    }
}
