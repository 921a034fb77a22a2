//! Wallet balance history.
//!
//! Every wallet mutation appends a `WalletBalance` row carrying the balance
//! before and after, the moved value and the reason kind. The wallet's
//! denormalized balance always matches the newest row.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// Why a wallet balance changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceType {
    /// An outflow movement was paid from the wallet.
    Payment,
    /// An inflow movement was received into the wallet.
    Revenue,
    /// A paid movement was deleted and its value given back.
    BalanceReturn,
    /// An operator set the balance by hand.
    Adjustment,
}

impl BalanceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Revenue => "revenue",
            Self::BalanceReturn => "balance_return",
            Self::Adjustment => "adjustment",
        }
    }
}

impl TryFrom<&str> for BalanceType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "payment" => Ok(Self::Payment),
            "revenue" => Ok(Self::Revenue),
            "balance_return" => Ok(Self::BalanceReturn),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(EngineError::InvalidValue(format!(
                "invalid balance type: {other}"
            ))),
        }
    }
}

/// One recorded balance change of a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub old_balance: i64,
    pub actual_balance: i64,
    /// Signed delta applied to the wallet, in cents.
    pub moved_value: i64,
    pub balance_type: BalanceType,
    pub movement_code: Option<String>,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub wallet_id: String,
    pub old_balance: i64,
    pub actual_balance: i64,
    pub moved_value: i64,
    pub balance_type: String,
    pub movement_code: Option<String>,
    pub reason: Option<String>,
    pub recorded_at: DateTimeUtc,
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
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&WalletBalance> for ActiveModel {
    fn from(value: &WalletBalance) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            wallet_id: ActiveValue::Set(value.wallet_id.to_string()),
            old_balance: ActiveValue::Set(value.old_balance),
            actual_balance: ActiveValue::Set(value.actual_balance),
            moved_value: ActiveValue::Set(value.moved_value),
            balance_type: ActiveValue::Set(value.balance_type.as_str().to_string()),
            movement_code: ActiveValue::Set(value.movement_code.clone()),
            reason: ActiveValue::Set(value.reason.clone()),
            recorded_at: ActiveValue::Set(value.recorded_at),
        }
    }
}

impl TryFrom<Model> for WalletBalance {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("balance record not exists".to_string()))?,
            wallet_id: Uuid::parse_str(&model.wallet_id)
                .map_err(|_| EngineError::KeyNotFound("wallet not exists".to_string()))?,
            old_balance: model.old_balance,
            actual_balance: model.actual_balance,
            moved_value: model.moved_value,
            balance_type: BalanceType::try_from(model.balance_type.as_str())?,
            movement_code: model.movement_code,
            reason: model.reason,
            recorded_at: model.recorded_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_type_round_trips() {
        for balance_type in [
            BalanceType::Payment,
            BalanceType::Revenue,
            BalanceType::BalanceReturn,
            BalanceType::Adjustment,
        ] {
            assert_eq!(
                BalanceType::try_from(balance_type.as_str()).unwrap(),
                balance_type
            );
        }
    }
}
