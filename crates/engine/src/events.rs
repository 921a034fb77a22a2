//! Wallet balance change events.
//!
//! Every committed wallet mutation is broadcast as a [`BalanceChange`] so
//! other subsystems can react without polling. Events are fired after the
//! transaction commits; a lagging or absent subscriber never affects the
//! operation outcome.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, wallet_balances::BalanceType};

/// A committed change to a wallet balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceChange {
    pub wallet_id: Uuid,
    pub old_balance: i64,
    pub new_balance: i64,
    /// Signed delta applied to the wallet, in cents.
    pub moved_value: i64,
    pub balance_type: BalanceType,
    pub movement_code: Option<String>,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl BalanceChange {
    pub fn builder() -> BalanceChangeBuilder {
        BalanceChangeBuilder::default()
    }
}

/// Fluent builder for [`BalanceChange`].
#[derive(Debug, Default)]
pub struct BalanceChangeBuilder {
    wallet_id: Option<Uuid>,
    old_balance: i64,
    moved_value: i64,
    balance_type: Option<BalanceType>,
    movement_code: Option<String>,
    reason: Option<String>,
}

impl BalanceChangeBuilder {
    /// The wallet being mutated, with its balance before the change.
    pub fn for_wallet(mut self, wallet_id: Uuid, old_balance: i64) -> Self {
        self.wallet_id = Some(wallet_id);
        self.old_balance = old_balance;
        self
    }

    /// The signed delta to apply.
    pub fn moving(mut self, value: i64) -> Self {
        self.moved_value = value;
        self
    }

    pub fn with_type(mut self, balance_type: BalanceType) -> Self {
        self.balance_type = Some(balance_type);
        self
    }

    /// The movement that caused the change, by code.
    pub fn by_movement(mut self, code: &str) -> Self {
        self.movement_code = Some(code.to_string());
        self
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    /// Finalizes the change; the new balance is old balance plus delta.
    pub fn build(self) -> ResultEngine<BalanceChange> {
        let wallet_id = self.wallet_id.ok_or_else(|| {
            EngineError::InvalidValue("balance change requires a wallet".to_string())
        })?;
        let balance_type = self.balance_type.ok_or_else(|| {
            EngineError::InvalidValue("balance change requires a type".to_string())
        })?;
        Ok(BalanceChange {
            wallet_id,
            old_balance: self.old_balance,
            new_balance: self.old_balance + self.moved_value,
            moved_value: self.moved_value,
            balance_type,
            movement_code: self.movement_code,
            reason: self.reason,
            recorded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_computes_new_balance() {
        let wallet_id = Uuid::new_v4();
        let change = BalanceChange::builder()
            .for_wallet(wallet_id, 10_000)
            .moving(-2_500)
            .with_type(BalanceType::Payment)
            .by_movement("000042")
            .build()
            .unwrap();

        assert_eq!(change.new_balance, 7_500);
        assert_eq!(change.moved_value, -2_500);
        assert_eq!(change.movement_code.as_deref(), Some("000042"));
    }

    #[test]
    fn build_requires_wallet() {
        let err = BalanceChange::builder()
            .moving(100)
            .with_type(BalanceType::Revenue)
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            EngineError::InvalidValue("balance change requires a wallet".to_string())
        );
    }
}
