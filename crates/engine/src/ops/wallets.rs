use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    BalanceChange, EngineError, ResultEngine, Wallet, WalletBalance, wallet_balances,
    wallet_balances::BalanceType, wallets,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Creates a wallet, optionally seeding it with an opening balance.
    ///
    /// The opening balance is recorded as an `Adjustment` so the history
    /// starts at the first row.
    pub async fn save_wallet(
        &self,
        name: &str,
        description: Option<&str>,
        opening_balance: i64,
    ) -> ResultEngine<Wallet> {
        let name = normalize_required_name(name, "wallet name")?;
        let description = normalize_optional_text(description);
        let (wallet, change) = with_tx!(self, |db_tx| {
            let exists = wallets::Entity::find()
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::violation("wallet.validate.duplicated"));
            }

            let mut wallet = Wallet::new(name, description);
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;

            let change = if opening_balance == 0 {
                None
            } else {
                let change = self
                    .apply_balance_change(
                        &db_tx,
                        &wallet,
                        opening_balance,
                        BalanceType::Adjustment,
                        None,
                        Some("opening balance"),
                    )
                    .await?;
                wallet.balance = change.new_balance;
                Some(change)
            };
            Ok::<_, EngineError>((wallet, change))
        })?;
        if let Some(change) = change {
            self.publish_balance_change(change);
        }
        Ok(wallet)
    }

    /// Updates a wallet's name, description and blocked flag.
    ///
    /// The balance is never written here; it only moves through recorded
    /// balance changes.
    pub async fn update_wallet(
        &self,
        wallet_id: Uuid,
        name: &str,
        description: Option<&str>,
        blocked: bool,
    ) -> ResultEngine<Wallet> {
        let name = normalize_required_name(name, "wallet name")?;
        let description = normalize_optional_text(description);
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;

            let exists = wallets::Entity::find()
                .filter(wallets::Column::Id.ne(wallet_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::violation("wallet.validate.duplicated"));
            }

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(description),
                blocked: ActiveValue::Set(blocked),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            Wallet::try_from(model)
        })
    }

    /// Moves a wallet to the given balance, recording the delta as an
    /// `Adjustment`.
    pub async fn adjust_wallet_balance(
        &self,
        wallet_id: Uuid,
        new_balance: i64,
        reason: Option<&str>,
    ) -> ResultEngine<BalanceChange> {
        let reason = normalize_optional_text(reason);
        let change = with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, wallet_id).await?;
            let wallet = Wallet::try_from(model)?;
            let change = self
                .apply_balance_change(
                    &db_tx,
                    &wallet,
                    new_balance - wallet.balance,
                    BalanceType::Adjustment,
                    None,
                    reason.as_deref(),
                )
                .await?;
            Ok::<_, EngineError>(change)
        })?;
        self.publish_balance_change(change.clone());
        Ok(change)
    }

    pub async fn find_wallet_by_id(&self, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, wallet_id).await?;
            Wallet::try_from(model)
        })
    }

    /// Lists wallets, optionally only (un)blocked ones.
    pub async fn list_wallets(&self, blocked: Option<bool>) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |db_tx| {
            let mut query = wallets::Entity::find().order_by_asc(wallets::Column::Name);
            if let Some(blocked) = blocked {
                query = query.filter(wallets::Column::Blocked.eq(blocked));
            }
            let models = query.all(&db_tx).await?;
            models.into_iter().map(Wallet::try_from).collect()
        })
    }

    /// The full balance history of a wallet, newest first.
    pub async fn list_wallet_balances(&self, wallet_id: Uuid) -> ResultEngine<Vec<WalletBalance>> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;
            let models = wallet_balances::Entity::find()
                .filter(wallet_balances::Column::WalletId.eq(wallet_id.to_string()))
                .order_by_desc(wallet_balances::Column::RecordedAt)
                .all(&db_tx)
                .await?;
            models.into_iter().map(WalletBalance::try_from).collect()
        })
    }

    /// Applies a balance delta to a wallet inside the caller's transaction.
    ///
    /// Appends the history row and rewrites the denormalized balance. The
    /// returned change must be published by the caller once the transaction
    /// commits.
    pub(super) async fn apply_balance_change(
        &self,
        db_tx: &DatabaseTransaction,
        wallet: &Wallet,
        moved_value: i64,
        balance_type: BalanceType,
        movement_code: Option<&str>,
        reason: Option<&str>,
    ) -> ResultEngine<BalanceChange> {
        let mut builder = BalanceChange::builder()
            .for_wallet(wallet.id, wallet.balance)
            .moving(moved_value)
            .with_type(balance_type);
        if let Some(code) = movement_code {
            builder = builder.by_movement(code);
        }
        if let Some(reason) = reason {
            builder = builder.with_reason(reason);
        }
        let change = builder.build()?;

        let record = wallet_balances::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            wallet_id: ActiveValue::Set(wallet.id.to_string()),
            old_balance: ActiveValue::Set(change.old_balance),
            actual_balance: ActiveValue::Set(change.new_balance),
            moved_value: ActiveValue::Set(change.moved_value),
            balance_type: ActiveValue::Set(change.balance_type.as_str().to_string()),
            movement_code: ActiveValue::Set(change.movement_code.clone()),
            reason: ActiveValue::Set(change.reason.clone()),
            recorded_at: ActiveValue::Set(change.recorded_at),
        };
        record.insert(db_tx).await?;

        let active = wallets::ActiveModel {
            id: ActiveValue::Set(wallet.id.to_string()),
            balance: ActiveValue::Set(change.new_balance),
            ..Default::default()
        };
        active.update(db_tx).await?;

        Ok(change)
    }
}
