use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, User, card_invoices, cards, cost_centers, financial_periods,
    fixed_movements, movement_classes, movements, security::PasswordEncoder, users, wallets,
};

use super::{Engine, normalize_required_name, with_tx};

/// Generates a `require_*` lookup returning the model or `KeyNotFound`.
macro_rules! impl_require_by_id {
    ($require_fn:ident, $module:ident, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            $module::Entity::find_by_id(id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_by_id!(require_cost_center, cost_centers, "cost center not exists");

    impl_require_by_id!(
        require_movement_class,
        movement_classes,
        "movement class not exists"
    );

    impl_require_by_id!(require_movement, movements, "movement not exists");

    impl_require_by_id!(
        require_period,
        financial_periods,
        "financial period not exists"
    );

    impl_require_by_id!(require_wallet, wallets, "wallet not exists");

    impl_require_by_id!(require_card, cards, "card not exists");

    impl_require_by_id!(
        require_card_invoice,
        card_invoices,
        "card invoice not exists"
    );

    impl_require_by_id!(
        require_fixed_movement,
        fixed_movements,
        "fixed movement not exists"
    );

    /// Creates a user with an argon2-hashed password.
    ///
    /// The username is NFC-normalized and is the primary key.
    pub async fn create_user(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> ResultEngine<User> {
        let username = normalize_required_name(username, "username")?;
        let display_name = normalize_required_name(display_name, "display name")?;
        let hash = PasswordEncoder.encode(password)?;
        with_tx!(self, |db_tx| {
            let exists = users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::violation("user.validate.duplicated"));
            }

            let created_at = chrono::Utc::now();
            let active = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                display_name: ActiveValue::Set(display_name.clone()),
                password: ActiveValue::Set(hash),
                created_at: ActiveValue::Set(created_at),
            };
            active.insert(&db_tx).await?;

            Ok(User {
                username,
                display_name,
                created_at,
            })
        })
    }

    /// Verifies a username/password pair.
    ///
    /// Unknown users and wrong passwords fail the same way, so callers
    /// cannot probe for usernames.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let username = normalize_required_name(username, "username")?;
        let invalid = || EngineError::Credential("invalid credentials".to_string());
        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(invalid)?;

            if !PasswordEncoder.matches(password, &model.password)? {
                return Err(invalid());
            }
            User::try_from(model)
        })
    }

    pub async fn find_user(&self, username: &str) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(username.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
            User::try_from(model)
        })
    }
}
