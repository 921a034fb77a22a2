use uuid::Uuid;

use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{Card, CardType, EngineError, ResultEngine, cards};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

/// Applies the `(name, type)` uniqueness scope to a card query.
fn scope_by_name_and_type(
    query: Select<cards::Entity>,
    name_lower: &str,
    card_type: CardType,
) -> Select<cards::Entity> {
    query
        .filter(Expr::cust("LOWER(name)").eq(name_lower))
        .filter(cards::Column::CardType.eq(card_type.as_str()))
}

impl Engine {
    /// Registers a card. Debit cards must name their backing wallet.
    pub async fn save_card(
        &self,
        name: &str,
        card_type: CardType,
        flag: Option<&str>,
        wallet_id: Option<Uuid>,
    ) -> ResultEngine<Card> {
        let name = normalize_required_name(name, "card name")?;
        let flag = normalize_optional_text(flag);
        if card_type == CardType::Debit && wallet_id.is_none() {
            return Err(EngineError::violation("card.validate.no-wallet"));
        }
        with_tx!(self, |db_tx| {
            if let Some(wallet_id) = wallet_id {
                self.require_wallet(&db_tx, wallet_id).await?;
            }

            let exists =
                scope_by_name_and_type(cards::Entity::find(), &name.to_lowercase(), card_type)
                    .one(&db_tx)
                    .await?
                    .is_some();
            if exists {
                return Err(EngineError::violation("card.validate.duplicated"));
            }

            let card = Card::new(name, card_type, flag, wallet_id);
            cards::ActiveModel::from(&card).insert(&db_tx).await?;
            Ok(card)
        })
    }

    /// Updates a card, keeping the `(name, type)` uniqueness rule.
    pub async fn update_card(
        &self,
        card_id: Uuid,
        name: &str,
        card_type: CardType,
        flag: Option<&str>,
        wallet_id: Option<Uuid>,
        blocked: bool,
    ) -> ResultEngine<Card> {
        let name = normalize_required_name(name, "card name")?;
        let flag = normalize_optional_text(flag);
        if card_type == CardType::Debit && wallet_id.is_none() {
            return Err(EngineError::violation("card.validate.no-wallet"));
        }
        with_tx!(self, |db_tx| {
            self.require_card(&db_tx, card_id).await?;
            if let Some(wallet_id) = wallet_id {
                self.require_wallet(&db_tx, wallet_id).await?;
            }

            let exists = scope_by_name_and_type(
                cards::Entity::find().filter(cards::Column::Id.ne(card_id.to_string())),
                &name.to_lowercase(),
                card_type,
            )
            .one(&db_tx)
            .await?
            .is_some();
            if exists {
                return Err(EngineError::violation("card.validate.duplicated"));
            }

            let active = cards::ActiveModel {
                id: ActiveValue::Set(card_id.to_string()),
                name: ActiveValue::Set(name),
                card_type: ActiveValue::Set(card_type.as_str().to_string()),
                flag: ActiveValue::Set(flag),
                wallet_id: ActiveValue::Set(wallet_id.map(|id| id.to_string())),
                blocked: ActiveValue::Set(blocked),
            };
            let model = active.update(&db_tx).await?;
            Card::try_from(model)
        })
    }

    pub async fn find_card_by_id(&self, card_id: Uuid) -> ResultEngine<Card> {
        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, card_id).await?;
            Card::try_from(model)
        })
    }

    /// Lists cards, optionally only (un)blocked ones.
    pub async fn list_cards(&self, blocked: Option<bool>) -> ResultEngine<Vec<Card>> {
        with_tx!(self, |db_tx| {
            let mut query = cards::Entity::find().order_by_asc(cards::Column::Name);
            if let Some(blocked) = blocked {
                query = query.filter(cards::Column::Blocked.eq(blocked));
            }
            let models = query.all(&db_tx).await?;
            models.into_iter().map(Card::try_from).collect()
        })
    }
}
