use uuid::Uuid;

use sea_orm::{
    ActiveValue, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{
    Apportionment, CardInvoice, EngineError, Movement, PaymentMethod, ResultEngine,
    apportionments, card_invoices, movements, payments,
};

use super::{Engine, next_movement_code, with_tx};

impl Engine {
    /// Raises the invoice of a card for one financial period.
    ///
    /// Collects the card's credit movements of the period that are not yet
    /// part of an invoice, links them as members and creates a consolidated
    /// movement for the total, split entirely on the given class.
    pub async fn create_card_invoice(
        &self,
        card_id: Uuid,
        financial_period_id: Uuid,
        movement_class_id: Uuid,
    ) -> ResultEngine<CardInvoice> {
        with_tx!(self, |db_tx| {
            let card = self.require_card(&db_tx, card_id).await?;
            let period = self.require_period(&db_tx, financial_period_id).await?;
            self.require_movement_class(&db_tx, movement_class_id)
                .await?;

            let existing = card_invoices::Entity::find()
                .filter(card_invoices::Column::CardId.eq(card_id.to_string()))
                .filter(
                    card_invoices::Column::FinancialPeriodId.eq(financial_period_id.to_string()),
                )
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::violation("card-invoice.validate.duplicated"));
            }

            let members = movements::Entity::find()
                .join(JoinType::InnerJoin, movements::Relation::Payments.def())
                .filter(payments::Column::CardId.eq(card_id.to_string()))
                .filter(payments::Column::Method.eq(PaymentMethod::CreditCard.as_str()))
                .filter(movements::Column::FinancialPeriodId.eq(financial_period_id.to_string()))
                .filter(movements::Column::CardInvoiceId.is_null())
                .order_by_asc(movements::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            if members.is_empty() {
                return Err(EngineError::violation("card-invoice.validate.empty"));
            }
            let total: i64 = members.iter().map(|member| member.value).sum();

            let identification = format!("{} {}", card.name, period.identification);
            let movement = Movement::new(
                next_movement_code(),
                identification.clone(),
                total,
                period.ends_on,
                financial_period_id,
            )?;
            movements::ActiveModel::from(&movement).insert(&db_tx).await?;

            let apportionment = Apportionment::new(movement_class_id, total);
            let mut active = apportionments::ActiveModel::from(&apportionment);
            active.movement_id = ActiveValue::Set(Some(movement.id.to_string()));
            active.insert(&db_tx).await?;

            let mut invoice =
                CardInvoice::new(identification, card_id, financial_period_id, total);
            invoice.movement_id = Some(movement.id);
            card_invoices::ActiveModel::from(&invoice).insert(&db_tx).await?;

            for member in &members {
                movements::ActiveModel {
                    id: ActiveValue::Set(member.id.clone()),
                    card_invoice_id: ActiveValue::Set(Some(invoice.id.to_string())),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
            }

            Ok(invoice)
        })
    }

    /// Finds the invoice whose consolidated movement is the given one.
    pub async fn find_card_invoice_by_movement(
        &self,
        movement_id: Uuid,
    ) -> ResultEngine<Option<CardInvoice>> {
        with_tx!(self, |db_tx| {
            card_invoices::Entity::find()
                .filter(card_invoices::Column::MovementId.eq(movement_id.to_string()))
                .one(&db_tx)
                .await?
                .map(CardInvoice::try_from)
                .transpose()
        })
    }

    /// Lists the invoices raised for a card, newest identification first.
    pub async fn list_card_invoices_by_card(
        &self,
        card_id: Uuid,
    ) -> ResultEngine<Vec<CardInvoice>> {
        with_tx!(self, |db_tx| {
            card_invoices::Entity::find()
                .filter(card_invoices::Column::CardId.eq(card_id.to_string()))
                .order_by_desc(card_invoices::Column::Identification)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(CardInvoice::try_from)
                .collect::<Result<Vec<_>, EngineError>>()
        })
    }
}
