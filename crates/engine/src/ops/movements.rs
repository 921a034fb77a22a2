use chrono::NaiveDate;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    Apportionment, ClassType, EngineError, MoneyCents, Movement, MovementState, Page, PageRequest,
    Payment, PaymentMethod, ResultEngine, Wallet, apportionments, card_invoices,
    financial_periods, movement_classes, movements, payments, wallet_balances::BalanceType,
};

use super::{Engine, next_movement_code, normalize_required_name, parse_key, with_tx};

/// One split of a movement draft.
#[derive(Clone, Debug)]
pub struct ApportionmentDraft {
    pub movement_class_id: Uuid,
    pub value: i64,
}

/// Input for creating or updating a movement.
#[derive(Clone, Debug)]
pub struct MovementDraft {
    pub description: String,
    pub value: i64,
    pub due_date: NaiveDate,
    pub financial_period_id: Uuid,
    pub apportionments: Vec<ApportionmentDraft>,
}

/// Input for settling a movement.
#[derive(Clone, Debug)]
pub struct PaymentDraft {
    pub paid_on: NaiveDate,
    pub method: PaymentMethod,
    /// Required for cash payments.
    pub wallet_id: Option<Uuid>,
    /// Required for card payments.
    pub card_id: Option<Uuid>,
}

/// Filters for listing movements.
#[derive(Clone, Debug, Default)]
pub struct MovementFilter {
    /// Substring match against description or code.
    pub text: Option<String>,
    pub state: Option<MovementState>,
    pub direction: Option<ClassType>,
    pub financial_period_id: Option<Uuid>,
}

/// Checks that a split set is present and sums exactly to the owner's value.
pub(super) fn validate_apportionments(
    value: i64,
    splits: &[ApportionmentDraft],
) -> ResultEngine<()> {
    if splits.is_empty() {
        return Err(EngineError::violation(
            "movement.validate.empty-apportionment",
        ));
    }
    if splits.iter().any(|split| split.value <= 0) {
        return Err(EngineError::InvalidValue(
            "apportionment value must be > 0".to_string(),
        ));
    }
    let total: i64 = splits.iter().map(|split| split.value).sum();
    if total != value {
        return Err(EngineError::violation_with(
            "movement.validate.apportionment-value",
            vec![MoneyCents::new((value - total).abs()).to_string()],
        ));
    }
    Ok(())
}

impl Engine {
    /// Creates a movement inside a financial period.
    ///
    /// The splits must cover the value exactly; the short code is generated
    /// here.
    pub async fn save_movement(&self, draft: &MovementDraft) -> ResultEngine<Movement> {
        let description = normalize_required_name(&draft.description, "movement description")?;
        validate_apportionments(draft.value, &draft.apportionments)?;
        with_tx!(self, |db_tx| {
            self.require_period(&db_tx, draft.financial_period_id)
                .await?;
            for split in &draft.apportionments {
                self.require_movement_class(&db_tx, split.movement_class_id)
                    .await?;
            }

            let mut movement = Movement::new(
                next_movement_code(),
                description,
                draft.value,
                draft.due_date,
                draft.financial_period_id,
            )?;
            movements::ActiveModel::from(&movement).insert(&db_tx).await?;

            for split in &draft.apportionments {
                let apportionment = Apportionment::new(split.movement_class_id, split.value);
                let mut active = apportionments::ActiveModel::from(&apportionment);
                active.movement_id = ActiveValue::Set(Some(movement.id.to_string()));
                active.insert(&db_tx).await?;
                movement.apportionments.push(apportionment);
            }
            Ok(movement)
        })
    }

    /// Rewrites a movement and its split set.
    ///
    /// Splits removed from the edit set are deleted, kept ones keep their
    /// row, new ones are inserted. Movements of a closed period are
    /// immutable.
    pub async fn update_movement(
        &self,
        movement_id: Uuid,
        draft: &MovementDraft,
    ) -> ResultEngine<Movement> {
        let description = normalize_required_name(&draft.description, "movement description")?;
        if draft.value <= 0 {
            return Err(EngineError::InvalidValue(
                "movement value must be > 0".to_string(),
            ));
        }
        validate_apportionments(draft.value, &draft.apportionments)?;
        with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            let period_id = parse_key(&model.financial_period_id, "financial period")?;
            let period = self.require_period(&db_tx, period_id).await?;
            if period.closed {
                return Err(EngineError::violation(
                    "movement.validate.closed-financial-period",
                ));
            }
            if draft.financial_period_id != period_id {
                let target = self
                    .require_period(&db_tx, draft.financial_period_id)
                    .await?;
                if target.closed {
                    return Err(EngineError::violation(
                        "movement.validate.closed-financial-period",
                    ));
                }
            }

            let existing = apportionments::Entity::find()
                .filter(apportionments::Column::MovementId.eq(movement_id.to_string()))
                .all(&db_tx)
                .await?;

            for row in &existing {
                let kept = draft
                    .apportionments
                    .iter()
                    .find(|split| split.movement_class_id.to_string() == row.movement_class_id);
                match kept {
                    None => {
                        apportionments::Entity::delete_by_id(row.id.clone())
                            .exec(&db_tx)
                            .await?;
                    }
                    Some(split) if split.value != row.value => {
                        let active = apportionments::ActiveModel {
                            id: ActiveValue::Set(row.id.clone()),
                            value: ActiveValue::Set(split.value),
                            ..Default::default()
                        };
                        active.update(&db_tx).await?;
                    }
                    Some(_) => {}
                }
            }
            for split in &draft.apportionments {
                let already = existing
                    .iter()
                    .any(|row| row.movement_class_id == split.movement_class_id.to_string());
                if already {
                    continue;
                }
                self.require_movement_class(&db_tx, split.movement_class_id)
                    .await?;
                let apportionment = Apportionment::new(split.movement_class_id, split.value);
                let mut active = apportionments::ActiveModel::from(&apportionment);
                active.movement_id = ActiveValue::Set(Some(movement_id.to_string()));
                active.insert(&db_tx).await?;
            }

            let active = movements::ActiveModel {
                id: ActiveValue::Set(movement_id.to_string()),
                description: ActiveValue::Set(description),
                value: ActiveValue::Set(draft.value),
                due_date: ActiveValue::Set(draft.due_date),
                financial_period_id: ActiveValue::Set(draft.financial_period_id.to_string()),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            self.assemble_movement(&db_tx, model).await
        })
    }

    /// Settles a movement.
    ///
    /// Cash and debit card payments move the effective wallet right away,
    /// recording the movement code in the balance history. Credit card
    /// payments settle later through the card invoice. Paying the
    /// consolidated movement of an invoice marks the invoice members as
    /// settled.
    pub async fn pay_movement(
        &self,
        movement_id: Uuid,
        draft: &PaymentDraft,
    ) -> ResultEngine<Movement> {
        match draft.method {
            PaymentMethod::Cash if draft.wallet_id.is_none() => {
                return Err(EngineError::violation("payment.validate.missing-wallet"));
            }
            PaymentMethod::DebitCard | PaymentMethod::CreditCard if draft.card_id.is_none() => {
                return Err(EngineError::violation("payment.validate.missing-card"));
            }
            _ => {}
        }
        let (movement, change) = with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            if model.state == MovementState::Paid.as_str() {
                return Err(EngineError::violation("movement.validate.already-paid"));
            }
            let direction = self.movement_direction(&db_tx, movement_id).await?;

            if let Some(wallet_id) = draft.wallet_id {
                self.require_wallet(&db_tx, wallet_id).await?;
            }
            let card_model = match draft.card_id {
                Some(card_id) => Some(self.require_card(&db_tx, card_id).await?),
                None => None,
            };

            let effective_wallet_id = match draft.method {
                PaymentMethod::Cash => draft.wallet_id,
                PaymentMethod::DebitCard => {
                    match card_model.as_ref().and_then(|card| card.wallet_id.as_deref()) {
                        Some(raw) => Some(parse_key(raw, "wallet")?),
                        None => return Err(EngineError::violation("card.validate.no-wallet")),
                    }
                }
                PaymentMethod::CreditCard => None,
            };

            let payment = Payment::new(draft.paid_on, draft.method, draft.wallet_id, draft.card_id);
            payments::ActiveModel::from(&payment).insert(&db_tx).await?;

            let active = movements::ActiveModel {
                id: ActiveValue::Set(movement_id.to_string()),
                state: ActiveValue::Set(MovementState::Paid.as_str().to_string()),
                payment_id: ActiveValue::Set(Some(payment.id.to_string())),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;

            let change = match effective_wallet_id {
                Some(wallet_id) => {
                    let wallet_model = self.require_wallet(&db_tx, wallet_id).await?;
                    let wallet = Wallet::try_from(wallet_model)?;
                    let (moved, balance_type) = match direction {
                        ClassType::Out => (-model.value, BalanceType::Payment),
                        ClassType::In => (model.value, BalanceType::Revenue),
                    };
                    let change = self
                        .apply_balance_change(
                            &db_tx,
                            &wallet,
                            moved,
                            balance_type,
                            Some(&model.code),
                            None,
                        )
                        .await?;
                    Some(change)
                }
                None => None,
            };

            if let Some(invoice) = card_invoices::Entity::find()
                .filter(card_invoices::Column::MovementId.eq(movement_id.to_string()))
                .one(&db_tx)
                .await?
            {
                let members = movements::Entity::find()
                    .filter(movements::Column::CardInvoiceId.eq(invoice.id))
                    .all(&db_tx)
                    .await?;
                for member in members {
                    let active = movements::ActiveModel {
                        id: ActiveValue::Set(member.id),
                        card_invoice_paid: ActiveValue::Set(true),
                        ..Default::default()
                    };
                    active.update(&db_tx).await?;
                }
            }

            let movement = self.assemble_movement(&db_tx, model).await?;
            Ok::<_, EngineError>((movement, change))
        })?;
        if let Some(change) = change {
            self.publish_balance_change(change);
        }
        Ok(movement)
    }

    /// Deletes a movement.
    ///
    /// Movements of a closed period and members of a settled card invoice
    /// stay. A movement paid in cash gives the money back to the wallet as a
    /// `BalanceReturn` before the rows go.
    pub async fn delete_movement(&self, movement_id: Uuid) -> ResultEngine<()> {
        let change = with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            let period_id = parse_key(&model.financial_period_id, "financial period")?;
            let period = self.require_period(&db_tx, period_id).await?;
            if period.closed {
                return Err(EngineError::violation(
                    "movement.validate.closed-financial-period",
                ));
            }
            if model.card_invoice_paid {
                return Err(EngineError::violation("movement.validate.has-card-invoice"));
            }

            let payment_model = match model.payment_id.as_deref() {
                Some(raw) => {
                    let payment_id = parse_key(raw, "payment")?;
                    payments::Entity::find_by_id(payment_id.to_string())
                        .one(&db_tx)
                        .await?
                }
                None => None,
            };

            let change = match &payment_model {
                Some(payment)
                    if model.state == MovementState::Paid.as_str()
                        && payment.method == PaymentMethod::Cash.as_str() =>
                {
                    let direction = self.movement_direction(&db_tx, movement_id).await?;
                    let wallet_raw = payment.wallet_id.as_deref().ok_or_else(|| {
                        EngineError::violation("payment.validate.missing-wallet")
                    })?;
                    let wallet_id = parse_key(wallet_raw, "wallet")?;
                    let wallet_model = self.require_wallet(&db_tx, wallet_id).await?;
                    let wallet = Wallet::try_from(wallet_model)?;
                    let moved = match direction {
                        ClassType::Out => model.value,
                        ClassType::In => -model.value,
                    };
                    let change = self
                        .apply_balance_change(
                            &db_tx,
                            &wallet,
                            moved,
                            BalanceType::BalanceReturn,
                            Some(&model.code),
                            None,
                        )
                        .await?;
                    Some(change)
                }
                _ => None,
            };

            movements::Entity::delete_by_id(movement_id.to_string())
                .exec(&db_tx)
                .await?;
            if let Some(payment) = payment_model {
                payments::Entity::delete_by_id(payment.id).exec(&db_tx).await?;
            }
            Ok::<_, EngineError>(change)
        })?;
        if let Some(change) = change {
            self.publish_balance_change(change);
        }
        Ok(())
    }

    /// Deletes the consolidated movement of a card invoice together with the
    /// invoice, detaching every member movement.
    ///
    /// A paid invoice gives its value back to the paying wallet first.
    pub async fn delete_card_invoice_movement(&self, movement_id: Uuid) -> ResultEngine<()> {
        let change = with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            let invoice = card_invoices::Entity::find()
                .filter(card_invoices::Column::MovementId.eq(movement_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("card invoice not exists".to_string()))?;

            let period_id = parse_key(&invoice.financial_period_id, "financial period")?;
            let period = self.require_period(&db_tx, period_id).await?;
            if period.closed {
                return Err(EngineError::violation(
                    "movement.validate.closed-financial-period",
                ));
            }

            let members = movements::Entity::find()
                .filter(movements::Column::CardInvoiceId.eq(invoice.id.clone()))
                .all(&db_tx)
                .await?;
            for member in members {
                let active = movements::ActiveModel {
                    id: ActiveValue::Set(member.id),
                    card_invoice_id: ActiveValue::Set(None),
                    card_invoice_paid: ActiveValue::Set(false),
                    ..Default::default()
                };
                active.update(&db_tx).await?;
            }

            let payment_model = match model.payment_id.as_deref() {
                Some(raw) => {
                    let payment_id = parse_key(raw, "payment")?;
                    payments::Entity::find_by_id(payment_id.to_string())
                        .one(&db_tx)
                        .await?
                }
                None => None,
            };

            let change = match &payment_model {
                Some(payment) if model.state == MovementState::Paid.as_str() => {
                    let wallet_raw = payment.wallet_id.as_deref().ok_or_else(|| {
                        EngineError::violation("payment.validate.missing-wallet")
                    })?;
                    let wallet_id = parse_key(wallet_raw, "wallet")?;
                    let wallet_model = self.require_wallet(&db_tx, wallet_id).await?;
                    let wallet = Wallet::try_from(wallet_model)?;
                    let change = self
                        .apply_balance_change(
                            &db_tx,
                            &wallet,
                            model.value,
                            BalanceType::BalanceReturn,
                            Some(&model.code),
                            None,
                        )
                        .await?;
                    Some(change)
                }
                _ => None,
            };

            card_invoices::Entity::delete_by_id(invoice.id)
                .exec(&db_tx)
                .await?;
            movements::Entity::delete_by_id(movement_id.to_string())
                .exec(&db_tx)
                .await?;
            if let Some(payment) = payment_model {
                payments::Entity::delete_by_id(payment.id).exec(&db_tx).await?;
            }
            Ok::<_, EngineError>(change)
        })?;
        if let Some(change) = change {
            self.publish_balance_change(change);
        }
        Ok(())
    }

    pub async fn find_movement_by_id(&self, movement_id: Uuid) -> ResultEngine<Movement> {
        with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            self.assemble_movement(&db_tx, model).await
        })
    }

    pub async fn list_movements_by_period(
        &self,
        financial_period_id: Uuid,
    ) -> ResultEngine<Vec<Movement>> {
        with_tx!(self, |db_tx| {
            self.require_period(&db_tx, financial_period_id).await?;
            let models = movements::Entity::find()
                .filter(movements::Column::FinancialPeriodId.eq(financial_period_id.to_string()))
                .order_by_asc(movements::Column::DueDate)
                .all(&db_tx)
                .await?;
            self.assemble_movements(&db_tx, models).await
        })
    }

    /// Lists the movements of the most recently started open period, or
    /// nothing when every period is closed.
    pub async fn list_movements_by_active_period(&self) -> ResultEngine<Vec<Movement>> {
        with_tx!(self, |db_tx| {
            let period = financial_periods::Entity::find()
                .filter(financial_periods::Column::Closed.eq(false))
                .order_by_desc(financial_periods::Column::StartsOn)
                .one(&db_tx)
                .await?;
            let models = match period {
                Some(period) => {
                    movements::Entity::find()
                        .filter(movements::Column::FinancialPeriodId.eq(period.id))
                        .order_by_asc(movements::Column::DueDate)
                        .all(&db_tx)
                        .await?
                }
                None => Vec::new(),
            };
            self.assemble_movements(&db_tx, models).await
        })
    }

    /// Lists open movements due on a date, optionally pulling in everything
    /// overdue as well.
    pub async fn list_movements_by_due_date(
        &self,
        due_date: NaiveDate,
        show_overdue: bool,
    ) -> ResultEngine<Vec<Movement>> {
        with_tx!(self, |db_tx| {
            let mut query = movements::Entity::find()
                .filter(movements::Column::State.eq(MovementState::Open.as_str()))
                .order_by_asc(movements::Column::DueDate);
            query = if show_overdue {
                query.filter(movements::Column::DueDate.lte(due_date))
            } else {
                query.filter(movements::Column::DueDate.eq(due_date))
            };
            let models = query.all(&db_tx).await?;
            self.assemble_movements(&db_tx, models).await
        })
    }

    pub async fn list_movements_by_card_invoice(
        &self,
        card_invoice_id: Uuid,
    ) -> ResultEngine<Vec<Movement>> {
        with_tx!(self, |db_tx| {
            self.require_card_invoice(&db_tx, card_invoice_id).await?;
            let models = movements::Entity::find()
                .filter(movements::Column::CardInvoiceId.eq(card_invoice_id.to_string()))
                .order_by_asc(movements::Column::DueDate)
                .all(&db_tx)
                .await?;
            self.assemble_movements(&db_tx, models).await
        })
    }

    /// Searches movements page by page, newest due date first.
    pub async fn list_movements_by_filter(
        &self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<Movement>> {
        page.validate()?;
        with_tx!(self, |db_tx| {
            let mut query = movements::Entity::find()
                .order_by_desc(movements::Column::DueDate)
                .order_by_desc(movements::Column::CreatedAt)
                .offset(page.offset())
                .limit(page.fetch_limit());
            if let Some(text) = &filter.text {
                query = query.filter(
                    Condition::any()
                        .add(movements::Column::Description.contains(text.as_str()))
                        .add(movements::Column::Code.contains(text.as_str())),
                );
            }
            if let Some(state) = filter.state {
                query = query.filter(movements::Column::State.eq(state.as_str()));
            }
            if let Some(period_id) = filter.financial_period_id {
                query =
                    query.filter(movements::Column::FinancialPeriodId.eq(period_id.to_string()));
            }
            if let Some(direction) = filter.direction {
                query = query
                    .join(JoinType::InnerJoin, movements::Relation::Apportionments.def())
                    .join(
                        JoinType::InnerJoin,
                        apportionments::Relation::MovementClasses.def(),
                    )
                    .filter(movement_classes::Column::ClassType.eq(direction.as_str()))
                    .distinct();
            }
            let models = query.all(&db_tx).await?;
            let items = self.assemble_movements(&db_tx, models).await?;
            Ok(Page::from_rows(items, &page))
        })
    }

    /// The direction of a movement, read from its first split.
    pub(super) async fn movement_direction(
        &self,
        db_tx: &DatabaseTransaction,
        movement_id: Uuid,
    ) -> ResultEngine<ClassType> {
        let row = apportionments::Entity::find()
            .filter(apportionments::Column::MovementId.eq(movement_id.to_string()))
            .find_also_related(movement_classes::Entity)
            .order_by_asc(apportionments::Column::Id)
            .one(db_tx)
            .await?;
        match row {
            None => Err(EngineError::violation(
                "movement.validate.empty-apportionment",
            )),
            Some((_, None)) => Err(EngineError::KeyNotFound(
                "movement class not exists".to_string(),
            )),
            Some((_, Some(class_model))) => ClassType::try_from(class_model.class_type.as_str()),
        }
    }

    /// Turns a movement row into the domain struct with its splits loaded.
    pub(super) async fn assemble_movement(
        &self,
        db_tx: &DatabaseTransaction,
        model: movements::Model,
    ) -> ResultEngine<Movement> {
        let splits = apportionments::Entity::find()
            .filter(apportionments::Column::MovementId.eq(model.id.clone()))
            .order_by_asc(apportionments::Column::Id)
            .all(db_tx)
            .await?;
        let mut movement = Movement::try_from(model)?;
        movement.apportionments = splits
            .into_iter()
            .map(Apportionment::try_from)
            .collect::<ResultEngine<_>>()?;
        Ok(movement)
    }

    async fn assemble_movements(
        &self,
        db_tx: &DatabaseTransaction,
        models: Vec<movements::Model>,
    ) -> ResultEngine<Vec<Movement>> {
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(self.assemble_movement(db_tx, model).await?);
        }
        Ok(out)
    }
}
