use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Apportionment, EngineError, FixedMovement, FixedMovementState, Launch, Movement, ResultEngine,
    apportionments, financial_periods, fixed_movements, launches, movements,
};

use super::{
    ApportionmentDraft, Engine, next_movement_code, normalize_required_name, parse_key, with_tx,
};

/// Everything needed to register a recurring movement template.
#[derive(Clone, Debug)]
pub struct FixedMovementDraft {
    pub identification: String,
    pub description: String,
    pub value: i64,
    pub installments: Option<i32>,
    pub auto_launch: bool,
    pub apportionments: Vec<ApportionmentDraft>,
}

impl Engine {
    /// Registers a fixed movement template with its splits.
    pub async fn save_fixed_movement(
        &self,
        draft: &FixedMovementDraft,
    ) -> ResultEngine<FixedMovement> {
        let identification =
            normalize_required_name(&draft.identification, "fixed movement identification")?;
        let description =
            normalize_required_name(&draft.description, "fixed movement description")?;
        super::movements::validate_apportionments(draft.value, &draft.apportionments)?;
        with_tx!(self, |db_tx| {
            for split in &draft.apportionments {
                self.require_movement_class(&db_tx, split.movement_class_id)
                    .await?;
            }

            let mut fixed = FixedMovement::new(
                identification,
                description,
                draft.value,
                draft.installments,
                draft.auto_launch,
            )?;
            fixed_movements::ActiveModel::from(&fixed).insert(&db_tx).await?;

            for split in &draft.apportionments {
                let apportionment = Apportionment::new(split.movement_class_id, split.value);
                let mut active = apportionments::ActiveModel::from(&apportionment);
                active.fixed_movement_id = ActiveValue::Set(Some(fixed.id.to_string()));
                active.insert(&db_tx).await?;
                fixed.apportionments.push(apportionment);
            }
            Ok(fixed)
        })
    }

    /// Launches the next quote of a fixed movement into a financial period.
    pub async fn launch_fixed_movement(
        &self,
        fixed_movement_id: Uuid,
        financial_period_id: Uuid,
    ) -> ResultEngine<Movement> {
        with_tx!(self, |db_tx| {
            let model = self.require_fixed_movement(&db_tx, fixed_movement_id).await?;
            let fixed = FixedMovement::try_from(model)?;
            if fixed.state == FixedMovementState::Finished {
                return Err(EngineError::violation("fixed-movement.validate.finished"));
            }
            let period = self.require_period(&db_tx, financial_period_id).await?;
            if period.closed {
                return Err(EngineError::violation(
                    "financial-period.validate.already-closed",
                ));
            }
            self.launch_quote(&db_tx, &fixed, &period).await
        })
    }

    /// Launches every active auto-launch template into the period.
    ///
    /// Returns how many movements were raised.
    pub async fn launch_auto_fixed_movements(
        &self,
        financial_period_id: Uuid,
    ) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let period = self.require_period(&db_tx, financial_period_id).await?;
            if period.closed {
                return Err(EngineError::violation(
                    "financial-period.validate.already-closed",
                ));
            }

            let templates = fixed_movements::Entity::find()
                .filter(fixed_movements::Column::State.eq(FixedMovementState::Active.as_str()))
                .filter(fixed_movements::Column::AutoLaunch.eq(true))
                .order_by_asc(fixed_movements::Column::Identification)
                .all(&db_tx)
                .await?;

            let mut launched = 0;
            for model in templates {
                let fixed = FixedMovement::try_from(model)?;
                self.launch_quote(&db_tx, &fixed, &period).await?;
                launched += 1;
            }
            Ok(launched)
        })
    }

    /// Raises one quote of the template as a regular open movement.
    async fn launch_quote(
        &self,
        db_tx: &DatabaseTransaction,
        fixed: &FixedMovement,
        period: &financial_periods::Model,
    ) -> ResultEngine<Movement> {
        let quote = last_quote(db_tx, fixed.id).await? + 1;

        let splits = apportionments::Entity::find()
            .filter(apportionments::Column::FixedMovementId.eq(fixed.id.to_string()))
            .order_by_asc(apportionments::Column::Id)
            .all(db_tx)
            .await?;
        if splits.is_empty() {
            return Err(EngineError::violation(
                "movement.validate.empty-apportionment",
            ));
        }

        let period_id = parse_key(&period.id, "financial period")?;
        let mut movement = Movement::new(
            next_movement_code(),
            fixed.quote_description(quote),
            fixed.value,
            period.ends_on,
            period_id,
        )?;
        movements::ActiveModel::from(&movement).insert(db_tx).await?;

        for split in &splits {
            let class_id = parse_key(&split.movement_class_id, "movement class")?;
            let apportionment = Apportionment::new(class_id, split.value);
            let mut active = apportionments::ActiveModel::from(&apportionment);
            active.movement_id = ActiveValue::Set(Some(movement.id.to_string()));
            active.insert(db_tx).await?;
            movement.apportionments.push(apportionment);
        }

        let launch = Launch::new(fixed.id, movement.id, quote);
        launches::ActiveModel::from(&launch).insert(db_tx).await?;

        if fixed.installments == Some(quote) {
            fixed_movements::ActiveModel {
                id: ActiveValue::Set(fixed.id.to_string()),
                state: ActiveValue::Set(FixedMovementState::Finished.as_str().to_string()),
                ..Default::default()
            }
            .update(db_tx)
            .await?;
        }

        Ok(movement)
    }

    pub async fn find_fixed_movement_by_id(
        &self,
        fixed_movement_id: Uuid,
    ) -> ResultEngine<FixedMovement> {
        with_tx!(self, |db_tx| {
            let model = self.require_fixed_movement(&db_tx, fixed_movement_id).await?;
            assemble_fixed(&db_tx, model).await
        })
    }

    /// Lists templates, optionally only those in one state.
    pub async fn list_fixed_movements(
        &self,
        state: Option<FixedMovementState>,
    ) -> ResultEngine<Vec<FixedMovement>> {
        with_tx!(self, |db_tx| {
            let mut query = fixed_movements::Entity::find();
            if let Some(state) = state {
                query = query.filter(fixed_movements::Column::State.eq(state.as_str()));
            }
            let models = query
                .order_by_asc(fixed_movements::Column::Identification)
                .all(&db_tx)
                .await?;

            let mut templates = Vec::with_capacity(models.len());
            for model in models {
                templates.push(assemble_fixed(&db_tx, model).await?);
            }
            Ok(templates)
        })
    }

    /// Lists the launches of a template in quote order.
    pub async fn list_launches_for(
        &self,
        fixed_movement_id: Uuid,
    ) -> ResultEngine<Vec<Launch>> {
        with_tx!(self, |db_tx| {
            self.require_fixed_movement(&db_tx, fixed_movement_id).await?;
            launches::Entity::find()
                .filter(launches::Column::FixedMovementId.eq(fixed_movement_id.to_string()))
                .order_by_asc(launches::Column::QuoteNumber)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Launch::try_from)
                .collect::<Result<Vec<_>, EngineError>>()
        })
    }

    /// The highest quote number launched so far, zero for none.
    pub async fn last_launch_quote(&self, fixed_movement_id: Uuid) -> ResultEngine<i32> {
        with_tx!(self, |db_tx| {
            self.require_fixed_movement(&db_tx, fixed_movement_id).await?;
            last_quote(&db_tx, fixed_movement_id).await
        })
    }
}

async fn last_quote(db_tx: &DatabaseTransaction, fixed_movement_id: Uuid) -> ResultEngine<i32> {
    let last = launches::Entity::find()
        .filter(launches::Column::FixedMovementId.eq(fixed_movement_id.to_string()))
        .order_by_desc(launches::Column::QuoteNumber)
        .one(db_tx)
        .await?;
    Ok(last.map(|launch| launch.quote_number).unwrap_or(0))
}

/// Loads the splits of a template alongside its row.
async fn assemble_fixed(
    db_tx: &DatabaseTransaction,
    model: fixed_movements::Model,
) -> ResultEngine<FixedMovement> {
    let splits = apportionments::Entity::find()
        .filter(apportionments::Column::FixedMovementId.eq(model.id.clone()))
        .order_by_asc(apportionments::Column::Id)
        .all(db_tx)
        .await?;

    let mut fixed = FixedMovement::try_from(model)?;
    for split in splits {
        fixed.apportionments.push(Apportionment::try_from(split)?);
    }
    Ok(fixed)
}
