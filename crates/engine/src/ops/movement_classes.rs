use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, Statement,
    TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{
    ClassType, CostCenter, EngineError, MoneyCents, MovementClass, Page, PageRequest,
    ResultEngine, movement_classes,
};

use super::{Engine, normalize_required_name, with_tx};

/// Applies the `(name, type, cost center)` uniqueness scope to a class query.
fn scope_by_name_type_and_center(
    query: Select<movement_classes::Entity>,
    name_lower: &str,
    class_type: ClassType,
    cost_center_id: Uuid,
) -> Select<movement_classes::Entity> {
    query
        .filter(Expr::cust("LOWER(name)").eq(name_lower))
        .filter(movement_classes::Column::ClassType.eq(class_type.as_str()))
        .filter(movement_classes::Column::CostCenterId.eq(cost_center_id.to_string()))
}

/// Checks the cost center ceiling for one direction against the budgets
/// already handed out to sibling classes.
///
/// Skipped entirely when the cost center does not control the direction.
async fn ensure_budget_available(
    db_tx: &DatabaseTransaction,
    center: &CostCenter,
    class_type: ClassType,
    budget: i64,
    exclude_id: Option<Uuid>,
) -> ResultEngine<()> {
    if !center.controls_budget(class_type) {
        return Ok(());
    }

    let stmt = match exclude_id {
        Some(id) => Statement::from_sql_and_values(
            db_tx.get_database_backend(),
            "SELECT COALESCE(SUM(budget), 0) AS sum \
             FROM movement_classes \
             WHERE cost_center_id = ? \
               AND class_type = ? \
               AND id <> ?",
            vec![
                center.id.to_string().into(),
                class_type.as_str().into(),
                id.to_string().into(),
            ],
        ),
        None => Statement::from_sql_and_values(
            db_tx.get_database_backend(),
            "SELECT COALESCE(SUM(budget), 0) AS sum \
             FROM movement_classes \
             WHERE cost_center_id = ? \
               AND class_type = ?",
            vec![center.id.to_string().into(), class_type.as_str().into()],
        ),
    };
    let row = db_tx.query_one(stmt).await?;
    let consumed: i64 = row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0);

    let available = center.ceiling_for(class_type) - consumed;
    if available < budget {
        return Err(EngineError::violation_with(
            "movement-class.validate.no-budget",
            vec![MoneyCents::new(available).to_string()],
        ));
    }
    Ok(())
}

impl Engine {
    /// Creates a movement class inside a cost center.
    ///
    /// When the cost center controls the class direction, the new budget must
    /// fit in what the ceiling still has left.
    pub async fn save_movement_class(
        &self,
        name: &str,
        class_type: ClassType,
        cost_center_id: Uuid,
        budget: i64,
    ) -> ResultEngine<MovementClass> {
        let name = normalize_required_name(name, "movement class name")?;
        if budget < 0 {
            return Err(EngineError::InvalidValue(
                "class budget must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let center_model = self.require_cost_center(&db_tx, cost_center_id).await?;
            let center = CostCenter::try_from(center_model)?;

            let exists = scope_by_name_type_and_center(
                movement_classes::Entity::find(),
                &name.to_lowercase(),
                class_type,
                cost_center_id,
            )
            .one(&db_tx)
            .await?
            .is_some();
            if exists {
                return Err(EngineError::violation("movement-class.validate.duplicated"));
            }

            ensure_budget_available(&db_tx, &center, class_type, budget, None).await?;

            let class = MovementClass::new(name, class_type, cost_center_id, budget);
            movement_classes::ActiveModel::from(&class)
                .insert(&db_tx)
                .await?;
            Ok(class)
        })
    }

    /// Updates a movement class, re-running the duplicate and ceiling checks
    /// without counting the class itself.
    pub async fn update_movement_class(
        &self,
        movement_class_id: Uuid,
        name: &str,
        class_type: ClassType,
        cost_center_id: Uuid,
        budget: i64,
        blocked: bool,
    ) -> ResultEngine<MovementClass> {
        let name = normalize_required_name(name, "movement class name")?;
        if budget < 0 {
            return Err(EngineError::InvalidValue(
                "class budget must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_movement_class(&db_tx, movement_class_id)
                .await?;
            let center_model = self.require_cost_center(&db_tx, cost_center_id).await?;
            let center = CostCenter::try_from(center_model)?;

            let exists = scope_by_name_type_and_center(
                movement_classes::Entity::find()
                    .filter(movement_classes::Column::Id.ne(movement_class_id.to_string())),
                &name.to_lowercase(),
                class_type,
                cost_center_id,
            )
            .one(&db_tx)
            .await?
            .is_some();
            if exists {
                return Err(EngineError::violation("movement-class.validate.duplicated"));
            }

            ensure_budget_available(
                &db_tx,
                &center,
                class_type,
                budget,
                Some(movement_class_id),
            )
            .await?;

            let active = movement_classes::ActiveModel {
                id: ActiveValue::Set(movement_class_id.to_string()),
                name: ActiveValue::Set(name),
                class_type: ActiveValue::Set(class_type.as_str().to_string()),
                budget: ActiveValue::Set(budget),
                blocked: ActiveValue::Set(blocked),
                cost_center_id: ActiveValue::Set(cost_center_id.to_string()),
            };
            let model = active.update(&db_tx).await?;
            MovementClass::try_from(model)
        })
    }

    /// Deletes a movement class.
    ///
    /// The database restricts the delete while apportionments still point at
    /// the class.
    pub async fn delete_movement_class(&self, movement_class_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_movement_class(&db_tx, movement_class_id)
                .await?;
            movement_classes::Entity::delete_by_id(movement_class_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub async fn find_movement_class_by_id(
        &self,
        movement_class_id: Uuid,
    ) -> ResultEngine<MovementClass> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_movement_class(&db_tx, movement_class_id)
                .await?;
            MovementClass::try_from(model)
        })
    }

    pub async fn find_movement_class_by_name_type_and_cost_center(
        &self,
        name: &str,
        class_type: ClassType,
        cost_center_id: Uuid,
    ) -> ResultEngine<Option<MovementClass>> {
        let name = normalize_required_name(name, "movement class name")?;
        with_tx!(self, |db_tx| {
            let model = scope_by_name_type_and_center(
                movement_classes::Entity::find(),
                &name.to_lowercase(),
                class_type,
                cost_center_id,
            )
            .one(&db_tx)
            .await?;
            model.map(MovementClass::try_from).transpose()
        })
    }

    /// Lists movement classes, optionally only (un)blocked ones.
    pub async fn list_movement_classes(
        &self,
        blocked: Option<bool>,
    ) -> ResultEngine<Vec<MovementClass>> {
        with_tx!(self, |db_tx| {
            let mut query =
                movement_classes::Entity::find().order_by_asc(movement_classes::Column::Name);
            if let Some(blocked) = blocked {
                query = query.filter(movement_classes::Column::Blocked.eq(blocked));
            }
            let models = query.all(&db_tx).await?;
            models.into_iter().map(MovementClass::try_from).collect()
        })
    }

    /// Pageable variant of [`Engine::list_movement_classes`].
    pub async fn list_movement_classes_lazily(
        &self,
        blocked: Option<bool>,
        page: PageRequest,
    ) -> ResultEngine<Page<MovementClass>> {
        page.validate()?;
        with_tx!(self, |db_tx| {
            let mut query = movement_classes::Entity::find()
                .order_by_asc(movement_classes::Column::Name)
                .offset(page.offset())
                .limit(page.fetch_limit());
            if let Some(blocked) = blocked {
                query = query.filter(movement_classes::Column::Blocked.eq(blocked));
            }
            let models = query.all(&db_tx).await?;
            let items: Vec<MovementClass> = models
                .into_iter()
                .map(MovementClass::try_from)
                .collect::<ResultEngine<_>>()?;
            Ok(Page::from_rows(items, &page))
        })
    }

    /// Lists the unblocked classes of one direction under a cost center.
    pub async fn list_movement_classes_by_cost_center_and_type(
        &self,
        cost_center_id: Uuid,
        class_type: ClassType,
    ) -> ResultEngine<Vec<MovementClass>> {
        with_tx!(self, |db_tx| {
            self.require_cost_center(&db_tx, cost_center_id).await?;
            let models = movement_classes::Entity::find()
                .filter(movement_classes::Column::CostCenterId.eq(cost_center_id.to_string()))
                .filter(movement_classes::Column::ClassType.eq(class_type.as_str()))
                .filter(movement_classes::Column::Blocked.eq(false))
                .order_by_asc(movement_classes::Column::Name)
                .all(&db_tx)
                .await?;
            models.into_iter().map(MovementClass::try_from).collect()
        })
    }
}
