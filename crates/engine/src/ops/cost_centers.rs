use uuid::Uuid;

use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{CostCenter, EngineError, Page, PageRequest, ResultEngine, cost_centers};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

/// Applies the `(name, parent)` uniqueness scope to a cost center query.
fn scope_by_name_and_parent(
    query: Select<cost_centers::Entity>,
    name_lower: &str,
    parent_id: Option<Uuid>,
) -> Select<cost_centers::Entity> {
    let query = query.filter(Expr::cust("LOWER(name)").eq(name_lower));
    match parent_id {
        Some(parent) => query.filter(cost_centers::Column::ParentId.eq(parent.to_string())),
        None => query.filter(cost_centers::Column::ParentId.is_null()),
    }
}

impl Engine {
    /// Creates a cost center.
    ///
    /// Names are unique under the same parent, case-insensitive.
    pub async fn save_cost_center(
        &self,
        name: &str,
        description: Option<&str>,
        parent_id: Option<Uuid>,
        revenues_budget: i64,
        expenses_budget: i64,
    ) -> ResultEngine<CostCenter> {
        let name = normalize_required_name(name, "cost center name")?;
        let description = normalize_optional_text(description);
        if revenues_budget < 0 || expenses_budget < 0 {
            return Err(EngineError::InvalidValue(
                "budget ceilings must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            if let Some(parent) = parent_id {
                self.require_cost_center(&db_tx, parent).await?;
            }

            let exists = scope_by_name_and_parent(
                cost_centers::Entity::find(),
                &name.to_lowercase(),
                parent_id,
            )
            .one(&db_tx)
            .await?
            .is_some();
            if exists {
                return Err(EngineError::violation("cost-center.validate.duplicated"));
            }

            let center = CostCenter::new(
                name,
                description,
                parent_id,
                revenues_budget,
                expenses_budget,
            );
            cost_centers::ActiveModel::from(&center).insert(&db_tx).await?;
            Ok(center)
        })
    }

    /// Updates a cost center, keeping the `(name, parent)` uniqueness rule.
    pub async fn update_cost_center(
        &self,
        cost_center_id: Uuid,
        name: &str,
        description: Option<&str>,
        parent_id: Option<Uuid>,
        revenues_budget: i64,
        expenses_budget: i64,
        blocked: bool,
    ) -> ResultEngine<CostCenter> {
        let name = normalize_required_name(name, "cost center name")?;
        let description = normalize_optional_text(description);
        if revenues_budget < 0 || expenses_budget < 0 {
            return Err(EngineError::InvalidValue(
                "budget ceilings must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_cost_center(&db_tx, cost_center_id).await?;
            if let Some(parent) = parent_id {
                self.require_cost_center(&db_tx, parent).await?;
            }

            let exists = scope_by_name_and_parent(
                cost_centers::Entity::find()
                    .filter(cost_centers::Column::Id.ne(cost_center_id.to_string())),
                &name.to_lowercase(),
                parent_id,
            )
            .one(&db_tx)
            .await?
            .is_some();
            if exists {
                return Err(EngineError::violation("cost-center.validate.duplicated"));
            }

            let active = cost_centers::ActiveModel {
                id: ActiveValue::Set(cost_center_id.to_string()),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(description),
                parent_id: ActiveValue::Set(parent_id.map(|id| id.to_string())),
                revenues_budget: ActiveValue::Set(revenues_budget),
                expenses_budget: ActiveValue::Set(expenses_budget),
                blocked: ActiveValue::Set(blocked),
            };
            let model = active.update(&db_tx).await?;
            CostCenter::try_from(model)
        })
    }

    /// Deletes a cost center.
    ///
    /// The database restricts the delete while movement classes still
    /// reference it.
    pub async fn delete_cost_center(&self, cost_center_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_cost_center(&db_tx, cost_center_id).await?;
            cost_centers::Entity::delete_by_id(cost_center_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub async fn find_cost_center_by_id(&self, cost_center_id: Uuid) -> ResultEngine<CostCenter> {
        with_tx!(self, |db_tx| {
            let model = self.require_cost_center(&db_tx, cost_center_id).await?;
            CostCenter::try_from(model)
        })
    }

    pub async fn find_cost_center_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> ResultEngine<Option<CostCenter>> {
        let name = normalize_required_name(name, "cost center name")?;
        with_tx!(self, |db_tx| {
            let model = scope_by_name_and_parent(
                cost_centers::Entity::find(),
                &name.to_lowercase(),
                parent_id,
            )
            .one(&db_tx)
            .await?;
            model.map(CostCenter::try_from).transpose()
        })
    }

    /// Lists cost centers, optionally only (un)blocked ones.
    pub async fn list_cost_centers(&self, blocked: Option<bool>) -> ResultEngine<Vec<CostCenter>> {
        with_tx!(self, |db_tx| {
            let mut query =
                cost_centers::Entity::find().order_by_asc(cost_centers::Column::Name);
            if let Some(blocked) = blocked {
                query = query.filter(cost_centers::Column::Blocked.eq(blocked));
            }
            let models = query.all(&db_tx).await?;
            models.into_iter().map(CostCenter::try_from).collect()
        })
    }

    /// Pageable variant of [`Engine::list_cost_centers`].
    pub async fn list_cost_centers_lazily(
        &self,
        blocked: Option<bool>,
        page: PageRequest,
    ) -> ResultEngine<Page<CostCenter>> {
        page.validate()?;
        with_tx!(self, |db_tx| {
            let mut query = cost_centers::Entity::find()
                .order_by_asc(cost_centers::Column::Name)
                .offset(page.offset())
                .limit(page.fetch_limit());
            if let Some(blocked) = blocked {
                query = query.filter(cost_centers::Column::Blocked.eq(blocked));
            }
            let models = query.all(&db_tx).await?;
            let items: Vec<CostCenter> = models
                .into_iter()
                .map(CostCenter::try_from)
                .collect::<ResultEngine<_>>()?;
            Ok(Page::from_rows(items, &page))
        })
    }
}
