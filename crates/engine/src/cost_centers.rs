//! The module contains `CostCenter` struct and its implementation.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, movement_classes::ClassType};

/// A cost center.
///
/// Cost centers group movement classes, optionally under a parent cost
/// center. Each direction carries its own budget ceiling; a ceiling of zero
/// means the cost center does not control that direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCenter {
    /// Stable identifier, generated once and persisted so the cost center can
    /// be renamed without breaking references.
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    /// Ceiling for revenue classes, in cents.
    pub revenues_budget: i64,
    /// Ceiling for expense classes, in cents.
    pub expenses_budget: i64,
    pub blocked: bool,
}

impl CostCenter {
    pub fn new(
        name: String,
        description: Option<String>,
        parent_id: Option<Uuid>,
        revenues_budget: i64,
        expenses_budget: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            parent_id,
            revenues_budget,
            expenses_budget,
            blocked: false,
        }
    }

    /// Whether this cost center enforces budget control for a direction.
    pub fn controls_budget(&self, class_type: ClassType) -> bool {
        self.ceiling_for(class_type) > 0
    }

    /// The budget ceiling for a direction, in cents.
    pub fn ceiling_for(&self, class_type: ClassType) -> i64 {
        match class_type {
            ClassType::In => self.revenues_budget,
            ClassType::Out => self.expenses_budget,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cost_centers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub revenues_budget: i64,
    pub expenses_budget: i64,
    pub blocked: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movement_classes::Entity")]
    MovementClasses,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Parent,
}

impl Related<super::movement_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementClasses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CostCenter> for ActiveModel {
    fn from(value: &CostCenter) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            parent_id: ActiveValue::Set(value.parent_id.map(|id| id.to_string())),
            revenues_budget: ActiveValue::Set(value.revenues_budget),
            expenses_budget: ActiveValue::Set(value.expenses_budget),
            blocked: ActiveValue::Set(value.blocked),
        }
    }
}

impl TryFrom<Model> for CostCenter {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("cost center not exists".to_string()))?,
            name: model.name,
            description: model.description,
            parent_id: model.parent_id.and_then(|s| Uuid::parse_str(&s).ok()),
            revenues_budget: model.revenues_budget,
            expenses_budget: model.expenses_budget,
            blocked: model.blocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ceiling_disables_control() {
        let center = CostCenter::new("Home".to_string(), None, None, 0, 50_000);

        assert!(!center.controls_budget(ClassType::In));
        assert!(center.controls_budget(ClassType::Out));
        assert_eq!(center.ceiling_for(ClassType::Out), 50_000);
    }
}
