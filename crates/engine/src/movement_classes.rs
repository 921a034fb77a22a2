//! The module contains `MovementClass` struct and its implementation.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// The direction of a movement class.
///
/// `In` classes receive revenues, `Out` classes take expenses. A movement
/// inherits its direction from the classes of its apportionments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    In,
    Out,
}

impl ClassType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl TryFrom<&str> for ClassType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(EngineError::InvalidValue(format!(
                "invalid class type: {other}"
            ))),
        }
    }
}

/// A movement class.
///
/// A class is a budget category inside a cost center. Its `budget` is the
/// share of the cost center ceiling the class may consume; classes of the
/// same type under one cost center compete for that ceiling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementClass {
    pub id: Uuid,
    pub name: String,
    pub class_type: ClassType,
    pub cost_center_id: Uuid,
    /// Budget share in cents.
    pub budget: i64,
    pub blocked: bool,
}

impl MovementClass {
    pub fn new(name: String, class_type: ClassType, cost_center_id: Uuid, budget: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            class_type,
            cost_center_id,
            budget,
            blocked: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movement_classes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub class_type: String,
    pub budget: i64,
    pub blocked: bool,
    pub cost_center_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cost_centers::Entity",
        from = "Column::CostCenterId",
        to = "super::cost_centers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    CostCenters,
    #[sea_orm(has_many = "super::apportionments::Entity")]
    Apportionments,
}

impl Related<super::cost_centers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CostCenters.def()
    }
}

impl Related<super::apportionments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Apportionments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&MovementClass> for ActiveModel {
    fn from(value: &MovementClass) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            class_type: ActiveValue::Set(value.class_type.as_str().to_string()),
            budget: ActiveValue::Set(value.budget),
            blocked: ActiveValue::Set(value.blocked),
            cost_center_id: ActiveValue::Set(value.cost_center_id.to_string()),
        }
    }
}

impl TryFrom<Model> for MovementClass {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("movement class not exists".to_string()))?,
            name: model.name,
            class_type: ClassType::try_from(model.class_type.as_str())?,
            cost_center_id: Uuid::parse_str(&model.cost_center_id)
                .map_err(|_| EngineError::KeyNotFound("cost center not exists".to_string()))?,
            budget: model.budget,
            blocked: model.blocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_type_round_trips() {
        for class_type in [ClassType::In, ClassType::Out] {
            assert_eq!(ClassType::try_from(class_type.as_str()).unwrap(), class_type);
        }
        assert!(ClassType::try_from("sideways").is_err());
    }
}
