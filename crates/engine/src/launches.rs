//! The module contains `Launch` struct and its implementation.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// One materialization of a fixed movement into a financial period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Launch {
    pub id: Uuid,
    pub fixed_movement_id: Uuid,
    pub movement_id: Uuid,
    /// 1-based counter per fixed movement.
    pub quote_number: i32,
}

impl Launch {
    pub fn new(fixed_movement_id: Uuid, movement_id: Uuid, quote_number: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            fixed_movement_id,
            movement_id,
            quote_number,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "launches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub quote_number: i32,
    pub fixed_movement_id: String,
    pub movement_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fixed_movements::Entity",
        from = "Column::FixedMovementId",
        to = "super::fixed_movements::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    FixedMovements,
    #[sea_orm(
        belongs_to = "super::movements::Entity",
        from = "Column::MovementId",
        to = "super::movements::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Movements,
}

impl Related<super::fixed_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FixedMovements.def()
    }
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Launch> for ActiveModel {
    fn from(value: &Launch) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            quote_number: ActiveValue::Set(value.quote_number),
            fixed_movement_id: ActiveValue::Set(value.fixed_movement_id.to_string()),
            movement_id: ActiveValue::Set(value.movement_id.to_string()),
        }
    }
}

impl TryFrom<Model> for Launch {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("launch not exists".to_string()))?,
            fixed_movement_id: Uuid::parse_str(&model.fixed_movement_id)
                .map_err(|_| EngineError::KeyNotFound("fixed movement not exists".to_string()))?,
            movement_id: Uuid::parse_str(&model.movement_id)
                .map_err(|_| EngineError::KeyNotFound("movement not exists".to_string()))?,
            quote_number: model.quote_number,
        })
    }
}
