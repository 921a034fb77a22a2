//! The module contains `Apportionment` struct and its implementation.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// A split of an owner's value into one movement class.
///
/// Owned by exactly one movement or fixed movement; removing it from the
/// owner's edit set deletes the row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apportionment {
    pub id: Uuid,
    pub movement_class_id: Uuid,
    pub value: i64,
}

impl Apportionment {
    pub fn new(movement_class_id: Uuid, value: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            movement_class_id,
            value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "apportionments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub value: i64,
    pub movement_id: Option<String>,
    pub fixed_movement_id: Option<String>,
    pub movement_class_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movements::Entity",
        from = "Column::MovementId",
        to = "super::movements::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Movements,
    #[sea_orm(
        belongs_to = "super::fixed_movements::Entity",
        from = "Column::FixedMovementId",
        to = "super::fixed_movements::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    FixedMovements,
    #[sea_orm(
        belongs_to = "super::movement_classes::Entity",
        from = "Column::MovementClassId",
        to = "super::movement_classes::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    MovementClasses,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl Related<super::fixed_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FixedMovements.def()
    }
}

impl Related<super::movement_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementClasses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Apportionment> for ActiveModel {
    fn from(value: &Apportionment) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            value: ActiveValue::Set(value.value),
            movement_id: ActiveValue::NotSet,
            fixed_movement_id: ActiveValue::NotSet,
            movement_class_id: ActiveValue::Set(value.movement_class_id.to_string()),
        }
    }
}

impl TryFrom<Model> for Apportionment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("apportionment not exists".to_string()))?,
            movement_class_id: Uuid::parse_str(&model.movement_class_id)
                .map_err(|_| EngineError::KeyNotFound("movement class not exists".to_string()))?,
            value: model.value,
        })
    }
}
