//! Fixed movement primitives.
//!
//! A `FixedMovement` is a recurring movement template. Each launch
//! materializes it into a financial period as a regular movement (one
//! "quote"); templates with a determinate number of installments finish when
//! the last quote is launched.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, apportionments::Apportionment};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedMovementState {
    Active,
    Finished,
}

impl FixedMovementState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }
}

impl TryFrom<&str> for FixedMovementState {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "finished" => Ok(Self::Finished),
            other => Err(EngineError::InvalidValue(format!(
                "invalid fixed movement state: {other}"
            ))),
        }
    }
}

/// A recurring movement template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedMovement {
    pub id: Uuid,
    pub identification: String,
    pub description: String,
    pub value: i64,
    /// `None` means the template repeats until finished by hand.
    pub installments: Option<i32>,
    /// Launched automatically when a period opens.
    pub auto_launch: bool,
    pub state: FixedMovementState,
    pub created_at: DateTime<Utc>,
    pub apportionments: Vec<Apportionment>,
}

impl FixedMovement {
    pub fn new(
        identification: String,
        description: String,
        value: i64,
        installments: Option<i32>,
        auto_launch: bool,
    ) -> ResultEngine<Self> {
        if value <= 0 {
            return Err(EngineError::InvalidValue(
                "fixed movement value must be > 0".to_string(),
            ));
        }
        if installments.is_some_and(|total| total <= 0) {
            return Err(EngineError::InvalidValue(
                "installments must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            identification,
            description,
            value,
            installments,
            auto_launch,
            state: FixedMovementState::Active,
            created_at: Utc::now(),
            apportionments: Vec::new(),
        })
    }

    /// The description a launched quote carries, for example "Rent 3/12".
    pub fn quote_description(&self, quote: i32) -> String {
        match self.installments {
            Some(total) => format!("{} {quote}/{total}", self.identification),
            None => format!("{} {quote}", self.identification),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fixed_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub identification: String,
    pub description: String,
    pub value: i64,
    pub installments: Option<i32>,
    pub auto_launch: bool,
    pub state: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::apportionments::Entity")]
    Apportionments,
    #[sea_orm(has_many = "super::launches::Entity")]
    Launches,
}

impl Related<super::apportionments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Apportionments.def()
    }
}

impl Related<super::launches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Launches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FixedMovement> for ActiveModel {
    fn from(value: &FixedMovement) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            identification: ActiveValue::Set(value.identification.clone()),
            description: ActiveValue::Set(value.description.clone()),
            value: ActiveValue::Set(value.value),
            installments: ActiveValue::Set(value.installments),
            auto_launch: ActiveValue::Set(value.auto_launch),
            state: ActiveValue::Set(value.state.as_str().to_string()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for FixedMovement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("fixed movement not exists".to_string()))?,
            identification: model.identification,
            description: model.description,
            value: model.value,
            installments: model.installments,
            auto_launch: model.auto_launch,
            state: FixedMovementState::try_from(model.state.as_str())?,
            created_at: model.created_at,
            apportionments: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_description_shows_installments() {
        let fixed = FixedMovement::new(
            "Rent".to_string(),
            "Monthly rent".to_string(),
            90_000,
            Some(12),
            true,
        )
        .unwrap();

        assert_eq!(fixed.quote_description(3), "Rent 3/12");
    }

    #[test]
    fn quote_description_without_installments() {
        let fixed = FixedMovement::new(
            "Gym".to_string(),
            "Gym subscription".to_string(),
            4_500,
            None,
            false,
        )
        .unwrap();

        assert_eq!(fixed.quote_description(7), "Gym 7");
    }
}
