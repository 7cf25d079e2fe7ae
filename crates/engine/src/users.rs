//! Users table and owner roles.
//!
//! The engine only needs users to answer one question: which role tags a new
//! wallet's `owner_type`. The `system` user owns every treasury wallet.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Name of the user that owns the treasury wallets.
pub const SYSTEM_USER_NAME: &str = "system";

/// Fixed id of the `system` user. Every deployment shares it, so concurrent
/// bootstraps collide on the primary key instead of creating a second owner.
pub const SYSTEM_USER_ID: Uuid = Uuid::from_u128(0x5f1c_0000_0000_4000_8000_0000_0000_0001);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerRole {
    #[default]
    User,
    System,
}

impl OwnerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
        }
    }
}

impl core::fmt::Display for OwnerRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OwnerRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            other => Err(EngineError::InvalidOperation(format!(
                "invalid owner role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: OwnerRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, role: OwnerRole) -> ResultEngine<Self> {
        Self::with_id(Uuid::new_v4(), name, role)
    }

    pub fn with_id(id: Uuid, name: &str, role: OwnerRole) -> ResultEngine<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidOperation(
                "user name must not be empty".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            name: name.to_string(),
            role,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(value: &User) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            role: ActiveValue::Set(value.role.as_str().to_string()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("user not exists".to_string()))?,
            name: model.name,
            role: OwnerRole::try_from(model.role.as_str())?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
