//! Currency registry primitives.
//!
//! A [`CurrencyType`] is one of the fixed currencies the ledger knows about
//! (`gold`, `diamond`, `loyalty_points`). Every wallet belongs to exactly one
//! currency type and value only moves between wallets of the same type.
//!
//! Currency types are created once at bootstrap and never change afterwards.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Currencies registered by the bootstrap/seed step.
pub const DEFAULT_CURRENCY_NAMES: [&str; 3] = ["gold", "diamond", "loyalty_points"];

const MAX_NAME_LEN: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyType {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CurrencyType {
    /// Build a new currency type with a fresh id.
    ///
    /// The name is trimmed and lower-cased so `Gold` and `gold ` resolve to
    /// the same registry entry.
    pub fn new(name: &str) -> ResultEngine<Self> {
        let name = normalize_currency_name(name)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            created_at: now,
            updated_at: now,
        })
    }
}

pub(crate) fn normalize_currency_name(name: &str) -> ResultEngine<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(EngineError::InvalidOperation(
            "currency name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(EngineError::InvalidOperation(format!(
            "currency name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "currency_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallets::Entity")]
    Wallets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CurrencyType> for ActiveModel {
    fn from(value: &CurrencyType) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for CurrencyType {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("currency type not exists".to_string()))?,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_normalized() {
        let currency = CurrencyType::new("  Gold ").unwrap();
        assert_eq!(currency.name, "gold");
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(
            CurrencyType::new("   ").unwrap_err(),
            EngineError::InvalidOperation("currency name must not be empty".to_string())
        );
    }

    #[test]
    fn overlong_name_is_rejected() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            CurrencyType::new(&name),
            Err(EngineError::InvalidOperation(_))
        ));
    }
}
