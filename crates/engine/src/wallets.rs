//! The module contains `Wallet` struct and its implementation.

use chrono::{DateTime, Utc};

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, OwnerRole, ResultEngine};

/// A wallet.
///
/// A wallet is the balance bucket of one owner in one currency. The triple
/// `(owner_type, owner_id, currency_type_id)` is unique and the balance never
/// goes below zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Stable identifier for this wallet.
    pub id: Uuid,
    pub owner_type: OwnerRole,
    pub owner_id: Uuid,
    pub currency_type_id: Uuid,
    pub balance: i64,
    /// Bumped on every balance change.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// A fresh, empty wallet for `owner_id` in the given currency.
    pub fn new(owner_type: OwnerRole, owner_id: Uuid, currency_type_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_type,
            owner_id,
            currency_type_id,
            balance: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// A treasury wallet seeded with `opening_balance`.
    pub fn treasury(
        system_owner_id: Uuid,
        currency_type_id: Uuid,
        opening_balance: i64,
    ) -> ResultEngine<Self> {
        if opening_balance < 0 {
            return Err(EngineError::InvalidOperation(
                "treasury opening balance must be >= 0".to_string(),
            ));
        }
        let mut wallet = Self::new(OwnerRole::System, system_owner_id, currency_type_id);
        wallet.balance = opening_balance;
        Ok(wallet)
    }

    pub fn is_system(&self) -> bool {
        self.owner_type == OwnerRole::System
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_type: String,
    pub owner_id: String,
    pub currency_type_id: String,
    pub balance: i64,
    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(
        belongs_to = "super::currency::Entity",
        from = "Column::CurrencyTypeId",
        to = "super::currency::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    CurrencyTypes,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::currency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CurrencyTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner_type: ActiveValue::Set(value.owner_type.as_str().to_string()),
            owner_id: ActiveValue::Set(value.owner_id.to_string()),
            currency_type_id: ActiveValue::Set(value.currency_type_id.to_string()),
            balance: ActiveValue::Set(value.balance),
            version: ActiveValue::Set(value.version),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let parse = |raw: &str, what: &str| {
            Uuid::parse_str(raw).map_err(|_| EngineError::KeyNotFound(format!("{what} not exists")))
        };
        Ok(Self {
            id: parse(&model.id, "wallet")?,
            owner_type: OwnerRole::try_from(model.owner_type.as_str())?,
            owner_id: parse(&model.owner_id, "owner")?,
            currency_type_id: parse(&model.currency_type_id, "currency type")?,
            balance: model.balance,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
