use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    CurrencyType, EngineError, ResultEngine, currency,
    currency::normalize_currency_name,
    error::conflict_or_database,
};

use super::Engine;

impl Engine {
    /// All registered currency types, ordered by name.
    pub async fn currency_types(&self) -> ResultEngine<Vec<CurrencyType>> {
        currency::Entity::find()
            .order_by_asc(currency::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(CurrencyType::try_from)
            .collect()
    }

    pub async fn currency_type(&self, currency_type_id: Uuid) -> ResultEngine<CurrencyType> {
        let model = currency::Entity::find_by_id(currency_type_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("currency type not exists".to_string()))?;
        CurrencyType::try_from(model)
    }

    pub async fn currency_type_by_name(&self, name: &str) -> ResultEngine<CurrencyType> {
        let name = normalize_currency_name(name)?;
        let model = currency::Entity::find()
            .filter(currency::Column::Name.eq(name.clone()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(name))?;
        CurrencyType::try_from(model)
    }

    /// Register a currency type if it does not exist yet and return it.
    ///
    /// Safe to call concurrently and repeatedly: a lost insert race is
    /// resolved by re-reading the winner's row.
    pub async fn ensure_currency_type(&self, name: &str) -> ResultEngine<CurrencyType> {
        match self.currency_type_by_name(name).await {
            Ok(existing) => return Ok(existing),
            Err(EngineError::KeyNotFound(_)) => {}
            Err(err) => return Err(err),
        }

        let currency = CurrencyType::new(name)?;
        match currency::ActiveModel::from(&currency)
            .insert(&self.database)
            .await
            .map_err(|err| conflict_or_database(err, &currency.name))
        {
            Ok(model) => {
                tracing::info!(currency = %currency.name, "registered currency type");
                CurrencyType::try_from(model)
            }
            Err(EngineError::Conflict(_)) => self.currency_type_by_name(&currency.name).await,
            Err(err) => Err(err),
        }
    }
}
