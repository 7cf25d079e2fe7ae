use uuid::Uuid;

use sea_orm::{QueryFilter, prelude::*};

use crate::{
    EngineError, OwnerRole, ResultEngine, SYSTEM_USER_ID, Wallet, error::conflict_or_database,
    wallets,
};

use super::Engine;

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, wallet_id: Uuid) -> ResultEngine<Wallet> {
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        Wallet::try_from(model)
    }

    /// Look up the wallet of `owner_id` in a currency. Does not lock.
    pub async fn wallet_by_owner(
        &self,
        owner_type: OwnerRole,
        owner_id: Uuid,
        currency_type_id: Uuid,
    ) -> ResultEngine<Wallet> {
        let model = wallets::Entity::find()
            .filter(wallets::Column::OwnerType.eq(owner_type.as_str()))
            .filter(wallets::Column::OwnerId.eq(owner_id.to_string()))
            .filter(wallets::Column::CurrencyTypeId.eq(currency_type_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        Wallet::try_from(model)
    }

    /// The treasury wallet of a currency: the `system` user's wallet in it.
    pub async fn system_wallet(&self, currency_type_id: Uuid) -> ResultEngine<Wallet> {
        match self
            .wallet_by_owner(OwnerRole::System, SYSTEM_USER_ID, currency_type_id)
            .await
        {
            Err(EngineError::KeyNotFound(_)) => Err(EngineError::KeyNotFound(
                "system wallet not exists".to_string(),
            )),
            other => other,
        }
    }

    /// Insert a wallet.
    ///
    /// Fails with [`EngineError::Conflict`] when the owner already has a
    /// wallet in that currency.
    pub async fn create_wallet(&self, wallet: &Wallet) -> ResultEngine<Wallet> {
        let model = wallets::ActiveModel::from(wallet)
            .insert(&self.database)
            .await
            .map_err(|err| conflict_or_database(err, "wallet"))?;
        tracing::debug!(
            wallet_id = %wallet.id,
            owner_id = %wallet.owner_id,
            currency_type_id = %wallet.currency_type_id,
            "created wallet"
        );
        Wallet::try_from(model)
    }

    /// Return the owner's wallet in a currency, creating an empty one on first
    /// use.
    ///
    /// Two first-time callers may both miss the lookup; the loser of the insert
    /// race gets `Conflict` from the unique index and simply re-reads the
    /// winner's wallet.
    ///
    /// Treasuries are only opened by [`Engine::ensure_treasury`]: a missing
    /// `system` wallet is an [`EngineError::InvalidOperation`].
    pub async fn resolve_or_create_wallet(
        &self,
        owner_id: Uuid,
        currency_type_id: Uuid,
    ) -> ResultEngine<Wallet> {
        let role = self.owner_role(owner_id).await?;

        match self.wallet_by_owner(role, owner_id, currency_type_id).await {
            Ok(wallet) => return Ok(wallet),
            Err(EngineError::KeyNotFound(_)) => {}
            Err(err) => return Err(err),
        }

        if role == OwnerRole::System {
            return Err(EngineError::InvalidOperation(
                "treasury wallets are opened at bootstrap".to_string(),
            ));
        }

        // Surface an unknown currency as NotFound instead of a foreign key error.
        self.currency_type(currency_type_id).await?;

        let wallet = Wallet::new(role, owner_id, currency_type_id);
        match self.create_wallet(&wallet).await {
            Ok(created) => Ok(created),
            Err(EngineError::Conflict(_)) => {
                tracing::debug!(%owner_id, %currency_type_id, "lost wallet creation race");
                self.wallet_by_owner(role, owner_id, currency_type_id).await
            }
            Err(err) => Err(err),
        }
    }
}
