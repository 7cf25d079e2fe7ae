use uuid::Uuid;

use crate::{
    EngineError, OwnerRole, ResultEngine, SYSTEM_USER_ID, SYSTEM_USER_NAME, User, Wallet,
};

use super::Engine;

/// Opening balance of a treasury wallet created at bootstrap.
pub const DEFAULT_TREASURY_BALANCE: i64 = 1_000_000;

impl Engine {
    /// Return the `system` user, creating it if needed.
    ///
    /// The user always has id [`SYSTEM_USER_ID`]; a concurrent bootstrap that
    /// loses the insert re-reads the winner's row.
    pub async fn ensure_system_user(&self) -> ResultEngine<User> {
        match self.user(SYSTEM_USER_ID).await {
            Ok(existing) => return Ok(existing),
            Err(EngineError::KeyNotFound(_)) => {}
            Err(err) => return Err(err),
        }

        let system = User::with_id(SYSTEM_USER_ID, SYSTEM_USER_NAME, OwnerRole::System)?;
        match self.insert_user(system).await {
            Ok(created) => {
                tracing::info!(user_id = %created.id, "created system user");
                Ok(created)
            }
            Err(EngineError::Conflict(_)) => self.user(SYSTEM_USER_ID).await,
            Err(err) => Err(err),
        }
    }

    /// Return the treasury wallet of a currency, creating it with
    /// `opening_balance` if it does not exist.
    ///
    /// This is the only place where value enters the ledger without a
    /// matching debit. The store admits one `system` wallet per currency, so
    /// racing callers all end up with the same treasury and only the winner's
    /// opening balance is minted.
    pub async fn ensure_treasury(
        &self,
        currency_type_id: Uuid,
        opening_balance: i64,
    ) -> ResultEngine<Wallet> {
        match self.system_wallet(currency_type_id).await {
            Ok(wallet) => return Ok(wallet),
            Err(EngineError::KeyNotFound(_)) => {}
            Err(err) => return Err(err),
        }
        self.currency_type(currency_type_id).await?;

        let system = self.ensure_system_user().await?;
        let wallet = Wallet::treasury(system.id, currency_type_id, opening_balance)?;
        match self.create_wallet(&wallet).await {
            Ok(created) => {
                tracing::info!(
                    wallet_id = %created.id,
                    %currency_type_id,
                    opening_balance,
                    "created treasury wallet"
                );
                Ok(created)
            }
            Err(EngineError::Conflict(_)) => {
                tracing::debug!(%currency_type_id, "lost treasury creation race");
                self.system_wallet(currency_type_id).await
            }
            Err(err) => Err(err),
        }
    }
}
