use uuid::Uuid;

use sea_orm::prelude::*;

use crate::{
    EngineError, OwnerRole, ResultEngine, SYSTEM_USER_ID, User, error::conflict_or_database,
    users,
};

use super::Engine;

impl Engine {
    /// Return a user by id.
    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
        User::try_from(model)
    }

    /// Identity lookup used to tag new wallets with their `owner_type`.
    pub async fn owner_role(&self, owner_id: Uuid) -> ResultEngine<OwnerRole> {
        Ok(self.user(owner_id).await?.role)
    }

    /// Create a user with a fresh id.
    ///
    /// The `system` role is reserved for the treasury owner created by
    /// [`Engine::ensure_system_user`]; asking for it here is an
    /// [`EngineError::InvalidOperation`].
    pub async fn new_user(&self, name: &str, role: OwnerRole) -> ResultEngine<User> {
        self.insert_user(User::new(name, role)?).await
    }

    /// Create a user with a caller-chosen id. Fails with `Conflict` if the id
    /// is taken.
    pub async fn new_user_with_id(
        &self,
        user_id: Uuid,
        name: &str,
        role: OwnerRole,
    ) -> ResultEngine<User> {
        self.insert_user(User::with_id(user_id, name, role)?).await
    }

    pub(super) async fn insert_user(&self, user: User) -> ResultEngine<User> {
        if user.role == OwnerRole::System && user.id != SYSTEM_USER_ID {
            return Err(EngineError::InvalidOperation(
                "system role is reserved for the treasury owner".to_string(),
            ));
        }
        let model = users::ActiveModel::from(&user)
            .insert(&self.database)
            .await
            .map_err(|err| conflict_or_database(err, &user.id.to_string()))?;
        tracing::debug!(user_id = %user.id, role = %user.role, "created user");
        User::try_from(model)
    }
}
