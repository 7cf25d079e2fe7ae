//! User API endpoints

use api_types::user::{OwnerRole as ApiRole, UserView};
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn map_role(role: engine::OwnerRole) -> ApiRole {
    match role {
        engine::OwnerRole::User => ApiRole::User,
        engine::OwnerRole::System => ApiRole::System,
    }
}

pub async fn get(
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.deadline(state.engine.user(user_id)).await?;

    Ok(Json(UserView {
        id: user.id,
        name: user.name,
        role: map_role(user.role),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }))
}
