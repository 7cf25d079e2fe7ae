use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod currencies;
mod server;
mod user;
mod wallets;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    /// The request did not finish within the configured deadline.
    Timeout,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::InsufficientFunds(_) | EngineError::InvalidOperation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "storage unavailable, retry later".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "request timed out".to_string(),
            ),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
