use axum::{
    Router,
    routing::{get, post},
};
use engine::{Engine, EngineError};

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use crate::{ServerError, currencies, user, wallets};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Upper bound for a single engine call.
    pub request_timeout: Duration,
}

impl ServerState {
    pub fn new(engine: Engine, request_timeout: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            request_timeout,
        }
    }

    /// Run an engine call under the request deadline.
    ///
    /// On expiry the call's future is dropped, which rolls back any open
    /// storage transaction.
    pub(crate) async fn deadline<T>(
        &self,
        call: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, ServerError> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result.map_err(ServerError::from),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "request deadline elapsed"
                );
                Err(ServerError::Timeout)
            }
        }
    }
}

pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route("/wallets/top-up", post(wallets::top_up))
        .route("/wallets/spend", post(wallets::spend))
        .route("/wallets/bonus", post(wallets::bonus))
        .route("/wallets/balance", get(wallets::balance))
        .route("/wallets/{id}/transactions", get(wallets::history))
        .route("/users/{id}", get(user::get))
        .route("/currencies", get(currencies::list));

    Router::new().nest("/api/v1", api).with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr, request_timeout: Duration) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener, request_timeout).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
    request_timeout: Duration,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(ServerState::new(engine, request_timeout))).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
    request_timeout: Duration,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener, request_timeout).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
