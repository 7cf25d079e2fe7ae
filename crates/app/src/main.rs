use std::{net::SocketAddr, time::Duration};

use migration::{Migrator, MigratorTrait};
use sea_orm::ConnectOptions;
use settings::Database;
use tracing_subscriber::EnvFilter;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "dino_wallet={level},server={level},engine={level}",
            level = settings.app.level
        )))
        .init();

    let server = settings.server;
    let database = server
        .database
        .unwrap_or_else(|| Database::Sqlite("wallet.db".to_string()));
    let db = connect(&database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(
        engine,
        listener,
        Duration::from_millis(server.request_timeout_ms),
    )
    .await?;

    Ok(())
}

/// Open the configured database and bring its schema up to date.
async fn connect(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = match config {
        Database::Memory => {
            // Every in-memory connection is a separate database.
            let mut options = ConnectOptions::new("sqlite::memory:");
            options.max_connections(1);
            options
        }
        Database::Sqlite(path) => ConnectOptions::new(format!("sqlite:{path}?mode=rwc")),
        Database::Postgres(url) => ConnectOptions::new(url.as_str()),
    };
    options.sqlx_logging(false);

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
