use sea_orm::Database;
use sea_orm_migration::prelude::*;

const USAGE: &str = "usage: migration [up [N] | down [N] | fresh | status]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let steps = match args.get(1) {
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| USAGE)?),
        None => None,
    };

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./wallet.db?mode=rwc".to_string());
    let db = Database::connect(&db_url).await?;

    match args.first().map(String::as_str).unwrap_or("up") {
        "up" => migration::Migrator::up(&db, steps).await?,
        "down" => migration::Migrator::down(&db, steps.or(Some(1))).await?,
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => migration::Migrator::status(&db).await?,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}
