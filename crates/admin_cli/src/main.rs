use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{
    DEFAULT_CURRENCY_NAMES, DEFAULT_TREASURY_BALANCE, Engine, EngineError, FundingCmd, OwnerRole,
};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

/// Demo users created by `seed`, with fixed ids so clients can rely on them.
const DEMO_USERS: [(&str, Uuid); 2] = [
    ("Alice", Uuid::from_u128(0xd3f57c3b_3a35_4b6a_9c22_3f8f9e3c1111)),
    ("Bob", Uuid::from_u128(0xd3f57c3b_3a35_4b6a_9c22_3f8f9e3c2222)),
];

/// Balance each demo user gets in every currency.
const DEMO_BALANCE: i64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "dino_wallet_admin")]
#[command(about = "Admin utilities for the wallet service (seed data, users, currencies)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./wallet.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the default currencies, their treasuries and the demo users.
    Seed,
    User(User),
    Currency(Currency),
    Wallet(Wallet),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    name: String,
    /// Fixed id; a random one is generated when omitted.
    #[arg(long)]
    id: Option<Uuid>,
}

#[derive(Args, Debug)]
struct Currency {
    #[command(subcommand)]
    command: CurrencyCommand,
}

#[derive(Subcommand, Debug)]
enum CurrencyCommand {
    /// Register a currency and open its treasury.
    Create(CurrencyCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct CurrencyCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value_t = DEFAULT_TREASURY_BALANCE)]
    opening_balance: i64,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Show(WalletShowArgs),
}

#[derive(Args, Debug)]
struct WalletShowArgs {
    #[arg(long)]
    owner: Uuid,
    /// Currency name, e.g. `gold`.
    #[arg(long)]
    currency: String,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let mut options = ConnectOptions::new(database_url);
    if database_url.contains(":memory:") {
        // Every in-memory connection is a separate database.
        options.max_connections(1);
    }
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Idempotent: running it twice leaves the database unchanged.
async fn seed(engine: &Engine) -> Result<(), Box<dyn Error + Send + Sync>> {
    let system = engine.ensure_system_user().await?;
    println!("system user: {}", system.id);

    let mut currencies = Vec::with_capacity(DEFAULT_CURRENCY_NAMES.len());
    for name in DEFAULT_CURRENCY_NAMES {
        let currency = engine.ensure_currency_type(name).await?;
        let treasury = engine
            .ensure_treasury(currency.id, DEFAULT_TREASURY_BALANCE)
            .await?;
        println!(
            "currency {}: {} (treasury {}, balance {})",
            currency.name, currency.id, treasury.id, treasury.balance
        );
        currencies.push(currency);
    }

    for (name, id) in DEMO_USERS {
        match engine.user(id).await {
            Ok(_) => {}
            Err(EngineError::KeyNotFound(_)) => {
                match engine.new_user_with_id(id, name, OwnerRole::User).await {
                    Ok(_) | Err(EngineError::Conflict(_)) => {}
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        }

        for currency in &currencies {
            // Fixed key: a second seed replays instead of paying out again.
            let key = format!("seed:{id}:{}", currency.name);
            let funded = engine
                .top_up(FundingCmd::new(id, currency.id, key, DEMO_BALANCE))
                .await?;
            println!(
                "user {name} ({id}): {} {}",
                funded.wallet.balance, currency.name
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Seed => {
            seed(&engine).await?;
            println!("seeding complete");
        }
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let user = match args.id {
                Some(id) => engine.new_user_with_id(id, &args.name, OwnerRole::User).await,
                None => engine.new_user(&args.name, OwnerRole::User).await,
            };
            match user {
                Ok(user) => println!("created user: {} ({}, {})", user.name, user.id, user.role),
                Err(EngineError::Conflict(_)) => {
                    eprintln!("user already exists: {}", args.name);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Currency(Currency {
            command: CurrencyCommand::Create(args),
        }) => {
            let currency = engine.ensure_currency_type(&args.name).await?;
            let treasury = engine
                .ensure_treasury(currency.id, args.opening_balance)
                .await?;
            println!(
                "currency {}: {} (treasury {}, balance {})",
                currency.name, currency.id, treasury.id, treasury.balance
            );
        }
        Command::Currency(Currency {
            command: CurrencyCommand::List,
        }) => {
            for currency in engine.currency_types().await? {
                println!("{}\t{}", currency.id, currency.name);
            }
        }
        Command::Wallet(Wallet {
            command: WalletCommand::Show(args),
        }) => {
            let currency = engine.currency_type_by_name(&args.currency).await?;
            let role = engine.owner_role(args.owner).await?;
            match engine.wallet_by_owner(role, args.owner, currency.id).await {
                Ok(wallet) => println!(
                    "wallet {}: {} {} (version {})",
                    wallet.id, wallet.balance, currency.name, wallet.version
                ),
                Err(EngineError::KeyNotFound(_)) => {
                    eprintln!("no {} wallet for {}", currency.name, args.owner);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seed_on_an_in_memory_database_is_visible_and_repeatable() {
        let db = connect_db("sqlite::memory:").await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();

        seed(&engine).await.unwrap();
        seed(&engine).await.unwrap();

        assert_eq!(
            engine.currency_types().await.unwrap().len(),
            DEFAULT_CURRENCY_NAMES.len()
        );
        let gold = engine.currency_type_by_name("gold").await.unwrap();
        let (_, alice) = DEMO_USERS[0];
        let wallet = engine
            .wallet_by_owner(OwnerRole::User, alice, gold.id)
            .await
            .unwrap();
        assert_eq!(wallet.balance, DEMO_BALANCE);
        assert_eq!(
            engine.system_wallet(gold.id).await.unwrap().balance,
            DEFAULT_TREASURY_BALANCE - 2 * DEMO_BALANCE
        );
    }
}
