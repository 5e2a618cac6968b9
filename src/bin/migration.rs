use clap::{Parser, Subcommand};
use medstock_api::{
    db::{establish_connection_with_config, DbConfig},
    migrator::Migrator,
};
use sea_orm_migration::prelude::*;
use tracing::info;

#[derive(Parser)]
#[command(name = "migration", about = "Apply or roll back the medstock schema", version)]
struct Cli {
    /// Falls back to DATABASE_URL, then a local SQLite file
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and re-apply all migrations
    Fresh,
    /// List migrations and whether they are applied
    Status,
}

#[tokio::main]
async fn main() -> Result<(), DbErr> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://medstock.db?mode=rwc".to_string());
    info!("Connecting to database: {}", url);

    let db = establish_connection_with_config(&DbConfig {
        url,
        max_connections: 1,
        ..Default::default()
    })
    .await?;

    match cli.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => Migrator::up(&db, steps).await?,
        Command::Down { steps } => Migrator::down(&db, Some(steps)).await?,
        Command::Fresh => Migrator::fresh(&db).await?,
        Command::Status => Migrator::status(&db).await?,
    }

    info!("Migration command completed");
    Ok(())
}
