use clap::{Parser, Subcommand};
use sea_orm::Database;
use sea_orm_migration::prelude::*;

/// Apply or inspect the Fintrack schema migrations.
#[derive(Parser, Debug)]
#[command(name = "migration")]
struct Cli {
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./fintrack.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Option<Step>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Step {
    /// Apply every pending migration.
    #[default]
    Up,
    /// Roll back the most recent migration.
    Down,
    /// Drop all tables and apply every migration again.
    Fresh,
    /// Roll back every migration then apply them again.
    Refresh,
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let db = Database::connect(&cli.database_url).await?;

    match cli.command.unwrap_or_default() {
        Step::Up => migration::Migrator::up(&db, None).await?,
        Step::Down => migration::Migrator::down(&db, Some(1)).await?,
        Step::Fresh => migration::Migrator::fresh(&db).await?,
        Step::Refresh => migration::Migrator::refresh(&db).await?,
        Step::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
