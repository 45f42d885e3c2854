use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{Category, Engine, EngineError, EntryKind, NewCategory, User};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "fintrack_admin")]
#[command(about = "Admin utilities for Fintrack (default categories, users, KPIs)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./fintrack.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install the missing default categories.
    SeedCategories,
    User(UserArgs),
    Category(CategoryArgs),
    /// Platform-wide totals.
    Kpis,
}

#[derive(Args, Debug)]
struct UserArgs {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    List {
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 50)]
        limit: u64,
    },
    /// Grant the admin flag (use `--revoke` to remove it).
    Promote {
        id: Uuid,
        #[arg(long)]
        revoke: bool,
    },
    /// Delete a user with all of its categories and entries.
    Delete { id: Uuid },
}

#[derive(Args, Debug)]
struct CategoryArgs {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    ListDefaults {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    AddDefault {
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    RemoveDefault { id: Uuid },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for EntryKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Income => EntryKind::Income,
            KindArg::Expense => EntryKind::Expense,
        }
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_user(user: &User) {
    println!(
        "{}  {:<30} {:<20} {}{}",
        user.id,
        user.email.as_deref().unwrap_or("-"),
        user.display_name.as_deref().unwrap_or("-"),
        user.currency,
        if user.is_admin { "  [admin]" } else { "" }
    );
}

fn print_category(category: &Category) {
    println!(
        "{}  {:<8} {} {}",
        category.id,
        category.kind,
        category.icon.as_deref().unwrap_or(" "),
        category.name
    );
}

async fn execute(engine: &Engine, command: Command) -> Result<(), EngineError> {
    match command {
        Command::SeedCategories => {
            let inserted = engine.seed_default_categories().await?;
            println!("inserted {inserted} default categories");
        }
        Command::User(UserArgs {
            command: UserCommand::List { offset, limit },
        }) => {
            for user in engine.list_users(offset, limit).await? {
                print_user(&user);
            }
        }
        Command::User(UserArgs {
            command: UserCommand::Promote { id, revoke },
        }) => {
            let user = engine.set_admin(id, !revoke).await?;
            print_user(&user);
        }
        Command::User(UserArgs {
            command: UserCommand::Delete { id },
        }) => {
            if !engine.delete_user(id).await? {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            }
            println!("deleted user: {id}");
        }
        Command::Category(CategoryArgs {
            command: CategoryCommand::ListDefaults { kind },
        }) => {
            for category in engine.list_default_categories(kind.map(Into::into)).await? {
                print_category(&category);
            }
        }
        Command::Category(CategoryArgs {
            command:
                CategoryCommand::AddDefault {
                    name,
                    kind,
                    icon,
                    color,
                },
        }) => {
            let category = engine
                .create_default_category(NewCategory {
                    name,
                    kind: kind.into(),
                    color,
                    icon,
                })
                .await?;
            print_category(&category);
        }
        Command::Category(CategoryArgs {
            command: CategoryCommand::RemoveDefault { id },
        }) => {
            if !engine.delete_default_category(id).await? {
                return Err(EngineError::KeyNotFound("category not exists".to_string()));
            }
            println!("deleted default category: {id}");
        }
        Command::Kpis => {
            let kpis = engine.global_kpis().await?;
            println!("users:   {}", kpis.total_users);
            println!("income:  {}", kpis.total_income);
            println!("expense: {}", kpis.total_expense);
            println!("net:     {}", kpis.net_balance);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    if let Err(err) = execute(&engine, cli.command).await {
        eprintln!("{err}");
        std::process::exit(if err.is_validation() { 2 } else { 1 });
    }

    Ok(())
}
