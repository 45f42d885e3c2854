use std::sync::Arc;

use engine::Identity;
use migration::{Migrator, MigratorTrait};
use server::StaticTokenProvider;
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fintrack={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    let db = parse_database(&server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    if server.seed_categories {
        let inserted = engine.seed_default_categories().await?;
        tracing::info!("default categories ready ({inserted} new)");
    }

    if settings.auth.tokens.is_empty() {
        tracing::warn!("no auth tokens configured, every request will be rejected");
    }
    let identity = StaticTokenProvider::new(settings.auth.tokens.into_iter().map(|token| {
        (
            token.token,
            Identity {
                subject: token.subject,
                email: token.email,
                display_name: token.name,
                avatar_url: None,
            },
        )
    }));

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, Arc::new(identity), listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let mut options = sea_orm::ConnectOptions::new(url);
    if matches!(config, Database::Memory) {
        // Every pooled connection would otherwise get its own empty database.
        options.max_connections(1);
    }
    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
