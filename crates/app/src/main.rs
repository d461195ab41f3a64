use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "recycle={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    let database = server
        .database
        .unwrap_or_else(|| Database::Sqlite("recycle.db".to_string()));
    let db = parse_database(&database).await?;
    tracing::info!("database ready: {database:?}");

    let engine = engine::Engine::builder().database(db).build().await?;

    server::run(
        engine,
        server::ServerConfig {
            bind: server.bind.unwrap_or_else(|| "127.0.0.1".to_string()),
            port: server.port,
            dev_user_header: server.dev_user_header,
        },
    )
    .await;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
