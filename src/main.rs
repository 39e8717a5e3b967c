use clap::Parser;
use tracing_subscriber::EnvFilter;

use recipebox::config::{Cli, Config};
use recipebox::state::ClientState;
use recipebox::{commands, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::debug!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;

    let state = ClientState::new(pool, config)?;
    commands::dispatch(&state, cli.command).await
}
