use std::sync::Arc;

use anyhow::Result;
use pawcare::application::notify::NotificationSender;
use pawcare::config::config_loader;
use pawcare::infrastructure::{
    axum_http::http_serve,
    notifications::dispatcher::{LogProvider, QueuedDispatcher},
    postgres::postgres_connection,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Server exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let notifier: Arc<dyn NotificationSender> =
        Arc::new(QueuedDispatcher::new(vec![Arc::new(LogProvider)]));

    http_serve::start(Arc::new(dotenvy_env), Arc::new(postgres_pool), notifier).await?;

    Ok(())
}
