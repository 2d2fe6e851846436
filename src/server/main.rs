use todo_telemetry::adapters::{AppState, HttpServer};
use todo_telemetry::config::AppConfig;
use todo_telemetry::storage::open_repository;
use todo_telemetry::telemetry::{Telemetry, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_logging(&config.log_filter);
    let telemetry = Telemetry::new();
    let repository = open_repository(&config).await?;
    let state = AppState::new(repository, telemetry);
    let server = HttpServer::new(state, &config).await?;
    server.run().await
}
