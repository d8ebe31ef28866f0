use legacy_migration::config::ServerConfig;
use legacy_migration::gateway::gateway_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    legacy_migration::init_tracing();

    let config = ServerConfig::load(std::env::current_dir()?)?;
    let app = gateway_app();
    tracing::info!(layers = app.len(), addr = %config.addr, "Starting gateway");

    app.serve(&config.addr).await?;
    Ok(())
}
