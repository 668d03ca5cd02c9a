use consult_server::{Config, Server, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, work dir, logging)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let logs_dir = config.logs_dir();
    consult_server::init_logger_with_file(
        &config.log_level,
        config.is_production(),
        logs_dir.to_str(),
    )?;

    tracing::info!("Consult server starting...");

    // 2. Initialize server state (database, catalog, booking manager)
    let state = ServerState::initialize(&config)?;

    // 3. Run the HTTP server (spawns the hold-expiry sweep)
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
