use anyhow::Result;
use colored::Colorize;
use gitlab_ci_exporter::{config, init_tracing, server};
use std::path::Path;
use tracing::info;

/// Execute the start command
///
/// This will:
/// 1. Load configuration (applying the port override)
/// 2. Initialize logging from the server section
/// 3. Start the server
pub async fn execute(config_path: &Path, port: Option<u16>) -> Result<()> {
    println!("{}", "Starting GitLab CI exporter...".green());

    let mut cfg = config::load_config(config_path)?;
    if let Some(port) = port {
        cfg.server.port = port;
        config::validate_config(&cfg)?;
    }

    init_tracing(&cfg.server);
    info!(config = %config_path.display(), "Configuration loaded");

    // Start the server (blocks until shutdown)
    server::start_server(cfg).await?;

    Ok(())
}
