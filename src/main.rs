//! Remote Phonebook MCP Server - Main entry point
//!
//! Serves the Yealink remote phonebook over the Model Context Protocol on
//! stdin/stdout. Logs go to stderr.

use anyhow::Result;
use remote_phonebook::repositories::{
    AsyncFilePhonebookRepository, FilePhonebookRepository, PhonebookRepository,
};
use remote_phonebook::{Config, LocalDirectory, PhonebookMcpServer, StorageLocation};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Configuration first so LOG_LEVEL can seed the filter
    let config = Config::from_env();
    let fallback_level = config
        .as_ref()
        .map(|cfg| cfg.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize logging (stderr only to avoid polluting stdout/MCP communication)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&fallback_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match config {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let location = Arc::new(LocalDirectory::from_config(&config)?) as Arc<dyn StorageLocation>;
    info!(
        "Phonebook file: {}",
        location
            .current_directory()?
            .join(&config.phonebook_filename)
            .display()
    );

    let repository = FilePhonebookRepository::from_config(&config, location);
    let repository =
        Arc::new(AsyncFilePhonebookRepository::new(repository)) as Arc<dyn PhonebookRepository>;

    let server = PhonebookMcpServer::new(repository);

    info!("Starting MCP server with stdio transport");
    remote_phonebook::server::run_server(server).await?;

    info!("Remote Phonebook MCP Server shutdown complete");
    Ok(())
}
