//! shardcache - A Sharded In-Memory Cache
//!
//! This is the main entry point for the shardcache server.
//! It sets up the TCP listener, storage engine, and transaction log, and
//! handles incoming connections.

use anyhow::Context;
use shardcache::commands::CommandHandler;
use shardcache::config::{help_text, CliAction, Config};
use shardcache::connection::{handle_connection, ConnectionStats};
use shardcache::storage::StorageEngine;
use shardcache::txlog::TxLogger;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &Config) {
    println!(
        r#"
shardcache v{} - Sharded In-Memory Cache
──────────────────────────────────────────────────────────────
Server started on {}
Shards: {}    Auth: {}    Transaction log: {}

Use Ctrl+C to shutdown gracefully.
"#,
        shardcache::VERSION,
        config.bind_address(),
        config.shards,
        if config.auth.is_some() { "on" } else { "off" },
        config
            .tx_log
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "off".to_string()),
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(config)) => config,
        Ok(CliAction::Help) => {
            println!("{}", help_text());
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("shardcache version {}", shardcache::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", help_text());
            std::process::exit(1);
        }
    };

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Print the banner
    print_banner(&config);

    // Create the storage engine (shared across all connections)
    let storage = Arc::new(StorageEngine::new(config.shards));
    info!(shards = storage.num_shards(), "Storage engine initialized");

    // Open the transaction log, if enabled
    let (handler, tx_writer) = match &config.tx_log {
        Some(dir) => {
            let (logger, writer) = TxLogger::open(dir)
                .await
                .with_context(|| format!("failed to open transaction log in {}", dir.display()))?;
            (
                CommandHandler::with_tx_log(Arc::clone(&storage), logger),
                Some(writer),
            )
        }
        None => (CommandHandler::new(Arc::clone(&storage)), None),
    };

    // Create connection statistics
    let stats = Arc::new(ConnectionStats::new());

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, handler, config.auth.clone(), Arc::clone(&stats)) => {}
        _ = shutdown => {}
    }

    if let Some(writer) = tx_writer {
        writer.shutdown().await;
    }

    stats.log_summary();
    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    handler: CommandHandler,
    password: Option<String>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = handler.clone();
                let password = password.clone();
                let stats = Arc::clone(&stats);

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, password, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
