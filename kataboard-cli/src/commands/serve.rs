//! HTTP server command
//!
//! Runs the kataboard API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;

use kataboard_server::db::create_pool_with_options;
use kataboard_server::http::{run_server, ServerConfig};

use crate::config::KataboardConfig;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default from config: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long)]
    pub max_connections: Option<u32>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: KataboardConfig) -> Result<()> {
    let (database_url, max_connections) =
        config.database_target(args.database_url, args.max_connections);
    let bind_addr = args.bind.unwrap_or(config.server.bind);

    tracing::info!(%bind_addr, %database_url, "Starting kataboard server");

    let pool = create_pool_with_options(&database_url, max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", database_url))?;

    let server_config = ServerConfig {
        bind_addr,
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
    };

    // Blocks until shutdown
    run_server(pool, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
