//! Binary crate for the `skybook` server.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - The HTTP weather endpoints (axum)
//! - The MCP tool surface over stdio (rmcp)

use clap::Parser;

mod app;
mod cli;
mod handler;
mod mcp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the MCP stdio transport keeps stdout to itself.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
