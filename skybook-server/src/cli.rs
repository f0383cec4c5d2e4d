use anyhow::Context;
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use skybook_core::Config;
use tracing::info;

use crate::{app, mcp::SkybookService};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skybook", version, about = "Weather & booking server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP weather endpoints.
    Serve {
        /// Address to bind, e.g. "0.0.0.0:3000".
        #[arg(long, default_value = "0.0.0.0:3000")]
        bind: String,
    },

    /// Serve the MCP tool surface over stdin/stdout.
    Mcp,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        // Credentials are resolved once, up front; a missing key is a
        // startup error, not a per-request surprise.
        let config = Config::load().context("Failed to load configuration")?;

        match self.command {
            Command::Serve { bind } => {
                let state = app::AppState::new(&config);
                let router = app::create_router(state);

                let listener = tokio::net::TcpListener::bind(&bind)
                    .await
                    .with_context(|| format!("Failed to bind {bind}"))?;
                info!("skybook HTTP server listening on {bind}");

                axum::serve(listener, router).await?;
            }
            Command::Mcp => {
                info!("skybook MCP server starting on stdio");
                let service = SkybookService::new(&config)
                    .serve(stdio())
                    .await
                    .context("Failed to start MCP server")?;
                let reason = service.waiting().await?;
                info!("skybook MCP server stopped: {reason:?}");
            }
        }

        Ok(())
    }
}
