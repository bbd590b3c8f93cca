//! Odoo MCP server (stdio transport)
//!
//! Run with: odoo-mcp-server

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use odoo_mcp::client::OdooClient;
use odoo_mcp::config::OdooConfig;
use odoo_mcp::dispatch::OdooHandler;
use odoo_mcp::error::Result;
use odoo_mcp::mcp::McpServer;

#[derive(Parser, Debug)]
#[command(name = "odoo-mcp-server")]
#[command(about = "Odoo MCP server (stdio transport)")]
struct Args {
    /// Odoo base URL
    #[arg(long, env = "ODOO_URL", default_value = "https://localhost:8069")]
    url: String,

    /// Odoo database name
    #[arg(long, env = "ODOO_DB")]
    db: String,

    /// Odoo login user
    #[arg(long, env = "ODOO_USER")]
    user: String,

    /// Odoo password or API key
    #[arg(long, env = "ODOO_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Verify the backend's TLS certificate
    #[arg(long, env = "ODOO_VERIFY_TLS")]
    verify_tls: bool,
}

impl Args {
    fn into_config(self) -> OdooConfig {
        OdooConfig {
            url: self.url,
            db: self.db,
            username: self.user,
            password: self.password,
            verify_tls: self.verify_tls,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging goes to stderr (stdout carries the MCP protocol)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let client = OdooClient::new(args.into_config())?;
    let handler = OdooHandler::new(Arc::new(client));
    let server = McpServer::new(handler);

    tracing::info!("Odoo MCP server starting (stdio)...");
    server.run().await?;

    Ok(())
}
