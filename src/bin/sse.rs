//! Odoo MCP server (HTTP/SSE transport)
//!
//! Run with: odoo-mcp-sse

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use odoo_mcp::client::OdooClient;
use odoo_mcp::config::OdooConfig;
use odoo_mcp::dispatch::OdooHandler;
use odoo_mcp::error::Result;
use odoo_mcp::sse::SseServer;

#[derive(Parser, Debug)]
#[command(name = "odoo-mcp-sse")]
#[command(about = "Odoo MCP server (HTTP/SSE transport)")]
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

    /// Listen port
    #[arg(long, env = "PORT", default_value = "8000")]
    port: u16,
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
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let port = args.port;
    let client = OdooClient::new(args.into_config())?;
    let handler = OdooHandler::new(Arc::new(client));

    tracing::info!("Odoo MCP server starting (SSE) on port {}...", port);
    SseServer::new(handler, port).start().await?;

    Ok(())
}
