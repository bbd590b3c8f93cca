//! Odoo connection check CLI
//!
//! Quick operational smoke test against a configured Odoo backend.

use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use odoo_mcp::client::{OdooClient, OdooRpc};
use odoo_mcp::config::OdooConfig;
use odoo_mcp::error::Result;

#[derive(Parser)]
#[command(name = "odoo-mcp-cli")]
#[command(about = "Odoo connection smoke tests")]
#[command(version)]
struct Cli {
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate and print the resulting user id
    Check,
    /// List a few partners to prove the object endpoint works
    Partners {
        /// Maximum number to return
        #[arg(short, long, default_value = "5")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = OdooConfig {
        url: cli.url,
        db: cli.db,
        username: cli.user,
        password: cli.password,
        verify_tls: cli.verify_tls,
    };
    let client = OdooClient::new(config)?;

    match cli.command {
        Commands::Check => {
            let uid = client.authenticate().await?;
            println!("User ID: {}", uid);
        }
        Commands::Partners { limit } => {
            let mut kwargs = Map::new();
            kwargs.insert("fields".to_string(), json!(["name", "email"]));
            kwargs.insert("limit".to_string(), json!(limit));

            let partners = client
                .execute_kw("res.partner", "search_read", vec![json!([])], kwargs)
                .await?;

            for partner in partners.as_array().into_iter().flatten() {
                let name = partner.get("name").and_then(Value::as_str).unwrap_or("");
                let email = partner.get("email").and_then(Value::as_str).unwrap_or("");
                println!("{} {}", name, email);
            }
        }
    }

    Ok(())
}
