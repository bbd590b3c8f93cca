//! odoo-mcp - Odoo over the Model Context Protocol
//!
//! Exposes an Odoo server's records (partners, sale orders, invoices,
//! CRM leads, and arbitrary models) as MCP tools over stdio or HTTP/SSE.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mcp;
pub mod sse;

pub use client::{OdooClient, OdooRpc};
pub use config::OdooConfig;
pub use dispatch::OdooHandler;
pub use error::{OdooError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
