//! JSON-RPC client for the Odoo external API
//!
//! Odoo exposes two logical services over `POST /jsonrpc`: "common"
//! (authentication) and "object" (generic `execute_kw`). Every tool call
//! authenticates from scratch and then executes, two sequential round
//! trips; there is no session reuse, no caching and no retry.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::OdooConfig;
use crate::error::{OdooError, Result};

/// Generic invoke seam the dispatcher depends on.
#[async_trait]
pub trait OdooRpc: Send + Sync {
    /// Invoke `method` on `model` with positional and keyword arguments.
    async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value>;
}

/// JSON-RPC response envelope from Odoo.
#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcFault>,
}

#[derive(Debug, Deserialize)]
struct RpcFault {
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcFault {
    /// Odoo puts the server-side message under `data.message`; the
    /// top-level message is a generic "Odoo Server Error".
    fn into_message(self) -> String {
        self.data
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or(self.message)
    }
}

/// Unwrap a JSON-RPC envelope into the result or a fault.
fn rpc_result(envelope: RpcEnvelope) -> Result<Value> {
    if let Some(fault) = envelope.error {
        return Err(OdooError::Rpc(fault.into_message()));
    }
    Ok(envelope.result.unwrap_or(Value::Null))
}

/// Client for the Odoo external RPC API.
pub struct OdooClient {
    http: reqwest::Client,
    config: OdooConfig,
    next_id: AtomicU64,
}

impl OdooClient {
    /// Build a client from validated connection parameters.
    pub fn new(config: OdooConfig) -> Result<Self> {
        config.validate()?;

        if !config.verify_tls {
            tracing::warn!(url = %config.url, "TLS certificate verification is disabled");
        }

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Raw JSON-RPC call against `{url}/jsonrpc`.
    async fn call(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "call",
            "params": {
                "service": service,
                "method": method,
                "args": args,
            },
        });

        let url = format!("{}/jsonrpc", self.config.url.trim_end_matches('/'));
        let envelope: RpcEnvelope = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        rpc_result(envelope)
    }

    /// Authenticate against the "common" service. Odoo returns `false`
    /// instead of a uid on bad credentials.
    pub async fn authenticate(&self) -> Result<i64> {
        let result = self
            .call(
                "common",
                "authenticate",
                vec![
                    json!(self.config.db),
                    json!(self.config.username),
                    json!(self.config.password),
                    json!({}),
                ],
            )
            .await?;

        match result.as_i64() {
            Some(uid) if uid > 0 => Ok(uid),
            _ => Err(OdooError::Auth(
                "Odoo authentication failed (check credentials)".to_string(),
            )),
        }
    }
}

#[async_trait]
impl OdooRpc for OdooClient {
    async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value> {
        let uid = self.authenticate().await?;
        self.call(
            "object",
            "execute_kw",
            vec![
                json!(self.config.db),
                json!(uid),
                json!(self.config.password),
                json!(model),
                json!(method),
                Value::Array(args),
                Value::Object(kwargs),
            ],
        )
        .await
    }
}
