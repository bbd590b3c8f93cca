//! Tool dispatch: maps MCP tool calls onto Odoo RPC invocations
//!
//! One typed request struct per tool, parsed at the boundary. A single
//! catch-all converts every failure (unknown tool, malformed arguments,
//! authentication, remote fault, network) into a `{"error": ...}` text
//! result; nothing propagates past `call_tool` as an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::client::OdooRpc;
use crate::error::Result;
use crate::mcp::protocol::{
    methods, InitializeResult, McpHandler, McpRequest, McpResponse, ToolCallResult,
};
use crate::mcp::tools::get_tool_definitions;

const PARTNER_FIELDS: &[&str] = &["id", "name", "email", "phone", "is_company"];
const SALE_ORDER_FIELDS: &[&str] = &["id", "name", "partner_id", "state", "amount_total", "date_order"];
const INVOICE_FIELDS: &[&str] = &["id", "name", "partner_id", "state", "amount_total", "invoice_date"];
const CRM_LEAD_FIELDS: &[&str] = &[
    "id",
    "name",
    "partner_id",
    "stage_id",
    "user_id",
    "expected_revenue",
    "probability",
];

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct SearchPartnersParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct GetPartnerParams {
    pub partner_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchRecordsParams {
    pub model: String,
    #[serde(default)]
    pub domain: Vec<Value>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct GetRecordParams {
    pub model: String,
    pub record_id: i64,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSaleOrdersParams {
    #[serde(default)]
    pub state: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListInvoicesParams {
    #[serde(default)]
    pub state: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListCrmLeadsParams {
    #[serde(default)]
    pub stage: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordParams {
    pub model: String,
    pub values: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecordParams {
    pub model: String,
    pub record_id: i64,
    pub values: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct GetFieldsParams {
    pub model: String,
}

/// The closed set of tools this server exposes. Adding a tool means
/// adding a variant; the dispatch match will not compile without a
/// handler for it.
#[derive(Debug)]
pub enum ToolCall {
    SearchPartners(SearchPartnersParams),
    GetPartner(GetPartnerParams),
    SearchRecords(SearchRecordsParams),
    GetRecord(GetRecordParams),
    ListSaleOrders(ListSaleOrdersParams),
    ListInvoices(ListInvoicesParams),
    ListCrmLeads(ListCrmLeadsParams),
    CreateRecord(CreateRecordParams),
    UpdateRecord(UpdateRecordParams),
    GetFields(GetFieldsParams),
}

impl ToolCall {
    /// Parse a named tool call into its typed form. `Ok(None)` means the
    /// name is not in the catalog.
    pub fn parse(name: &str, arguments: Value) -> Result<Option<Self>> {
        let call = match name {
            "odoo_search_partners" => Self::SearchPartners(serde_json::from_value(arguments)?),
            "odoo_get_partner" => Self::GetPartner(serde_json::from_value(arguments)?),
            "odoo_search_records" => Self::SearchRecords(serde_json::from_value(arguments)?),
            "odoo_get_record" => Self::GetRecord(serde_json::from_value(arguments)?),
            "odoo_list_sale_orders" => Self::ListSaleOrders(serde_json::from_value(arguments)?),
            "odoo_list_invoices" => Self::ListInvoices(serde_json::from_value(arguments)?),
            "odoo_list_crm_leads" => Self::ListCrmLeads(serde_json::from_value(arguments)?),
            "odoo_create_record" => Self::CreateRecord(serde_json::from_value(arguments)?),
            "odoo_update_record" => Self::UpdateRecord(serde_json::from_value(arguments)?),
            "odoo_get_fields" => Self::GetFields(serde_json::from_value(arguments)?),
            _ => return Ok(None),
        };
        Ok(Some(call))
    }
}

/// Free-text partner query expands to an OR over name and email.
pub fn partner_domain(query: &str) -> Vec<Value> {
    if query.is_empty() {
        return Vec::new();
    }
    vec![
        json!("|"),
        json!(["name", "ilike", query]),
        json!(["email", "ilike", query]),
    ]
}

/// Optional equality filter on `state`.
pub fn state_domain(state: &str) -> Vec<Value> {
    if state.is_empty() {
        return Vec::new();
    }
    vec![json!(["state", "=", state])]
}

/// Customer invoices only, optionally narrowed by state (AND semantics).
pub fn invoice_domain(state: &str) -> Vec<Value> {
    let mut domain = vec![json!(["move_type", "=", "out_invoice"])];
    if !state.is_empty() {
        domain.push(json!(["state", "=", state]));
    }
    domain
}

/// Optional partial match on the lead's stage name.
pub fn lead_domain(stage: &str) -> Vec<Value> {
    if stage.is_empty() {
        return Vec::new();
    }
    vec![json!(["stage_id.name", "ilike", stage])]
}

fn search_read_kwargs(fields: &[&str], limit: i64) -> Map<String, Value> {
    let mut kwargs = Map::new();
    kwargs.insert("fields".to_string(), json!(fields));
    kwargs.insert("limit".to_string(), json!(limit));
    kwargs
}

fn error_result(message: String) -> ToolCallResult {
    ToolCallResult::error(json!({"error": message}).to_string())
}

/// MCP request handler bridging tool calls to the Odoo backend.
pub struct OdooHandler {
    rpc: Arc<dyn OdooRpc>,
}

impl OdooHandler {
    pub fn new(rpc: Arc<dyn OdooRpc>) -> Self {
        Self { rpc }
    }

    /// Single failure boundary: every outcome becomes a text result.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResult {
        let call = match ToolCall::parse(name, arguments) {
            Ok(Some(call)) => call,
            Ok(None) => return error_result(format!("Unknown tool: {}", name)),
            Err(e) => return error_result(e.to_string()),
        };

        tracing::debug!(tool = name, "dispatching tool call");

        match self.dispatch(call).await {
            Ok(value) => ToolCallResult::json(&value),
            Err(e) => error_result(e.to_string()),
        }
    }

    async fn dispatch(&self, call: ToolCall) -> Result<Value> {
        match call {
            ToolCall::SearchPartners(p) => {
                self.search_read("res.partner", partner_domain(&p.query), PARTNER_FIELDS, p.limit)
                    .await
            }
            ToolCall::GetPartner(p) => self.read_first("res.partner", p.partner_id, &[]).await,
            ToolCall::SearchRecords(p) => self.search_records(p).await,
            ToolCall::GetRecord(p) => self.read_first(&p.model, p.record_id, &p.fields).await,
            ToolCall::ListSaleOrders(p) => {
                self.search_read("sale.order", state_domain(&p.state), SALE_ORDER_FIELDS, p.limit)
                    .await
            }
            ToolCall::ListInvoices(p) => {
                self.search_read("account.move", invoice_domain(&p.state), INVOICE_FIELDS, p.limit)
                    .await
            }
            ToolCall::ListCrmLeads(p) => {
                self.search_read("crm.lead", lead_domain(&p.stage), CRM_LEAD_FIELDS, p.limit)
                    .await
            }
            ToolCall::CreateRecord(p) => self.create_record(p).await,
            ToolCall::UpdateRecord(p) => self.update_record(p).await,
            ToolCall::GetFields(p) => self.get_fields(p).await,
        }
    }

    async fn search_read(
        &self,
        model: &str,
        domain: Vec<Value>,
        fields: &[&str],
        limit: i64,
    ) -> Result<Value> {
        self.rpc
            .execute_kw(
                model,
                "search_read",
                vec![Value::Array(domain)],
                search_read_kwargs(fields, limit),
            )
            .await
    }

    async fn search_records(&self, p: SearchRecordsParams) -> Result<Value> {
        let mut kwargs = Map::new();
        kwargs.insert("fields".to_string(), json!(p.fields));
        kwargs.insert("limit".to_string(), json!(p.limit));
        self.rpc
            .execute_kw(&p.model, "search_read", vec![Value::Array(p.domain)], kwargs)
            .await
    }

    /// Read one record by id; zero rows comes back as an empty object.
    async fn read_first(&self, model: &str, record_id: i64, fields: &[String]) -> Result<Value> {
        let mut kwargs = Map::new();
        kwargs.insert("fields".to_string(), json!(fields));
        let rows = self
            .rpc
            .execute_kw(model, "read", vec![json!([record_id])], kwargs)
            .await?;
        Ok(rows
            .as_array()
            .and_then(|r| r.first())
            .cloned()
            .unwrap_or_else(|| json!({})))
    }

    async fn create_record(&self, p: CreateRecordParams) -> Result<Value> {
        let id = self
            .rpc
            .execute_kw(&p.model, "create", vec![Value::Object(p.values)], Map::new())
            .await?;
        Ok(json!({"created_id": id}))
    }

    async fn update_record(&self, p: UpdateRecordParams) -> Result<Value> {
        let ok = self
            .rpc
            .execute_kw(
                &p.model,
                "write",
                vec![json!([p.record_id]), Value::Object(p.values)],
                Map::new(),
            )
            .await?;
        Ok(json!({"success": ok}))
    }

    /// Summarize `fields_get` metadata down to label/type/required,
    /// sorted by field name.
    async fn get_fields(&self, p: GetFieldsParams) -> Result<Value> {
        let mut kwargs = Map::new();
        kwargs.insert(
            "attributes".to_string(),
            json!(["string", "type", "required"]),
        );
        let raw = self
            .rpc
            .execute_kw(&p.model, "fields_get", vec![json!([])], kwargs)
            .await?;

        let mut summary = BTreeMap::new();
        if let Some(fields) = raw.as_object() {
            for (name, meta) in fields {
                summary.insert(
                    name.clone(),
                    json!({
                        "label": meta.get("string").cloned().unwrap_or(Value::Null),
                        "type": meta.get("type").cloned().unwrap_or(Value::Null),
                        "required": meta.get("required").cloned().unwrap_or(Value::Null),
                    }),
                );
            }
        }
        Ok(json!(summary))
    }
}

#[async_trait]
impl McpHandler for OdooHandler {
    async fn handle_request(&self, request: McpRequest) -> McpResponse {
        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = InitializeResult::default();
                McpResponse::success(request.id, json!(result))
            }
            methods::INITIALIZED => {
                // Notification; the transport suppresses the reply
                McpResponse::success(request.id, json!({}))
            }
            methods::LIST_TOOLS => {
                let tools = get_tool_definitions();
                McpResponse::success(request.id, json!({"tools": tools}))
            }
            methods::CALL_TOOL => {
                let name = request
                    .params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or(json!({}));

                let result = self.call_tool(name, arguments).await;
                McpResponse::success(request.id, json!(result))
            }
            _ => McpResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OdooError;
    use crate::mcp::protocol::ToolContent;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    struct RecordedCall {
        model: String,
        method: String,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    }

    /// Fake backend that records every invocation and replays a script
    /// of canned responses.
    struct FakeRpc {
        calls: Mutex<Vec<RecordedCall>>,
        script: Mutex<VecDeque<Result<Value>>>,
    }

    impl FakeRpc {
        fn with_script(script: Vec<Result<Value>>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                script: Mutex::new(script.into()),
            })
        }

        fn replying(value: Value) -> Arc<Self> {
            Self::with_script(vec![Ok(value)])
        }

        fn silent() -> Arc<Self> {
            Self::with_script(Vec::new())
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn call(&self, index: usize) -> RecordedCall {
            self.calls.lock()[index].clone()
        }
    }

    #[async_trait]
    impl OdooRpc for FakeRpc {
        async fn execute_kw(
            &self,
            model: &str,
            method: &str,
            args: Vec<Value>,
            kwargs: Map<String, Value>,
        ) -> Result<Value> {
            self.calls.lock().push(RecordedCall {
                model: model.to_string(),
                method: method.to_string(),
                args,
                kwargs,
            });
            self.script.lock().pop_front().unwrap_or(Ok(json!([])))
        }
    }

    fn text_of(result: &ToolCallResult) -> &str {
        match result.content.first() {
            Some(ToolContent::Text { text }) => text,
            None => panic!("empty tool result"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_without_rpc() {
        let rpc = FakeRpc::silent();
        let handler = OdooHandler::new(rpc.clone());

        let result = handler.call_tool("odoo_drop_database", json!({})).await;

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Unknown tool: odoo_drop_database"));
        assert_eq!(rpc.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_arguments_do_not_reach_backend() {
        let rpc = FakeRpc::silent();
        let handler = OdooHandler::new(rpc.clone());

        let result = handler
            .call_tool("odoo_get_partner", json!({"partner_id": "not-a-number"}))
            .await;

        assert_eq!(result.is_error, Some(true));
        assert_eq!(rpc.call_count(), 0);
    }

    #[tokio::test]
    async fn test_search_partners_empty_query_builds_empty_domain() {
        let rpc = FakeRpc::silent();
        let handler = OdooHandler::new(rpc.clone());

        handler.call_tool("odoo_search_partners", json!({})).await;

        let call = rpc.call(0);
        assert_eq!(call.model, "res.partner");
        assert_eq!(call.method, "search_read");
        assert_eq!(call.args[0], json!([]));
        assert_eq!(
            call.kwargs.get("fields"),
            Some(&json!(["id", "name", "email", "phone", "is_company"]))
        );
        assert_eq!(call.kwargs.get("limit"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn test_search_partners_query_expands_to_or_domain() {
        let rpc = FakeRpc::silent();
        let handler = OdooHandler::new(rpc.clone());

        handler
            .call_tool("odoo_search_partners", json!({"query": "acme", "limit": 3}))
            .await;

        let call = rpc.call(0);
        assert_eq!(
            call.args[0],
            json!(["|", ["name", "ilike", "acme"], ["email", "ilike", "acme"]])
        );
        assert_eq!(call.kwargs.get("limit"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_get_partner_missing_record_returns_empty_object() {
        let rpc = FakeRpc::replying(json!([]));
        let handler = OdooHandler::new(rpc.clone());

        let result = handler
            .call_tool("odoo_get_partner", json!({"partner_id": 999}))
            .await;

        assert_eq!(result.is_error, None);
        assert_eq!(text_of(&result), "{}");

        let call = rpc.call(0);
        assert_eq!(call.method, "read");
        assert_eq!(call.args[0], json!([999]));
    }

    #[tokio::test]
    async fn test_get_record_forwards_model_and_fields() {
        let rpc = FakeRpc::replying(json!([{"id": 7, "login": "bot"}]));
        let handler = OdooHandler::new(rpc.clone());

        let result = handler
            .call_tool(
                "odoo_get_record",
                json!({"model": "res.users", "record_id": 7, "fields": ["login"]}),
            )
            .await;

        assert_eq!(text_of(&result), r#"{"id":7,"login":"bot"}"#);

        let call = rpc.call(0);
        assert_eq!(call.model, "res.users");
        assert_eq!(call.kwargs.get("fields"), Some(&json!(["login"])));
    }

    #[tokio::test]
    async fn test_search_records_forwards_raw_domain() {
        let rpc = FakeRpc::silent();
        let handler = OdooHandler::new(rpc.clone());

        handler
            .call_tool(
                "odoo_search_records",
                json!({"model": "stock.move", "domain": [["state", "=", "done"]], "limit": 2}),
            )
            .await;

        let call = rpc.call(0);
        assert_eq!(call.model, "stock.move");
        assert_eq!(call.args[0], json!([["state", "=", "done"]]));
        assert_eq!(call.kwargs.get("fields"), Some(&json!([])));
        assert_eq!(call.kwargs.get("limit"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_list_sale_orders_filters_by_state() {
        let rpc = FakeRpc::silent();
        let handler = OdooHandler::new(rpc.clone());

        handler
            .call_tool("odoo_list_sale_orders", json!({"state": "sale"}))
            .await;

        let call = rpc.call(0);
        assert_eq!(call.model, "sale.order");
        assert_eq!(call.args[0], json!([["state", "=", "sale"]]));
        assert_eq!(
            call.kwargs.get("fields"),
            Some(&json!(["id", "name", "partner_id", "state", "amount_total", "date_order"]))
        );
    }

    #[tokio::test]
    async fn test_list_invoices_always_filters_to_customer_invoices() {
        let rpc = FakeRpc::silent();
        let handler = OdooHandler::new(rpc.clone());

        handler.call_tool("odoo_list_invoices", json!({})).await;

        let call = rpc.call(0);
        assert_eq!(call.model, "account.move");
        assert_eq!(call.args[0], json!([["move_type", "=", "out_invoice"]]));
    }

    #[tokio::test]
    async fn test_list_invoices_appends_state_clause() {
        let rpc = FakeRpc::silent();
        let handler = OdooHandler::new(rpc.clone());

        handler
            .call_tool("odoo_list_invoices", json!({"state": "posted"}))
            .await;

        let call = rpc.call(0);
        assert_eq!(
            call.args[0],
            json!([["move_type", "=", "out_invoice"], ["state", "=", "posted"]])
        );
    }

    #[tokio::test]
    async fn test_list_crm_leads_matches_stage_name() {
        let rpc = FakeRpc::silent();
        let handler = OdooHandler::new(rpc.clone());

        handler
            .call_tool("odoo_list_crm_leads", json!({"stage": "Won"}))
            .await;

        let call = rpc.call(0);
        assert_eq!(call.model, "crm.lead");
        assert_eq!(call.args[0], json!([["stage_id.name", "ilike", "Won"]]));
    }

    #[tokio::test]
    async fn test_create_record_is_not_idempotent() {
        let rpc = FakeRpc::with_script(vec![Ok(json!(101)), Ok(json!(102))]);
        let handler = OdooHandler::new(rpc.clone());
        let arguments = json!({"model": "res.partner", "values": {"name": "Acme"}});

        let first = handler.call_tool("odoo_create_record", arguments.clone()).await;
        let second = handler.call_tool("odoo_create_record", arguments).await;

        assert_eq!(text_of(&first), r#"{"created_id":101}"#);
        assert_eq!(text_of(&second), r#"{"created_id":102}"#);
        assert_eq!(rpc.call_count(), 2);
        assert_eq!(rpc.call(0).method, "create");
        assert_eq!(rpc.call(0).args[0], json!({"name": "Acme"}));
    }

    #[tokio::test]
    async fn test_update_record_returns_backend_flag() {
        let rpc = FakeRpc::replying(json!(true));
        let handler = OdooHandler::new(rpc.clone());

        let result = handler
            .call_tool(
                "odoo_update_record",
                json!({"model": "res.partner", "record_id": 5, "values": {"phone": "123"}}),
            )
            .await;

        assert_eq!(text_of(&result), r#"{"success":true}"#);

        let call = rpc.call(0);
        assert_eq!(call.method, "write");
        assert_eq!(call.args[0], json!([5]));
        assert_eq!(call.args[1], json!({"phone": "123"}));
    }

    #[tokio::test]
    async fn test_rpc_failure_becomes_error_result() {
        let rpc = FakeRpc::with_script(vec![Err(OdooError::Auth(
            "Odoo authentication failed (check credentials)".to_string(),
        ))]);
        let handler = OdooHandler::new(rpc.clone());

        let result = handler.call_tool("odoo_search_partners", json!({})).await;

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("check credentials"));
        assert_eq!(result.content.len(), 1);
    }

    #[tokio::test]
    async fn test_get_fields_is_sorted_and_trimmed() {
        let rpc = FakeRpc::replying(json!({
            "zip": {"string": "Zip", "type": "char", "required": false, "searchable": true},
            "name": {"string": "Name", "type": "char", "required": true, "store": true, "help": "Contact name"}
        }));
        let handler = OdooHandler::new(rpc.clone());

        let result = handler
            .call_tool("odoo_get_fields", json!({"model": "res.partner"}))
            .await;

        let text = text_of(&result);
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(
            parsed["name"],
            json!({"label": "Name", "type": "char", "required": true})
        );
        assert_eq!(
            parsed["zip"],
            json!({"label": "Zip", "type": "char", "required": false})
        );
        // sorted by field name in the serialized output
        assert!(text.find("name").unwrap() < text.find("zip").unwrap());

        let call = rpc.call(0);
        assert_eq!(call.method, "fields_get");
        assert_eq!(
            call.kwargs.get("attributes"),
            Some(&json!(["string", "type", "required"]))
        );
    }
}
