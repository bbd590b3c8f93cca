//! MCP tool definitions for the Odoo bridge

use serde_json::json;

use super::protocol::ToolDefinition;

/// All tool definitions exposed to MCP clients
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    (
        "odoo_search_partners",
        "Search Odoo contacts/partners. A free-text query matches name and email.",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "default": "", "description": "Partial match against name or email"},
                "limit": {"type": "integer", "default": 10}
            },
            "required": []
        }"#,
    ),
    (
        "odoo_get_partner",
        "Get full details for a single partner by ID.",
        r#"{
            "type": "object",
            "properties": {
                "partner_id": {"type": "integer", "description": "Partner ID"}
            },
            "required": ["partner_id"]
        }"#,
    ),
    (
        "odoo_search_records",
        "Generic Odoo record search against any model with a raw domain filter.",
        r#"{
            "type": "object",
            "properties": {
                "model": {"type": "string", "description": "Odoo model name, e.g. res.partner"},
                "domain": {"type": "array", "default": [], "description": "Odoo domain filter clauses"},
                "fields": {"type": "array", "default": [], "items": {"type": "string"}},
                "limit": {"type": "integer", "default": 10}
            },
            "required": ["model"]
        }"#,
    ),
    (
        "odoo_get_record",
        "Read a single Odoo record by model and ID.",
        r#"{
            "type": "object",
            "properties": {
                "model": {"type": "string"},
                "record_id": {"type": "integer"},
                "fields": {"type": "array", "default": [], "items": {"type": "string"}}
            },
            "required": ["model", "record_id"]
        }"#,
    ),
    (
        "odoo_list_sale_orders",
        "List sale orders, optionally filtered by state.",
        r#"{
            "type": "object",
            "properties": {
                "state": {"type": "string", "default": "", "description": "Order state, e.g. draft, sale, done"},
                "limit": {"type": "integer", "default": 10}
            },
            "required": []
        }"#,
    ),
    (
        "odoo_list_invoices",
        "List customer invoices, optionally filtered by state.",
        r#"{
            "type": "object",
            "properties": {
                "state": {"type": "string", "default": "", "description": "Invoice state, e.g. draft, posted"},
                "limit": {"type": "integer", "default": 10}
            },
            "required": []
        }"#,
    ),
    (
        "odoo_list_crm_leads",
        "List CRM leads/opportunities, optionally filtered by stage name.",
        r#"{
            "type": "object",
            "properties": {
                "stage": {"type": "string", "default": "", "description": "Partial match against the stage name"},
                "limit": {"type": "integer", "default": 10}
            },
            "required": []
        }"#,
    ),
    (
        "odoo_create_record",
        "Create a new record in any Odoo model.",
        r#"{
            "type": "object",
            "properties": {
                "model": {"type": "string"},
                "values": {"type": "object", "description": "Field values for the new record"}
            },
            "required": ["model", "values"]
        }"#,
    ),
    (
        "odoo_update_record",
        "Update fields on an existing Odoo record.",
        r#"{
            "type": "object",
            "properties": {
                "model": {"type": "string"},
                "record_id": {"type": "integer"},
                "values": {"type": "object", "description": "Field values to write"}
            },
            "required": ["model", "record_id", "values"]
        }"#,
    ),
    (
        "odoo_get_fields",
        "Introspect the fields of an Odoo model (label, type, required).",
        r#"{
            "type": "object",
            "properties": {
                "model": {"type": "string"}
            },
            "required": ["model"]
        }"#,
    ),
];

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}
