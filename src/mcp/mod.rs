//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC over stdio for AI tool integration, plus the protocol types
//! shared with the HTTP/SSE transport.

pub mod protocol;
pub mod tools;

pub use protocol::{
    methods, InitializeResult, McpHandler, McpRequest, McpResponse, McpServer, ToolCallResult,
};
pub use tools::{get_tool_definitions, TOOL_DEFINITIONS};
