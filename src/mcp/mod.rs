//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the MCP specification for exposing SolidWorks
//! automation operations as tools to AI assistants. The primary transport
//! is stdio with `Content-Length` framed JSON-RPC 2.0 messages; an
//! alternate HTTP deployment mode serves one request per POST body.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │  ┌───────────┐   ┌────────────┐   ┌──────────┐   ┌────────┐  │
//! │  │ Transport │──▶│ Dispatcher │──▶│ Registry │──▶│ Tools  │  │
//! │  │ (framing) │   │ (validate) │   │ (lookup) │   │(handle)│  │
//! │  └───────────┘   └────────────┘   └──────────┘   └────────┘  │
//! │        │                                             │       │
//! │        ▼                                             ▼       │
//! │  JSON-RPC 2.0 messages                     SolidWorks adapter│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod dispatcher;
pub mod http;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;

pub use dispatcher::{Dispatcher, ToolCallResult, ToolContent};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use registry::{ParamKind, ParamSpec, ToolDefinition, ToolRegistry};
pub use server::McpServer;
pub use transport::{StdioTransport, Transport};
