//! solidworks-mcp: MCP server for AI-assisted SolidWorks document automation
//!
//! This library exposes SolidWorks operations as schema-validated MCP tools
//! that AI assistants invoke over JSON-RPC 2.0: opening documents, reading
//! model properties, creating parts and exporting to PDF.
//!
//! # Architecture
//!
//! The server is transport-first: framed bytes in, one decoded request at a
//! time through the dispatcher, one response out. The SolidWorks side is a
//! stateful adapter over an injected automation bridge, with a lazy
//! reconnect-on-use connection policy.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`configure`] — Claude Desktop config generation
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol implementation (transport, registry, dispatch)
//! - [`solidworks`] — Backend adapter, bridge boundary and tool definitions

pub mod config;
pub mod configure;
pub mod error;
pub mod mcp;
pub mod solidworks;
