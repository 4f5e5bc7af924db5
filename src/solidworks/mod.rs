//! SolidWorks backend integration.
//!
//! The backend is split into three layers:
//!
//! - [`bridge`] — the opaque async interface to the SolidWorks automation
//!   layer, plus the in-tree placeholder implementation
//! - [`adapter`] — connection-state tracking and lazy reconnect-on-use
//!   around a bridge
//! - [`tools`] — the tool definitions that expose adapter operations to
//!   MCP clients

pub mod adapter;
pub mod bridge;
pub mod tools;

pub use adapter::{ConnectionState, SolidWorksAdapter};
pub use bridge::{DesktopBridge, SolidWorksBridge};
