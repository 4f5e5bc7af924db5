//! Static catalog of the tools exposed to the client.
//!
//! Tool definitions are registered once at startup and the registry is
//! read-only afterwards: handlers can never add or remove entries, and
//! there is no dynamic tool discovery. Registration order is preserved so
//! `tools/list` output is stable.
//!
//! A handler is a pure mapping from validated arguments to rendered
//! response text or a [`ToolError`]; the dispatcher owns all suspension
//! and error shaping.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::error::ToolError;

/// Validated tool arguments, keyed by parameter name.
pub type Arguments = Map<String, Value>;

/// The future returned by a tool handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send>>;

/// An invokable tool handler.
pub type ToolHandler = Arc<dyn Fn(Arguments) -> HandlerFuture + Send + Sync>;

/// Primitive parameter kinds accepted by tool schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A JSON string.
    String,
    /// A JSON number (integer or float).
    Number,
    /// A JSON boolean.
    Boolean,
}

impl ParamKind {
    /// The JSON Schema type name for this kind.
    #[must_use]
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Whether a JSON value structurally matches this kind.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// One named parameter in a tool's input schema.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name as it appears in the arguments object.
    pub name: String,
    /// Declared primitive kind.
    pub kind: ParamKind,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Human-readable description for the client.
    pub description: String,
}

impl ParamSpec {
    /// Creates a required parameter.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }
}

/// A complete tool definition: metadata, schema and handler.
///
/// Immutable once registered.
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Ordered parameter schema.
    pub params: Vec<ParamSpec>,
    /// The handler invoked with validated arguments.
    pub handler: ToolHandler,
}

impl ToolDefinition {
    /// Renders the parameter schema as a JSON Schema object for
    /// `tools/list`.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Renders the client-facing descriptor for `tools/list`.
    #[must_use]
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Errors raised during the startup registration phase.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A tool with the same name is already registered.
    #[error("tool '{name}' is already registered")]
    DuplicateName {
        /// The conflicting tool name.
        name: String,
    },
}

/// The tool catalog.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if a tool with the same
    /// name already exists; the original definition is retained.
    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), RegistryError> {
        if self.tools.contains_key(&tool.name) {
            return Err(RegistryError::DuplicateName { name: tool.name });
        }
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    /// Looks up a tool by name. Absence is a normal outcome.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Returns the client-facing descriptors in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<Value> {
        self.tools.values().map(ToolDefinition::descriptor).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
