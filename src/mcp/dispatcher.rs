//! Request dispatch: tool resolution, argument validation and result
//! shaping.
//!
//! The dispatcher is the only place where per-request failures are turned
//! into protocol results. Whatever a handler does, the outcome is always a
//! well-formed [`ToolCallResult`]; nothing below this layer can drop a
//! request or crash the connection.
//!
//! Invocations are serialised by construction: the receive loop awaits
//! each dispatch before reading the next frame, so no two handlers run
//! concurrently on one connection.

use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;
use crate::mcp::registry::{Arguments, ToolDefinition, ToolRegistry};

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Routes validated tool calls to their handlers.
#[derive(Debug)]
pub struct Dispatcher {
    registry: ToolRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher over a fully populated registry.
    #[must_use]
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// The underlying registry (read-only).
    #[must_use]
    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatches one tool call.
    ///
    /// Resolution, validation and handler failures all surface as an
    /// error-shaped result carrying a human-readable message; this method
    /// never fails.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> ToolCallResult {
        let Some(tool) = self.registry.lookup(name) else {
            tracing::warn!(tool = name, "Tool call for unknown tool");
            return ToolCallResult::error(
                ToolError::UnknownTool {
                    name: name.to_string(),
                }
                .to_string(),
            );
        };

        let args = match validate_arguments(tool, arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call rejected by validation");
                return ToolCallResult::error(e.to_string());
            }
        };

        tracing::debug!(tool = name, "Invoking tool handler");
        match (tool.handler)(args).await {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool handler failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }
}

/// Validates raw arguments against a tool's parameter schema.
///
/// Every required parameter must be present with its declared primitive
/// type; optional parameters are type-checked when present. Unknown extra
/// parameters are ignored for forward compatibility.
///
/// # Errors
///
/// Returns a [`ToolError`] naming the offending parameter.
fn validate_arguments(tool: &ToolDefinition, arguments: &Value) -> Result<Arguments, ToolError> {
    let empty = Arguments::new();
    let supplied = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            // A non-object arguments payload can never satisfy a schema;
            // report against the first declared parameter if any.
            let parameter = tool
                .params
                .first()
                .map_or_else(|| "arguments".to_string(), |p| p.name.clone());
            tracing::debug!(tool = %tool.name, got = %other, "Arguments payload is not an object");
            return Err(ToolError::MissingParameter { parameter });
        }
    };

    let mut validated = Arguments::new();
    for param in &tool.params {
        match supplied.get(&param.name) {
            Some(value) => {
                if !param.kind.matches(value) {
                    return Err(ToolError::InvalidParameterType {
                        parameter: param.name.clone(),
                        expected: param.kind.json_type(),
                    });
                }
                validated.insert(param.name.clone(), value.clone());
            }
            None if param.required => {
                return Err(ToolError::MissingParameter {
                    parameter: param.name.clone(),
                });
            }
            None => {}
        }
    }

    Ok(validated)
}
