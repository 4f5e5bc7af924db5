//! JSON-RPC 2.0 wire types.
//!
//! The presence of an `id` member separates the two inbound shapes: a
//! request gets exactly one response echoing its `id`, a notification gets
//! nothing back. MCP restricts `id` to a string or integer; `null` is not
//! a valid request ID here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The MCP protocol revision this server negotiates.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Name advertised in `serverInfo` and the health endpoint.
pub const SERVER_NAME: &str = "solidworks-mcp";

/// A request identifier, echoed verbatim in the matching response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer form.
    Number(i64),
    /// String form.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// An inbound request: carries an `id` and demands one response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol marker, "2.0".
    pub jsonrpc: String,

    /// Identifier to echo in the response.
    pub id: RequestId,

    /// Method name, e.g. `tools/call`.
    pub method: String,

    /// Method parameters, when the method takes any.
    #[serde(default)]
    pub params: Option<Value>,
}

/// An inbound notification: no `id`, no response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
    /// Protocol marker, "2.0".
    pub jsonrpc: String,

    /// Notification method name.
    pub method: String,

    /// Notification parameters, when present.
    #[serde(default)]
    pub params: Option<Value>,
}

/// An outbound success response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol marker, "2.0".
    pub jsonrpc: &'static str,

    /// Identifier of the request being answered.
    pub id: RequestId,

    /// The method's result payload.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Wraps a result payload as the response to `id`.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result,
        }
    }
}

/// The reserved JSON-RPC 2.0 error codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The payload was not decodable JSON (-32700).
    ParseError,
    /// The payload decoded but is not a valid request (-32600).
    InvalidRequest,
    /// No such method (-32601).
    MethodNotFound,
    /// The params did not deserialise for the method (-32602).
    InvalidParams,
    /// A server-side fault while producing the response (-32603).
    InternalError,
}

impl ErrorCode {
    /// The wire value of this code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// The canonical message for this code, used when no more specific
    /// text applies.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// The `error` member of an error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code.
    pub code: i32,

    /// Short human-readable description.
    pub message: String,
}

impl JsonRpcErrorData {
    /// An error carrying the code's canonical message.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
        }
    }

    /// An error with the given message in place of the canonical one.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
        }
    }
}

/// An outbound error response.
///
/// The `id` is `None` only when the failing request's identifier could
/// not be recovered, e.g. the payload was not valid JSON at all.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Protocol marker, "2.0".
    pub jsonrpc: &'static str,

    /// Identifier of the failing request, when recoverable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,

    /// Code and message.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Assembles an error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error,
        }
    }

    /// A `-32700` response; the payload never decoded, so no id.
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(None, JsonRpcErrorData::from_code(ErrorCode::ParseError))
    }

    /// A `-32600` response, echoing the id where one was recovered.
    #[must_use]
    pub fn invalid_request(id: Option<RequestId>) -> Self {
        Self::new(id, JsonRpcErrorData::from_code(ErrorCode::InvalidRequest))
    }

    /// A `-32601` response naming the unknown method.
    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// A `-32602` response with a message naming what was wrong.
    #[must_use]
    pub fn invalid_params(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorCode::InvalidParams, message),
        )
    }

    /// A `-32603` response for server-side faults.
    #[must_use]
    pub fn internal_error(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }
}

/// A decoded inbound message, split by whether it carries an `id`.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    /// Carries an `id`; one response is owed.
    Request(JsonRpcRequest),
    /// No `id`; nothing is owed.
    Notification(JsonRpcNotification),
}

/// Decodes one frame payload into an [`IncomingMessage`].
///
/// The `id` is pulled out before full deserialisation so that later
/// failures can still echo it in the error response.
///
/// # Errors
///
/// Returns the ready-to-send `JsonRpcError` for undecodable JSON or a
/// payload that is not a JSON-RPC 2.0 message.
pub fn parse_message(json: &str) -> Result<IncomingMessage, JsonRpcError> {
    let value: Value = serde_json::from_str(json).map_err(|_| JsonRpcError::parse_error())?;

    let obj = value.as_object().ok_or_else(JsonRpcError::parse_error)?;

    // Recover the id early so later failures can still echo it.
    let id = obj
        .get("id")
        .and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok());

    let version_ok = obj
        .get("jsonrpc")
        .and_then(Value::as_str)
        .is_some_and(|v| v == "2.0");
    if !version_ok {
        return Err(JsonRpcError::invalid_request(id));
    }

    if obj.contains_key("id") {
        let request: JsonRpcRequest = serde_json::from_value(value)
            .map_err(|_| JsonRpcError::invalid_request(id.clone()))?;

        if request.method.is_empty() {
            return Err(JsonRpcError::invalid_request(Some(request.id)));
        }

        Ok(IncomingMessage::Request(request))
    } else {
        let notification: JsonRpcNotification =
            serde_json::from_value(value).map_err(|_| JsonRpcError::invalid_request(None))?;

        Ok(IncomingMessage::Notification(notification))
    }
}
