//! HTTP deployment mode.
//!
//! Each `POST /mcp` body carries one fully-buffered JSON-RPC request; the
//! response body carries the matching response. There is no streaming and
//! no session lifecycle: every call is self-contained, so `initialize`
//! simply returns the negotiation result without state tracking.
//!
//! Unlike the stdio transport, the host runtime may serve connections
//! concurrently here; the adapter's connection-state mutex turns
//! concurrent connect attempts into one awaited outcome.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::protocol::{parse_message, IncomingMessage, JsonRpcError, JsonRpcResponse, SERVER_NAME};
use crate::mcp::server::{initialize_result, tools_list_result, ToolCallParams};

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
}

/// Builds the HTTP router: the JSON-RPC endpoint plus a health check.
#[must_use]
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/mcp", post(handle_rpc))
        .route("/health", get(health))
        .with_state(AppState { dispatcher })
}

/// Binds the listener and serves until the task is dropped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(dispatcher: Arc<Dispatcher>, addr: SocketAddr) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP transport listening");

    axum::serve(listener, router(dispatcher)).await
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "service": SERVER_NAME}))
}

async fn handle_rpc(State(state): State<AppState>, body: String) -> Json<Value> {
    Json(handle_message(&state.dispatcher, &body).await)
}

/// Handles one JSON-RPC message and returns the response value.
///
/// Notifications produce an empty object, since an HTTP exchange must
/// carry some response body.
pub async fn handle_message(dispatcher: &Dispatcher, body: &str) -> Value {
    let request = match parse_message(body) {
        Ok(IncomingMessage::Request(req)) => req,
        Ok(IncomingMessage::Notification(notif)) => {
            tracing::debug!(method = %notif.method, "Ignoring notification over HTTP");
            return json!({});
        }
        Err(error) => return error_value(&error),
    };

    let id = request.id.clone();
    let response = match request.method.as_str() {
        "initialize" => Ok(JsonRpcResponse::success(id, initialize_result())),
        "tools/list" => Ok(JsonRpcResponse::success(
            id,
            tools_list_result(dispatcher.registry()),
        )),
        "tools/call" => {
            let params: Result<Option<ToolCallParams>, _> = request
                .params
                .as_ref()
                .map(|p| serde_json::from_value(p.clone()))
                .transpose();
            match params {
                Ok(Some(params)) => {
                    let result = dispatcher.dispatch(&params.name, &params.arguments).await;
                    serde_json::to_value(&result).map_or_else(
                        |_| {
                            Err(JsonRpcError::internal_error(
                                request.id.clone(),
                                "Internal error: failed to serialise result",
                            ))
                        },
                        |value| Ok(JsonRpcResponse::success(request.id.clone(), value)),
                    )
                }
                Ok(None) => Err(JsonRpcError::invalid_params(
                    request.id.clone(),
                    "Missing tool call params",
                )),
                Err(e) => Err(JsonRpcError::invalid_params(
                    request.id.clone(),
                    format!("Invalid tool call params: {e}"),
                )),
            }
        }
        "ping" => Ok(JsonRpcResponse::success(id, json!({}))),
        other => Err(JsonRpcError::method_not_found(id, other)),
    };

    match response {
        Ok(resp) => response_value(&resp),
        Err(error) => error_value(&error),
    }
}

fn response_value(response: &JsonRpcResponse) -> Value {
    serde_json::to_value(response).unwrap_or_else(|_| json!({}))
}

fn error_value(error: &JsonRpcError) -> Value {
    serde_json::to_value(error).unwrap_or_else(|_| json!({}))
}
