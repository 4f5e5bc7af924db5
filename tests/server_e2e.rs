//! End-to-end tests driving the MCP server over an in-memory transport.
//!
//! A client half speaks the `Content-Length` framing over a duplex pipe
//! while the server runs in a spawned task, exactly as it would over
//! stdio. The SolidWorks bridge is mocked with call counters so the
//! connection-state and serialisation contracts can be observed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use solidworks_mcp::error::BridgeError;
use solidworks_mcp::mcp::dispatcher::Dispatcher;
use solidworks_mcp::mcp::{McpServer, Transport};
use solidworks_mcp::solidworks::bridge::SolidWorksBridge;
use solidworks_mcp::solidworks::tools::build_registry;
use solidworks_mcp::solidworks::SolidWorksAdapter;

// =============================================================================
// Mock bridge
// =============================================================================

/// A fake automation bridge with shared call counters.
#[derive(Clone, Default)]
struct MockBridge {
    connects: Arc<AtomicUsize>,
    operations: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl MockBridge {
    async fn enter_op(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        // Give a hypothetical overlapping handler a chance to run
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    fn leave_op(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SolidWorksBridge for MockBridge {
    async fn connect(&self) -> Result<(), BridgeError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn open_document(&self, _file_path: &str) -> Result<bool, BridgeError> {
        self.enter_op().await;
        self.leave_op();
        Ok(true)
    }

    async fn get_model_properties(&self, file_path: &str) -> Result<Value, BridgeError> {
        self.enter_op().await;
        self.leave_op();
        Ok(json!({
            "name": file_path.rsplit('/').next().unwrap_or(file_path),
            "materials": ["Steel 1045"],
        }))
    }

    async fn create_new_part(&self) -> Result<String, BridgeError> {
        self.enter_op().await;
        self.leave_op();
        Ok("C:/Temp/NewPart_1700000000000.SLDPRT".to_string())
    }

    async fn export_to_pdf(
        &self,
        _file_path: &str,
        _output_path: &str,
    ) -> Result<bool, BridgeError> {
        self.enter_op().await;
        self.leave_op();
        Ok(true)
    }
}

// =============================================================================
// Framed client helpers
// =============================================================================

type ClientReader = BufReader<ReadHalf<DuplexStream>>;
type ClientWriter = WriteHalf<DuplexStream>;

/// Spawns the server over a duplex pipe and returns the client halves.
fn spawn_server(bridge: MockBridge) -> (ClientWriter, ClientReader, JoinHandle<std::io::Result<()>>) {
    let adapter = Arc::new(SolidWorksAdapter::new(bridge));
    let dispatcher = Arc::new(Dispatcher::new(build_registry(adapter).unwrap()));

    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let (client_read, client_write) = tokio::io::split(client);

    let mut mcp_server =
        McpServer::with_transport(Transport::new(server_read, server_write), dispatcher);
    let handle = tokio::spawn(async move { mcp_server.run().await });

    (client_write, BufReader::new(client_read), handle)
}

async fn send_frame(writer: &mut ClientWriter, payload: &str) {
    let frame = format!("Content-Length: {}\r\n\r\n{payload}", payload.len());
    writer.write_all(frame.as_bytes()).await.unwrap();
    writer.flush().await.unwrap();
}

async fn read_frame(reader: &mut ClientReader) -> Value {
    let mut content_length = None;
    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await.unwrap();
        assert!(bytes_read > 0, "server closed stream mid-frame");

        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            content_length = Some(value.trim().parse::<usize>().unwrap());
        }
    }

    let mut payload = vec![0u8; content_length.expect("missing Content-Length in response")];
    reader.read_exact(&mut payload).await.unwrap();
    serde_json::from_slice(&payload).unwrap()
}

/// Performs the initialize handshake up to the Running state.
async fn initialize(writer: &mut ClientWriter, reader: &mut ClientReader) {
    send_frame(
        writer,
        r#"{"jsonrpc":"2.0","id":0,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"e2e-client","version":"0.0.0"}}}"#,
    )
    .await;
    let response = read_frame(reader).await;
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "solidworks-mcp");

    send_frame(
        writer,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
    )
    .await;
}

fn tool_call(id: u64, name: &str, arguments: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments},
    })
    .to_string()
}

fn result_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

// =============================================================================
// Tool calls over the wire
// =============================================================================

#[tokio::test]
async fn create_new_part_returns_recognisable_path() {
    let (mut writer, mut reader, _handle) = spawn_server(MockBridge::default());
    initialize(&mut writer, &mut reader).await;

    send_frame(&mut writer, &tool_call(1, "create_new_part", json!({}))).await;
    let response = read_frame(&mut reader).await;

    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["content"][0]["type"], "text");
    let text = result_text(&response);
    assert!(text.contains("Created new part at "));
    assert!(text.contains("NewPart_"));
    assert!(text.ends_with(".SLDPRT"));
}

#[tokio::test]
async fn first_operation_connects_lazily_and_renders_property_bag() {
    let bridge = MockBridge::default();
    let (mut writer, mut reader, _handle) = spawn_server(bridge.clone());
    initialize(&mut writer, &mut reader).await;

    assert_eq!(bridge.connects.load(Ordering::SeqCst), 0);

    send_frame(
        &mut writer,
        &tool_call(2, "get_model_properties", json!({"filePath": "/x/y.part"})),
    )
    .await;
    let response = read_frame(&mut reader).await;

    assert_eq!(bridge.connects.load(Ordering::SeqCst), 1);
    let text = result_text(&response);
    assert!(text.contains("Model Properties for y.part"));
    assert!(text.contains("Steel 1045"));
}

#[tokio::test]
async fn missing_parameter_never_reaches_backend() {
    let bridge = MockBridge::default();
    let (mut writer, mut reader, _handle) = spawn_server(bridge.clone());
    initialize(&mut writer, &mut reader).await;

    send_frame(&mut writer, &tool_call(3, "open_document", json!({}))).await;
    let response = read_frame(&mut reader).await;

    assert_eq!(response["result"]["isError"], true);
    assert!(result_text(&response).contains("filePath"));
    assert_eq!(bridge.operations.load(Ordering::SeqCst), 0);
    assert_eq!(bridge.connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn truncated_frame_closes_connection_cleanly() {
    let (mut writer, reader, handle) = spawn_server(MockBridge::default());

    // Header claims 50 bytes, only 10 follow before the stream closes
    writer
        .write_all(b"Content-Length: 50\r\n\r\n0123456789")
        .await
        .unwrap();
    writer.flush().await.unwrap();
    // EOF reaches the server once both client halves are gone
    drop(writer);
    drop(reader);

    let result = handle.await.unwrap();
    assert!(result.is_ok(), "transport error must not crash the server");
}

#[tokio::test]
async fn oversized_content_length_closes_connection_cleanly() {
    let (mut writer, reader, handle) = spawn_server(MockBridge::default());

    // A hostile header announcing an absurd payload length
    writer
        .write_all(format!("Content-Length: {}\r\n\r\n", usize::MAX).as_bytes())
        .await
        .unwrap();
    writer.flush().await.unwrap();
    drop(writer);
    drop(reader);

    let result = handle.await.unwrap();
    assert!(result.is_ok(), "hostile header must not crash the server");
}

#[tokio::test]
async fn back_to_back_requests_are_serialised_in_arrival_order() {
    let bridge = MockBridge::default();
    let (mut writer, mut reader, _handle) = spawn_server(bridge.clone());
    initialize(&mut writer, &mut reader).await;

    // Both requests are on the wire before either response is read
    send_frame(
        &mut writer,
        &tool_call(10, "open_document", json!({"filePath": "/a.SLDPRT"})),
    )
    .await;
    send_frame(
        &mut writer,
        &tool_call(11, "export_to_pdf", json!({"filePath": "/a.SLDPRT", "outputPath": "/a.pdf"})),
    )
    .await;

    let first = read_frame(&mut reader).await;
    let second = read_frame(&mut reader).await;

    assert_eq!(first["id"], 10);
    assert_eq!(second["id"], 11);
    assert_eq!(bridge.operations.load(Ordering::SeqCst), 2);
    assert_eq!(
        bridge.max_active.load(Ordering::SeqCst),
        1,
        "handlers must never overlap on one connection"
    );
}

#[tokio::test]
async fn connects_once_across_many_operations() {
    let bridge = MockBridge::default();
    let (mut writer, mut reader, _handle) = spawn_server(bridge.clone());
    initialize(&mut writer, &mut reader).await;

    for id in 1..=3 {
        send_frame(&mut writer, &tool_call(id, "create_new_part", json!({}))).await;
        read_frame(&mut reader).await;
    }

    assert_eq!(bridge.connects.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Lifecycle and protocol errors over the wire
// =============================================================================

#[tokio::test]
async fn tools_list_after_handshake() {
    let (mut writer, mut reader, _handle) = spawn_server(MockBridge::default());
    initialize(&mut writer, &mut reader).await;

    send_frame(&mut writer, r#"{"jsonrpc":"2.0","id":4,"method":"tools/list"}"#).await;
    let response = read_frame(&mut reader).await;

    let tools = response["result"]["tools"].as_array().unwrap();
    let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec![
            "open_document",
            "get_model_properties",
            "create_new_part",
            "export_to_pdf"
        ]
    );
}

#[tokio::test]
async fn tool_call_before_initialize_is_rejected() {
    let (mut writer, mut reader, _handle) = spawn_server(MockBridge::default());

    send_frame(&mut writer, &tool_call(5, "create_new_part", json!({}))).await;
    let response = read_frame(&mut reader).await;

    assert_eq!(response["error"]["code"], -32600);
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("not initialised"));
}

#[tokio::test]
async fn unknown_method_gets_method_not_found() {
    let (mut writer, mut reader, _handle) = spawn_server(MockBridge::default());
    initialize(&mut writer, &mut reader).await;

    send_frame(
        &mut writer,
        r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#,
    )
    .await;
    let response = read_frame(&mut reader).await;

    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["id"], 6);
}

#[tokio::test]
async fn unknown_tool_is_error_result_and_backend_untouched() {
    let bridge = MockBridge::default();
    let (mut writer, mut reader, _handle) = spawn_server(bridge.clone());
    initialize(&mut writer, &mut reader).await;

    send_frame(&mut writer, &tool_call(7, "mill_pocket", json!({}))).await;
    let response = read_frame(&mut reader).await;

    assert_eq!(response["result"]["isError"], true);
    assert!(result_text(&response).contains("Unknown tool: mill_pocket"));
    assert_eq!(bridge.operations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn undecodable_payload_is_frame_skippable() {
    let (mut writer, mut reader, _handle) = spawn_server(MockBridge::default());

    // A well-framed but undecodable payload yields a parse error...
    send_frame(&mut writer, "this is not json").await;
    let response = read_frame(&mut reader).await;
    assert_eq!(response["error"]["code"], -32700);

    // ...and the connection keeps serving subsequent frames
    send_frame(&mut writer, r#"{"jsonrpc":"2.0","id":8,"method":"ping"}"#).await;
    let response = read_frame(&mut reader).await;
    assert_eq!(response["id"], 8);
}

#[tokio::test]
async fn clean_eof_shuts_the_server_down() {
    let (writer, reader, handle) = spawn_server(MockBridge::default());

    drop(writer);
    drop(reader);

    let result = handle.await.unwrap();
    assert!(result.is_ok());
}
