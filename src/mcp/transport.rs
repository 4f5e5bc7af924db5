//! Framed transport for MCP messages.
//!
//! Each message is one UTF-8 JSON payload prefixed with a header block:
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <length bytes of payload>
//! ```
//!
//! The transport is generic over the underlying streams so tests can drive
//! it with in-memory pipes; production wires it to stdin/stdout. stderr is
//! reserved for diagnostics and never carries protocol bytes.
//!
//! Partial frames are buffered by the reader; a message is only surfaced
//! once the full payload length announced by the header has arrived.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::TransportError;
use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};

/// Maximum accepted payload length. The header is attacker-controlled
/// input, so the announced length is bounded before any allocation.
const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

/// A framed MCP transport over a pair of byte streams.
pub struct Transport<R, W> {
    /// Buffered reader for the inbound stream.
    reader: BufReader<R>,
    /// Handle for the outbound stream.
    writer: W,
}

/// The production transport: stdin in, stdout out.
pub type StdioTransport = Transport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    /// Creates a transport over the process's standard streams.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> Transport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over arbitrary byte streams.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Reads the next complete frame and returns its payload.
    ///
    /// Returns `None` on a clean end of stream (EOF before any header
    /// byte of the next frame).
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the headers are malformed, the
    /// announced length exceeds the frame size limit, the stream ends
    /// mid-frame, or the payload is not valid UTF-8. All transport errors
    /// are connection-fatal.
    pub async fn read_message(&mut self) -> Result<Option<String>, TransportError> {
        let Some(content_length) = self.read_headers().await? else {
            return Ok(None);
        };

        if content_length > MAX_CONTENT_LENGTH {
            return Err(TransportError::FrameTooLarge {
                length: content_length,
                max: MAX_CONTENT_LENGTH,
            });
        }

        let mut payload = vec![0u8; content_length];
        self.reader.read_exact(&mut payload).await?;

        Ok(Some(String::from_utf8(payload)?))
    }

    /// Reads header lines up to the blank separator and extracts the
    /// `Content-Length` value.
    ///
    /// Returns `None` on EOF before the first header byte.
    async fn read_headers(&mut self) -> Result<Option<usize>, TransportError> {
        let mut content_length: Option<usize> = None;
        let mut first_line = true;

        loop {
            let mut line = String::new();
            // read_line surfaces invalid UTF-8 in headers as InvalidData
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(TransportError::Io)?;

            if bytes_read == 0 {
                if first_line {
                    return Ok(None);
                }
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed while reading frame headers",
                )));
            }
            first_line = false;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                // Blank line ends the header block
                break;
            }

            if let Some(value) = trimmed.strip_prefix("Content-Length:") {
                let value = value.trim();
                content_length =
                    Some(
                        value
                            .parse()
                            .map_err(|_| TransportError::InvalidContentLength {
                                value: value.to_string(),
                            })?,
                    );
            }
            // Other headers (e.g. Content-Type) are ignored
        }

        content_length
            .map(Some)
            .ok_or(TransportError::MissingContentLength)
    }

    /// Writes a JSON-RPC success response as one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.write_frame(&json).await
    }

    /// Writes a JSON-RPC error response as one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_error(&mut self, error: &JsonRpcError) -> io::Result<()> {
        let json = serde_json::to_string(error)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.write_frame(&json).await
    }

    /// Writes one framed payload: header, blank separator, payload bytes.
    async fn write_frame(&mut self, json: &str) -> io::Result<()> {
        let header = format!("Content-Length: {}\r\n\r\n", json.len());

        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.flush().await?;

        Ok(())
    }
}
