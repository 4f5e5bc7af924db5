//! Error types for solidworks-mcp.
//!
//! The taxonomy mirrors the protocol's recovery policy: only
//! [`TransportError`] may end a connection. Everything else is caught at
//! the dispatcher boundary and shaped into an error result, so a tool
//! failure never surfaces as a raw fault to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file could not be written.
    #[error("failed to write configuration file: {path}")]
    WriteError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors arising from message framing on the wire.
///
/// Transport errors are connection-fatal: the receive loop logs them and
/// closes the connection cleanly rather than crashing the process.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Underlying I/O failure (includes truncated frames, which surface
    /// as `UnexpectedEof` from the exact-length payload read).
    #[error("transport I/O error")]
    Io(#[from] std::io::Error),

    /// Frame headers ended without a `Content-Length` header.
    #[error("frame is missing the Content-Length header")]
    MissingContentLength,

    /// The `Content-Length` header value was not a valid length.
    #[error("invalid Content-Length header value: {value}")]
    InvalidContentLength {
        /// The unparsable header value.
        value: String,
    },

    /// The announced payload length exceeds the frame size limit.
    #[error("frame of {length} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// The announced payload length.
        length: usize,
        /// The maximum accepted payload length.
        max: usize,
    },

    /// The framed payload was not valid UTF-8.
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Errors raised by the SolidWorks automation bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Could not attach to the running SolidWorks application.
    #[error("failed to connect to SolidWorks: {message}")]
    ConnectFailed {
        /// Description of the connection failure.
        message: String,
    },

    /// An automation call failed after the connection was established.
    #[error("SolidWorks automation call failed: {message}")]
    Automation {
        /// Description of the automation failure.
        message: String,
    },
}

/// Per-request failures caught at the dispatcher boundary.
///
/// These are always converted into an error-shaped tool result; they never
/// terminate the connection.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The requested tool name is not registered.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// The unrecognised tool name.
        name: String,
    },

    /// A required parameter was absent from the arguments.
    #[error("Missing required parameter: {parameter}")]
    MissingParameter {
        /// Name of the missing parameter.
        parameter: String,
    },

    /// A parameter was present but had the wrong primitive type.
    #[error("Invalid type for parameter '{parameter}': expected {expected}")]
    InvalidParameterType {
        /// Name of the offending parameter.
        parameter: String,
        /// The declared primitive type.
        expected: &'static str,
    },

    /// The backend operation failed.
    #[error("SolidWorks operation failed: {0}")]
    Backend(#[from] BridgeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn missing_parameter_names_parameter() {
        let error = ToolError::MissingParameter {
            parameter: "filePath".to_string(),
        };
        assert!(error.to_string().contains("filePath"));
    }

    #[test]
    fn invalid_type_names_parameter_and_kind() {
        let error = ToolError::InvalidParameterType {
            parameter: "outputPath".to_string(),
            expected: "string",
        }
        .to_string();
        assert!(error.contains("outputPath"));
        assert!(error.contains("string"));
    }

    #[test]
    fn bridge_error_converts_to_tool_error() {
        let bridge = BridgeError::Automation {
            message: "OpenDoc returned NULL".to_string(),
        };
        let tool: ToolError = bridge.into();
        assert!(tool.to_string().contains("OpenDoc returned NULL"));
    }

    #[test]
    fn invalid_content_length_display() {
        let error = TransportError::InvalidContentLength {
            value: "banana".to_string(),
        };
        assert!(error.to_string().contains("banana"));
    }
}
