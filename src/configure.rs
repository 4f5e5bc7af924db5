//! Claude Desktop configuration generation.
//!
//! One-shot helper behind the `configure` subcommand: registers this
//! server's launch command in the host application's
//! `claude_desktop_config.json` so the assistant can spawn it over stdio.
//! Existing entries for other servers are preserved.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::error::ConfigError;

/// Returns the Claude Desktop config path for this platform.
///
/// Claude Desktop is only available on Windows and macOS; other platforms
/// return `None`.
#[must_use]
pub fn claude_config_path() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        // %APPDATA%\Claude\claude_desktop_config.json
        dirs::config_dir().map(|p| p.join("Claude").join("claude_desktop_config.json"))
    } else if cfg!(target_os = "macos") {
        dirs::home_dir().map(|p| {
            p.join("Library")
                .join("Application Support")
                .join("Claude")
                .join("claude_desktop_config.json")
        })
    } else {
        None
    }
}

/// Registers the server command in the host config at the given path.
///
/// Reads the existing config when present and merges the `solidworks`
/// entry into `mcpServers`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the existing config cannot be read or parsed, or
/// if writing the updated config fails.
pub fn write_claude_config(config_path: &Path, server_command: &Path) -> Result<(), ConfigError> {
    let mut config: Value = if config_path.exists() {
        let contents =
            std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                path: config_path.to_path_buf(),
                source: e,
            })?;
        serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: config_path.to_path_buf(),
            source: e,
        })?
    } else {
        json!({})
    };

    let Some(root) = config.as_object_mut() else {
        return Err(ConfigError::ValidationError {
            message: format!(
                "Existing config at {} is not a JSON object",
                config_path.display()
            ),
        });
    };

    let servers = root
        .entry("mcpServers".to_string())
        .or_insert_with(|| json!({}));
    let Some(servers) = servers.as_object_mut() else {
        return Err(ConfigError::ValidationError {
            message: "mcpServers in existing config is not a JSON object".to_string(),
        });
    };

    servers.insert(
        "solidworks".to_string(),
        json!({
            "command": server_command.to_string_lossy(),
            "args": [],
        }),
    );

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let rendered = serde_json::to_string_pretty(&config).map_err(|e| ConfigError::ParseError {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(config_path, rendered).map_err(|e| ConfigError::WriteError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
