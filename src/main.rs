//! solidworks-mcp: MCP server for AI-assisted SolidWorks document automation
//!
//! Exposes SolidWorks operations (open, inspect, create, export) as MCP
//! tools over stdio, or over HTTP in the alternate deployment mode.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use solidworks_mcp::config;
use solidworks_mcp::configure;
use solidworks_mcp::mcp::dispatcher::Dispatcher;
use solidworks_mcp::mcp::http;
use solidworks_mcp::mcp::McpServer;
use solidworks_mcp::solidworks::tools::build_registry;
use solidworks_mcp::solidworks::{DesktopBridge, SolidWorksAdapter};

/// MCP server for AI-assisted SolidWorks document automation.
///
/// Provides document and export tools that enable AI assistants to drive
/// the SolidWorks desktop application.
#[derive(Parser, Debug)]
#[command(name = "solidworks-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Serve over HTTP at the configured bind address instead of stdio
    #[arg(long)]
    http: bool,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register this server in the Claude Desktop configuration
    Configure,
}

/// Determines the log level from CLI arguments.
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Diagnostics go to stderr; stdout is reserved for the protocol stream.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the `configure` subcommand.
fn run_configure() -> ExitCode {
    let Some(config_path) = configure::claude_config_path() else {
        eprintln!("Unsupported operating system. Claude Desktop is only available on Windows and macOS.");
        return ExitCode::FAILURE;
    };

    let server_command = match std::env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Failed to resolve the server executable path: {e}");
            return ExitCode::FAILURE;
        }
    };

    match configure::write_claude_config(&config_path, &server_command) {
        Ok(()) => {
            println!(
                "Claude Desktop configuration has been written to: {}",
                config_path.display()
            );
            println!("Please restart Claude Desktop to use the SolidWorks MCP server.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to write Claude Desktop configuration: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Entry point for the solidworks-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(Command::Configure) = args.command {
        return run_configure();
    }

    // Load configuration
    let cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting solidworks-mcp server"
    );

    // Wire the backend: bridge -> adapter -> tool registry -> dispatcher
    let bridge = DesktopBridge::new(cfg.solidworks.effective_part_save_dir());
    let adapter = Arc::new(SolidWorksAdapter::new(bridge));

    let registry = match build_registry(Arc::clone(&adapter)) {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Tool registration failed");
            return ExitCode::FAILURE;
        }
    };
    let dispatcher = Arc::new(Dispatcher::new(registry));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let result = runtime.block_on(async {
        // Startup connection attempt; failure is non-fatal, the adapter
        // reconnects lazily on the next operation.
        if adapter.try_connect().await {
            info!("Successfully connected to SolidWorks");
        } else {
            info!("Could not connect to SolidWorks - will try again when needed");
        }

        if args.http {
            let addr = cfg
                .http
                .bind
                .parse()
                .expect("bind address was validated at config load");
            http::serve(dispatcher, addr).await
        } else {
            info!("MCP server ready, waiting for client connection...");
            McpServer::stdio(dispatcher).run().await
        }
    });

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn log_level_mapping() {
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "nonsense"), Level::WARN);
        assert_eq!(get_log_level(1, false, "error"), Level::INFO);
        assert_eq!(get_log_level(3, false, "error"), Level::TRACE);
        assert_eq!(get_log_level(2, true, "trace"), Level::ERROR);
    }
}
