//! Tool definitions exposing SolidWorks operations to MCP clients.
//!
//! Each handler captures a shared [`SolidWorksAdapter`] and renders its
//! outcome as response text. Structured results (the property bag) are
//! JSON-stringified into the text block rather than given a typed schema
//! per tool.

use std::sync::Arc;

use serde_json::Value;

use crate::mcp::registry::{
    Arguments, ParamKind, ParamSpec, RegistryError, ToolDefinition, ToolRegistry,
};
use crate::solidworks::adapter::SolidWorksAdapter;
use crate::solidworks::bridge::SolidWorksBridge;

/// Extracts a validated string argument.
///
/// Validation has already guaranteed presence and type for required
/// string parameters, so a missing value only occurs through a programming
/// error and is rendered as an empty string rather than a panic.
fn string_arg(args: &Arguments, name: &str) -> String {
    args.get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Builds the tool registry for a SolidWorks adapter.
///
/// # Errors
///
/// Returns a [`RegistryError`] if two tools share a name, which would be
/// a bug in this table.
pub fn build_registry<B>(adapter: Arc<SolidWorksAdapter<B>>) -> Result<ToolRegistry, RegistryError>
where
    B: SolidWorksBridge + 'static,
{
    let mut registry = ToolRegistry::new();

    registry.register(open_document_tool(&adapter))?;
    registry.register(get_model_properties_tool(&adapter))?;
    registry.register(create_new_part_tool(&adapter))?;
    registry.register(export_to_pdf_tool(&adapter))?;

    Ok(registry)
}

fn open_document_tool<B>(adapter: &Arc<SolidWorksAdapter<B>>) -> ToolDefinition
where
    B: SolidWorksBridge + 'static,
{
    let adapter = Arc::clone(adapter);
    ToolDefinition {
        name: "open_document".to_string(),
        description: "Opens a SolidWorks document file (.SLDPRT, .SLDASM, .SLDDRW)".to_string(),
        params: vec![ParamSpec::required(
            "filePath",
            ParamKind::String,
            "Full path to the SolidWorks document file",
        )],
        handler: Arc::new(move |args| {
            let adapter = Arc::clone(&adapter);
            Box::pin(async move {
                let file_path = string_arg(&args, "filePath");
                let success = adapter.open_document(&file_path).await?;

                Ok(if success {
                    format!("Successfully opened document: {file_path}")
                } else {
                    format!("Failed to open document: {file_path}")
                })
            })
        }),
    }
}

fn get_model_properties_tool<B>(adapter: &Arc<SolidWorksAdapter<B>>) -> ToolDefinition
where
    B: SolidWorksBridge + 'static,
{
    let adapter = Arc::clone(adapter);
    ToolDefinition {
        name: "get_model_properties".to_string(),
        description: "Gets properties and metadata of a SolidWorks model".to_string(),
        params: vec![ParamSpec::required(
            "filePath",
            ParamKind::String,
            "Path to the SolidWorks model file",
        )],
        handler: Arc::new(move |args| {
            let adapter = Arc::clone(&adapter);
            Box::pin(async move {
                let file_path = string_arg(&args, "filePath");
                let properties = adapter.get_model_properties(&file_path).await?;

                let rendered = serde_json::to_string_pretty(&properties)
                    .unwrap_or_else(|_| properties.to_string());
                let file_name = file_path.rsplit(['/', '\\']).next().unwrap_or(&file_path);

                Ok(format!("Model Properties for {file_name}:\n{rendered}"))
            })
        }),
    }
}

fn create_new_part_tool<B>(adapter: &Arc<SolidWorksAdapter<B>>) -> ToolDefinition
where
    B: SolidWorksBridge + 'static,
{
    let adapter = Arc::clone(adapter);
    ToolDefinition {
        name: "create_new_part".to_string(),
        description: "Creates a new empty SolidWorks part file".to_string(),
        params: vec![],
        handler: Arc::new(move |_args| {
            let adapter = Arc::clone(&adapter);
            Box::pin(async move {
                let new_part_path = adapter.create_new_part().await?;
                Ok(format!("Created new part at {new_part_path}"))
            })
        }),
    }
}

fn export_to_pdf_tool<B>(adapter: &Arc<SolidWorksAdapter<B>>) -> ToolDefinition
where
    B: SolidWorksBridge + 'static,
{
    let adapter = Arc::clone(adapter);
    ToolDefinition {
        name: "export_to_pdf".to_string(),
        description: "Exports a SolidWorks document to PDF format".to_string(),
        params: vec![
            ParamSpec::required(
                "filePath",
                ParamKind::String,
                "Path to the SolidWorks document to export",
            ),
            ParamSpec::required(
                "outputPath",
                ParamKind::String,
                "Path where the PDF file should be saved",
            ),
        ],
        handler: Arc::new(move |args| {
            let adapter = Arc::clone(&adapter);
            Box::pin(async move {
                let file_path = string_arg(&args, "filePath");
                let output_path = string_arg(&args, "outputPath");
                let success = adapter.export_to_pdf(&file_path, &output_path).await?;

                Ok(if success {
                    format!("Successfully exported to PDF: {output_path}")
                } else {
                    "Failed to export to PDF".to_string()
                })
            })
        }),
    }
}
