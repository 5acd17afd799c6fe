use crate::catalog::Catalog;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub const GET_COMPONENT_INFO: &str = "get_component_info";
pub const GET_ALL_COMPONENTS: &str = "get_all_components";
pub const GET_PROJECT_TEMPLATES: &str = "get_project_templates";

/// Function tool offered to the model (JSON-schema parameters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as sent by the model.
    #[serde(default)]
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Catalog lookups exposed to the model as callable tools.
#[derive(Debug, Clone)]
pub struct Toolbox {
    catalog: Arc<Catalog>,
}

impl Toolbox {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            definition(
                GET_COMPONENT_INFO,
                "Get detailed technical information about a specific electronic component including pins, specifications, and connection details.",
                json!({
                    "type": "object",
                    "properties": {
                        "component_name": {
                            "type": "string",
                            "description": "The name of the component to get information about"
                        }
                    },
                    "required": ["component_name"]
                }),
            ),
            definition(
                GET_ALL_COMPONENTS,
                "Get a list of all available components in the database.",
                json!({"type": "object", "properties": {}}),
            ),
            definition(
                GET_PROJECT_TEMPLATES,
                "Get available project templates with difficulty levels and component requirements.",
                json!({"type": "object", "properties": {}}),
            ),
        ]
    }

    /// Runs one tool call and returns the JSON text handed back to the model.
    /// Lookup failures are reported as `{"error": ...}` payloads, never as `Err`.
    pub fn execute(&self, call: &ToolCall) -> String {
        tracing::debug!(
            "🔧 Tool call {}: {}({})",
            call.id,
            call.function.name,
            call.function.arguments
        );

        let result = match call.function.name.as_str() {
            GET_COMPONENT_INFO => match component_name_argument(&call.function.arguments) {
                Ok(name) => match self.catalog.get_component_info(&name) {
                    Ok(spec) => serde_json::to_value(spec)
                        .unwrap_or_else(|e| json!({"error": e.to_string()})),
                    Err(_) => {
                        json!({"error": format!("Component '{}' not found in database", name)})
                    }
                },
                Err(message) => json!({ "error": message }),
            },
            GET_ALL_COMPONENTS => json!(self.catalog.all_component_names()),
            GET_PROJECT_TEMPLATES => serde_json::to_value(self.catalog.project_templates())
                .unwrap_or_else(|e| json!({"error": e.to_string()})),
            _ => json!({"error": "Unknown tool"}),
        };

        result.to_string()
    }
}

impl Default for Toolbox {
    fn default() -> Self {
        Self::new(Catalog::builtin())
    }
}

fn definition(name: &str, description: &str, parameters: serde_json::Value) -> ToolDefinition {
    ToolDefinition {
        tool_type: function_type(),
        function: FunctionDefinition {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        },
    }
}

fn component_name_argument(arguments: &str) -> std::result::Result<String, String> {
    let value: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| format!("Invalid tool arguments: {}", e))?;
    value
        .get("component_name")
        .and_then(|name| name.as_str())
        .map(str::to_string)
        .ok_or_else(|| "Missing required argument 'component_name'".to_string())
}
