use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use tracing::{info, warn};

use flowsmith_core::{rules, AiSettings, GenerationResult};
use flowsmith_generate::{generate, parse, LlmEngine};

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct GenerateDiagramRequest {
    /// Plain-language description of the diagram, e.g. "a sequence diagram for a user login".
    query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RepairDiagramRequest {
    /// Mermaid markup to repair. Escaped newlines (`\n`) are turned into line breaks.
    code: String,
}

// --- Tool output ---

fn tool_result(outcome: Result<String, String>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => CallToolResult::error(vec![Content::text(e)]),
    }
}

/// Markup for a successful generation, or the text to report as a tool error.
fn generated_text(result: GenerationResult) -> Result<String, String> {
    match result {
        GenerationResult::Success { code } => Ok(code),
        GenerationResult::Failure { message } => Err(message),
        GenerationResult::Passthrough(data) => Err(format!(
            "Model answered without a `code` field: {}",
            serde_json::Value::Object(data)
        )),
    }
}

fn repaired_text(code: &str) -> Result<String, String> {
    parse::finish(code).map_err(|e| e.to_string())
}

fn not_configured(reason: &str) -> String {
    format!(
        "Diagram generation is not configured: {reason}. Set LLM_PROVIDER (default: groq), \
the provider's API key (e.g. GROQ_API_KEY) and optionally MODEL_NAME and LLM_BASE_URL, \
then restart the server."
    )
}

// --- Server ---

#[derive(Clone)]
pub struct FlowsmithServer {
    tool_router: ToolRouter<Self>,
    engine: Result<Arc<LlmEngine>, String>,
}

#[tool_router]
impl FlowsmithServer {
    /// Build a server from already-loaded settings. A settings error does not
    /// stop the server; it only disables `generate_diagram`.
    pub fn new(settings: flowsmith_core::Result<AiSettings>) -> Self {
        let engine = settings
            .and_then(LlmEngine::new)
            .map(Arc::new)
            .map_err(|e| e.to_string());
        match &engine {
            Ok(engine) => info!(
                provider = %engine.settings().provider,
                model = %engine.settings().model,
                "completion engine ready"
            ),
            Err(e) => warn!(error = %e, "completion engine unavailable"),
        }
        Self {
            tool_router: Self::tool_router(),
            engine,
        }
    }

    #[tool(
        description = "Generate Mermaid diagram markup from a plain-language description. Supports flowcharts, class, sequence, ER, state, gantt, pie, mindmap, timeline, git, C4 context, sankey, quadrant, requirement, user journey and XY diagrams. Returns the markup as text."
    )]
    async fn generate_diagram(
        &self,
        Parameters(req): Parameters<GenerateDiagramRequest>,
    ) -> Result<CallToolResult, McpError> {
        let query = req.query.trim();
        if query.is_empty() {
            return Ok(tool_result(Err("Empty query received".to_string())));
        }
        let engine = match &self.engine {
            Ok(engine) => engine,
            Err(e) => return Ok(tool_result(Err(not_configured(e)))),
        };

        match generate(engine.as_ref(), query).await {
            Ok(result) => Ok(tool_result(generated_text(result))),
            Err(e) => {
                warn!(error = %e, "generate_diagram failed");
                Ok(tool_result(Err(e.to_string())))
            }
        }
    }

    #[tool(
        description = "Apply the dialect-specific syntax repairs to existing Mermaid markup and check that it starts with a recognized diagram keyword. Returns the repaired markup."
    )]
    fn repair_diagram(
        &self,
        Parameters(req): Parameters<RepairDiagramRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_result(repaired_text(&req.code)))
    }

    #[tool(description = "List the diagram keywords that valid markup may start with, one per line")]
    fn list_diagram_types(&self) -> Result<CallToolResult, McpError> {
        Ok(tool_result(Ok(rules::keyword_list())))
    }

    #[tool(description = "Get the output-format rules the generator gives the model")]
    fn get_rules(&self) -> Result<CallToolResult, McpError> {
        Ok(tool_result(Ok(rules::RULES.to_string())))
    }
}

const INSTRUCTIONS: &str = r#"flowsmith turns plain-language requests into Mermaid diagram markup.

## Tools
- `generate_diagram`: describe the diagram you want; the answer is Mermaid markup.
- `repair_diagram`: fix common dialect mistakes in markup you already have.
- `list_diagram_types`: the keywords valid markup may start with.
- `get_rules`: the rules below, as plain text.

Markup from `generate_diagram` has already been repaired and checked against the keyword list."#;

#[tool_handler]
impl ServerHandler for FlowsmithServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!(
            "{}\n\n## Output Rules\n{}\n\n## Diagram Keywords\n{}",
            INSTRUCTIONS,
            rules::RULES,
            rules::keyword_list()
        );
        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let service = FlowsmithServer::new(AiSettings::from_env())
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}
