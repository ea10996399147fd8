use crate::client::RagClient;
use crate::config::Config;
use crate::error::RagError;
use crate::types::*;

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    handler::server::{router::prompt::PromptRouter, tool::ToolRouter, wrapper::Parameters},
    service::RequestContext,
    model::*,
    prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct RagMcpServer {
    client: Arc<RagClient>,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl RagMcpServer {
    /// Create a new RAG MCP server with default configuration
    pub async fn new() -> Result<Self> {
        let client = RagClient::new().await?;
        Self::with_client(Arc::new(client))
    }

    /// Create a new RAG MCP server from a loaded configuration
    pub async fn with_config(config: Config) -> Result<Self> {
        let client = RagClient::with_config(config).await?;
        Self::with_client(Arc::new(client))
    }

    /// Create a new RAG MCP server with an existing client
    pub fn with_client(client: Arc<RagClient>) -> Result<Self> {
        Ok(Self {
            client,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        })
    }

    /// Get the underlying client
    pub fn client(&self) -> &RagClient {
        &self.client
    }
}

/// Render a client failure as a tool error message.
///
/// Bad input is the caller's problem and is returned quietly. Anything else
/// is logged, and transient failures tell the caller to try again.
fn tool_error(err: anyhow::Error) -> String {
    let message = format!("{:#}", err);
    match err.downcast_ref::<RagError>() {
        Some(rag) if rag.is_user_error() => message,
        Some(rag) if rag.is_retryable() => {
            tracing::warn!("Transient tool failure: {}", message);
            format!("{} (temporary failure, please retry)", message)
        }
        _ => {
            tracing::error!("Tool failed: {}", message);
            message
        }
    }
}

#[tool_router(router = tool_router)]
impl RagMcpServer {
    #[tool(
        description = "Upload .txt, .pdf and .docx files into the session corpus. Files are decoded, chunked and embedded; the corpus accumulates across uploads until cleared."
    )]
    async fn upload_files(
        &self,
        Parameters(req): Parameters<UploadRequest>,
    ) -> Result<String, String> {
        req.validate()?;

        let response = self
            .client
            .upload_files(req)
            .await
            .map_err(tool_error)?;

        serde_json::to_string_pretty(&response).map_err(|e| format!("Serialization failed: {}", e))
    }

    #[tool(
        description = "Chat with the assistant. With use_rag (default true) the most relevant uploaded chunks are added to the system prompt."
    )]
    async fn chat(&self, Parameters(req): Parameters<ChatRequest>) -> Result<String, String> {
        req.validate()?;

        let response = self
            .client
            .chat(req)
            .await
            .map_err(tool_error)?;

        serde_json::to_string_pretty(&response).map_err(|e| format!("Serialization failed: {}", e))
    }

    #[tool(description = "Remove every uploaded file, chunk and the search index")]
    async fn clear_files(
        &self,
        Parameters(_req): Parameters<ClearRequest>,
    ) -> Result<String, String> {
        let response = self
            .client
            .clear()
            .await
            .map_err(tool_error)?;

        serde_json::to_string_pretty(&response).map_err(|e| format!("Serialization failed: {}", e))
    }

    #[tool(description = "List uploaded files, chunk count and the models in use")]
    async fn get_status(
        &self,
        Parameters(_req): Parameters<StatusRequest>,
    ) -> Result<String, String> {
        let response = self.client.status();

        serde_json::to_string_pretty(&response).map_err(|e| format!("Serialization failed: {}", e))
    }
}

// Prompts for slash commands
#[prompt_router]
impl RagMcpServer {
    #[prompt(name = "upload", description = "Upload a document into the session corpus")]
    async fn upload_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<GetPromptResult, McpError> {
        let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");

        let messages = vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Please upload the document at path: '{}' so I can ask questions about it.",
                path
            ),
        )];

        Ok(GetPromptResult {
            description: Some(format!("Upload {}", path)),
            messages,
        })
    }

    #[prompt(
        name = "ask",
        description = "Ask a question answered from the uploaded documents"
    )]
    async fn ask_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let question = args.get("question").and_then(|v| v.as_str()).unwrap_or("");

        Ok(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Using my uploaded documents, please answer: {}",
                question
            ),
        )])
    }

    #[prompt(name = "clear", description = "Forget every uploaded document")]
    async fn clear_prompt(&self) -> Vec<PromptMessage> {
        vec![PromptMessage::new_text(
            PromptMessageRole::User,
            "Please clear all uploaded documents from the session.",
        )]
    }
}

#[tool_handler(router = self.tool_router)]
#[prompt_handler]
impl ServerHandler for RagMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "doc-rag".into(),
                title: Some("Doc RAG - Chat over your documents".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Retrieval-augmented chat over uploaded documents. \
                Use upload_files to add .txt, .pdf or .docx files, \
                chat to ask questions grounded in them, get_status to see what is loaded, \
                and clear_files to start over."
                    .into(),
            ),
        }
    }
}

impl RagMcpServer {
    pub async fn serve_stdio(config: Config) -> Result<()> {
        tracing::info!("Starting doc-rag MCP server");

        let server = Self::with_config(config)
            .await
            .context("Failed to create MCP server")?;

        let transport = rmcp::transport::io::stdio();

        server.serve(transport).await?.waiting().await?;

        Ok(())
    }
}
