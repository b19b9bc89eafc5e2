//! MCP server implementation using rmcp.

use crate::gerrit::GerritClient;
use crate::tools;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{schemars, tool, tool_handler, tool_router, ServerHandler};
use std::sync::Arc;

/// Parameters for the `get_change_patch` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetChangePatchParams {
    /// URL of the Gerrit change
    #[schemars(description = "URL of the Gerrit change")]
    pub change_url: String,
}

/// MCP server exposing Gerrit change retrieval.
///
/// Holds the negotiated [`GerritClient`]; the connection's scheme was
/// fixed at startup and is only read from here on.
#[derive(Clone)]
pub struct GerritkaServer {
    gerrit: Arc<GerritClient>,
    tool_router: ToolRouter<Self>,
}

impl GerritkaServer {
    pub fn new(gerrit: Arc<GerritClient>) -> Self {
        Self {
            gerrit,
            tool_router: Self::tool_router(),
        }
    }
}

// Tool implementations using rmcp macros
#[tool_router]
impl GerritkaServer {
    /// Fetch the latest patch for a Gerrit change.
    #[tool(description = "Get the latest patch for a Gerrit change.\n\n\
        Takes the change's URL (modern /c/<project>/+/<number> form, legacy\n\
        #/c/<number> form, or any URL ending in the change number) and returns\n\
        the current revision's diff as text. Very large patches are truncated\n\
        and prefixed with a warning line.\n\n\
        Example: get_change_patch(change_url='https://gerrit-review.googlesource.com/c/project/+/12345')")]
    async fn get_change_patch(
        &self,
        Parameters(GetChangePatchParams { change_url }): Parameters<GetChangePatchParams>,
    ) -> Result<CallToolResult, rmcp::Error> {
        let input = tools::PatchInput { change_url };
        match tools::execute_patch(self.gerrit.as_ref(), input).await {
            Ok(out) => {
                tracing::debug!(
                    change = %out.change,
                    revision = %out.revision,
                    truncated = out.truncated,
                    "patch fetched"
                );
                Ok(CallToolResult::success(vec![Content::text(out.patch)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e)])),
        }
    }
}

// Implement ServerHandler trait
#[tool_handler]
impl ServerHandler for GerritkaServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!(
            "gerritka: fetch Gerrit change patches.\n\n\
             Server: {}\n\
             Authentication: {}\n\n\
             Call 'get_change_patch' with a change's URL to get the current\n\
             patchset's diff. Patches over {} characters are truncated and\n\
             prefixed with a warning line.",
            self.gerrit.base_url(),
            self.gerrit.scheme(),
            tools::PATCH_CHAR_LIMIT,
        );

        ServerInfo {
            instructions: Some(instructions),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
