//! MCP server implementation for the memory tool.
//!
//! The `MemoryService` exposes a single tool, `memory`, whose `command`
//! argument selects one of `view`, `create`, `str_replace`, `insert`,
//! `delete` or `rename`.

use mcp_memory::{CommandKind, MemoryCommand, MemoryConfig, MemoryError, MemoryRequest, MemoryStore};
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{ErrorData as McpError, tool, tool_handler, tool_router};
use std::sync::Arc;

/// Instructions sent to the client on initialization.
pub const SERVER_INSTRUCTIONS: &str = "\
Persistent memory stored under /memories. \
ALWAYS view /memories before starting a task to recover earlier progress. \
Record progress, decisions and open questions as you work: assume your \
context may be reset at any moment and anything not written to /memories \
will be lost. Keep the directory organized; rename or delete files that \
are no longer useful.";

/// MCP server exposing a sandboxed memory directory.
///
/// All state lives on disk under the store's root, so the service can be
/// cloned per connection.
///
/// # Examples
///
/// ```no_run
/// use mcp_memory::MemoryConfig;
/// use mcp_memory_server::MemoryService;
/// use rmcp::ServiceExt;
/// use rmcp::transport::stdio;
///
/// # async fn example() -> anyhow::Result<()> {
/// let service = MemoryService::from_config(&MemoryConfig::default())?;
/// service.serve(stdio()).await?.waiting().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryService {
    /// Command processor
    store: Arc<MemoryStore>,

    /// Tool router for MCP protocol
    tool_router: ToolRouter<Self>,
}

impl MemoryService {
    /// Creates a service backed by `store`.
    #[must_use]
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store: Arc::new(store),
            tool_router: Self::tool_router(),
        }
    }

    /// Opens the store described by `config` and wraps it in a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the storage root
    /// cannot be created.
    pub fn from_config(config: &MemoryConfig) -> mcp_memory::Result<Self> {
        Ok(Self::new(MemoryStore::open(config)?))
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[tool_router]
impl MemoryService {
    /// Runs one memory command.
    ///
    /// Filesystem work happens on the blocking thread pool.
    #[tool(
        name = "memory",
        description = "Store and retrieve information across conversations in a persistent \
                       /memories directory. Commands: view (list a directory recursively or \
                       read a file, optionally with view_range [start, end]), create (write \
                       file_text to path, overwriting), str_replace (replace the first exact \
                       occurrence of old_str with new_str), insert (insert insert_text so it \
                       becomes line insert_line), delete (remove a file or directory), rename \
                       (move old_path to new_path; fails if new_path exists). All paths must \
                       start with /memories."
    )]
    pub async fn memory(
        &self,
        Parameters(request): Parameters<MemoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = request.command;
        let command = match MemoryCommand::try_from(request) {
            Ok(command) => command,
            Err(err) => return into_tool_result(kind, Err(err)),
        };

        let store = Arc::clone(&self.store);
        let outcome = tokio::task::spawn_blocking(move || store.execute(command))
            .await
            .map_err(|e| McpError::internal_error(format!("Task join error: {e}"), None))?;

        into_tool_result(kind, outcome)
    }
}

#[tool_handler]
impl ServerHandler for MemoryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Maps a command outcome onto the MCP response.
///
/// Malformed requests become protocol errors. Failures the agent can react
/// to (missing path, unmatched text, occupied destination) are returned as
/// tool results flagged as errors so the message reaches the model.
fn into_tool_result(
    kind: CommandKind,
    outcome: mcp_memory::Result<String>,
) -> Result<CallToolResult, McpError> {
    let err = match outcome {
        Ok(text) => return Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(err) => err,
    };

    tracing::warn!(command = %kind, error = %err, "memory command failed");

    match err {
        MemoryError::MissingArgument { .. } | MemoryError::ValidationError { .. } => {
            Err(McpError::invalid_params(err.to_string(), None))
        }
        MemoryError::NotFound { .. }
        | MemoryError::NotMatched { .. }
        | MemoryError::Conflict { .. } => {
            Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
        }
        MemoryError::IoFailure { .. } => Err(McpError::internal_error(err.to_string(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;
    use tempfile::TempDir;

    fn service() -> (TempDir, MemoryService) {
        let temp = TempDir::new().unwrap();
        let service = MemoryService::from_config(&MemoryConfig::new(temp.path())).unwrap();
        (temp, service)
    }

    fn params(value: serde_json::Value) -> Parameters<MemoryRequest> {
        Parameters(serde_json::from_value(value).unwrap())
    }

    fn text(result: &CallToolResult) -> &str {
        &result.content[0].as_text().unwrap().text
    }

    // ========================================================================
    // Service Tests
    // ========================================================================

    #[test]
    fn test_get_info() {
        let (_temp, service) = service();
        let info = service.get_info();

        assert_eq!(info.protocol_version, ProtocolVersion::V_2024_11_05);
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("/memories"));
    }

    #[test]
    fn test_single_tool_registered() {
        let (_temp, service) = service();
        let tools = service.tool_router.list_all();

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "memory");
        assert!(tools[0].input_schema.contains_key("properties"));
    }

    #[test]
    fn test_from_config_creates_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("a/b/memories");

        let service = MemoryService::from_config(&MemoryConfig::new(&root)).unwrap();
        assert!(root.is_dir());
        assert_eq!(service.store().root(), root.as_path());
    }

    // ========================================================================
    // Tool Tests
    // ========================================================================

    #[tokio::test]
    async fn test_create_and_view() {
        let (_temp, service) = service();

        let created = service
            .memory(params(serde_json::json!({
                "command": "create",
                "path": "/memories/task.md",
                "file_text": "step 1"
            })))
            .await
            .unwrap();
        assert_eq!(created.is_error, Some(false));
        assert_eq!(text(&created), "Created: /memories/task.md");

        let viewed = service
            .memory(params(serde_json::json!({
                "command": "view",
                "path": "/memories/task.md"
            })))
            .await
            .unwrap();
        assert_eq!(text(&viewed), "step 1");
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid_params() {
        let (_temp, service) = service();

        let err = service
            .memory(params(serde_json::json!({"command": "delete"})))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("path"));
    }

    #[tokio::test]
    async fn test_traversal_is_invalid_params() {
        let (_temp, service) = service();

        let err = service
            .memory(params(serde_json::json!({
                "command": "view",
                "path": "/memories/%2e%2e/etc"
            })))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_not_found_is_tool_error() {
        let (_temp, service) = service();

        let result = service
            .memory(params(serde_json::json!({
                "command": "view",
                "path": "/memories/absent.md"
            })))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("/memories/absent.md"));
    }

    #[tokio::test]
    async fn test_rename_conflict_is_tool_error() {
        let (_temp, service) = service();
        for path in ["/memories/a.md", "/memories/b.md"] {
            service
                .memory(params(serde_json::json!({"command": "create", "path": path})))
                .await
                .unwrap();
        }

        let result = service
            .memory(params(serde_json::json!({
                "command": "rename",
                "old_path": "/memories/a.md",
                "new_path": "/memories/b.md"
            })))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("already exists"));
    }

    #[test]
    fn test_io_failure_is_internal_error() {
        let err = into_tool_result(
            CommandKind::Create,
            Err(MemoryError::IoFailure {
                operation: "write",
                path: "/memories/x.md".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            }),
        )
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    }
}
