use crate::services::HostConfig;
use crate::tools::GitLabTools;
use anyhow::Result;
use rmcp::ServiceExt;
use rmcp::transport::stdio;

/// Runs the MCP server in STDIN/STDOUT mode.
///
/// This mode is used when the server is launched as a subprocess by an MCP client,
/// communicating through standard input/output streams. Logging must be routed
/// to stderr by the caller.
///
/// # Arguments
/// * `config` - Resolved GitLab connection settings
///
/// # Example
/// ```no_run
/// # use gitlab_insight::services::HostConfig;
/// # use gitlab_insight::transport::stdio::run_stdio_server;
/// # async fn example() -> anyhow::Result<()> {
/// run_stdio_server(HostConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_stdio_server(config: HostConfig) -> Result<()> {
    let service = GitLabTools::new(config)?;

    service.initialize().await?;

    let server = service.serve(stdio()).await?;

    server.waiting().await?;
    Ok(())
}
