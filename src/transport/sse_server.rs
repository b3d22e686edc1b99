use crate::services::HostConfig;
use crate::tools::GitLabTools;
use anyhow::Result;
use rmcp::transport::sse_server::SseServer;
use std::net::SocketAddr;

pub struct SseServerApp {
    bind_addr: SocketAddr,
    config: HostConfig,
}

impl SseServerApp {
    /// Creates a new SSE server application instance.
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - The socket address to bind the server to
    /// * `config` - Resolved GitLab connection settings shared by every session
    pub fn new(bind_addr: SocketAddr, config: HostConfig) -> Self {
        Self { bind_addr, config }
    }

    /// Starts the SSE server and serves GitLabTools over Server-Sent Events.
    ///
    /// Each SSE session gets a clone of one tool set, so all sessions share a
    /// single HTTP connection pool. Waits for Ctrl+C to shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration cannot produce a GitLab client
    /// - The server fails to bind to the specified address
    pub async fn serve(self) -> Result<()> {
        tracing::info!("Initializing GitLab Insight service before starting SSE server...");
        let tools = GitLabTools::new(self.config)?;
        tools.initialize().await?;

        let sse_server = SseServer::serve(self.bind_addr).await?;
        let cancellation_token = sse_server.with_service(move || tools.clone());

        tokio::signal::ctrl_c().await?;

        cancellation_token.cancel();

        Ok(())
    }
}
