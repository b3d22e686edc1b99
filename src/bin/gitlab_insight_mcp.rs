use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt};

use gitlab_insight::services::{ConfigOverrides, HostConfig};

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "GitLab Insight MCP Server - Model Context Protocol server for GitLab merge requests, pipelines and remote code search"
)]
#[command(
    long_about = "GitLab Insight MCP Server exposes a GitLab project through the Model Context Protocol. Features include merge request, pipeline, job, branch, file and commit operations, plus filesystem-style search over the remote repository: glob file discovery, grep over file contents with context lines, and commit filtering by message and author. Transient network failures are retried. Supports both stdio and HTTP/SSE interfaces for integration with MCP clients like Claude Desktop."
)]
#[command(propagate_version = true)]
#[command(disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Connection options shared by both server modes
#[derive(Args, Clone)]
struct ConnectionArgs {
    /// Enable debug logging for troubleshooting and development
    #[arg(short, long)]
    debug: bool,

    /// Path to a TOML configuration file (default: <config dir>/gitlab-insight/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GitLab base URL (overrides GITLAB_INSIGHT_URL environment variable)
    #[arg(short = 'u', long)]
    gitlab_url: Option<String>,

    /// GitLab personal access token (overrides GITLAB_INSIGHT_TOKEN environment variable)
    #[arg(short = 't', long)]
    token: Option<String>,

    /// Default project id or full path used when a tool call names none (overrides GITLAB_INSIGHT_PROJECT_ID)
    #[arg(short = 'p', long)]
    project_id: Option<String>,
}

impl ConnectionArgs {
    fn load_config(&self) -> Result<HostConfig> {
        let overrides = ConfigOverrides {
            gitlab_url: self.gitlab_url.clone(),
            token: self.token.clone(),
            project_id: self.project_id.clone(),
        };
        Ok(HostConfig::load(self.config.as_deref(), overrides)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server in stdin/stdout mode for MCP client integration like Claude Desktop
    Stdio {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Run the server with HTTP/SSE interface for web-based access and testing
    Http {
        /// Address to bind the HTTP server to for web interface access
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        address: String,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

/// Installs the global subscriber. Output goes to stderr so stdout stays free
/// for the stdio protocol stream.
fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},{}", level, env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stdio { connection } => {
            init_tracing(connection.debug);
            let config = connection.load_config()?;

            gitlab_insight::transport::stdio::run_stdio_server(config).await
        }
        Commands::Http {
            address,
            connection,
        } => {
            init_tracing(connection.debug);
            let config = connection.load_config()?;

            run_http_server(address, config).await
        }
    }
}

async fn run_http_server(address: String, config: HostConfig) -> Result<()> {
    let addr: SocketAddr = address.parse()?;

    tracing::debug!("GitLab Insight MCP Server listening on {}", addr);
    tracing::info!("Access the GitLab Insight MCP Server at http://{}/sse", addr);

    if config.token.is_some() {
        tracing::info!("Using GitLab token from configuration");
    }

    let app = gitlab_insight::transport::sse_server::SseServerApp::new(addr, config);
    app.serve().await?;

    Ok(())
}
