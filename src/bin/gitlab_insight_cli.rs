use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gitlab_insight::formatter::{
    commits_markdown, file_search_markdown, grep_outcome_markdown, job_log_markdown, pretty_json,
};
use gitlab_insight::gitlab::GitLabClient;
use gitlab_insight::services::{ConfigOverrides, HostConfig};
use gitlab_insight::tools::functions;
use gitlab_insight::types::{
    CommitSearch, DEFAULT_COMMIT_SEARCH_LIMIT, DEFAULT_FIND_MAX_RESULTS, DEFAULT_GIT_REF,
    DEFAULT_GREP_MAX_FILES, GitRef, GrepRequest, JobId, OutputFormat, ProjectId,
};

#[derive(Parser)]
#[command(name = "gitlab-insight-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "GitLab Insight CLI - find files, grep contents and search commits of a remote GitLab project without cloning it"
)]
#[command(
    long_about = "GitLab Insight CLI searches a GitLab project through its REST API: glob file discovery over the repository tree, grep over file contents with context lines and case-insensitive matching, and commit filtering by message regex and author. Also fetches job logs and project details. Output is markdown for reading or JSON for scripting."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Output format for results - markdown provides formatted display, json for programmatic use
    #[arg(long, global = true, default_value = "markdown")]
    format: OutputFormatArg,
    /// Path to a TOML configuration file (default: <config dir>/gitlab-insight/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// GitLab base URL (can also be set via GITLAB_INSIGHT_URL)
    #[arg(long, global = true)]
    gitlab_url: Option<String>,
    /// GitLab personal access token (can also be set via GITLAB_INSIGHT_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,
    /// Project id or full path, e.g. "42" or "group/project" (can also be set via GITLAB_INSIGHT_PROJECT_ID)
    #[arg(long, global = true)]
    project_id: Option<String>,
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormatArg {
    Json,
    Markdown,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Find files whose path matches a glob pattern (e.g. "**/*.py", "src/*/mod.rs")
    FindFiles {
        /// Glob pattern matched against full repository paths
        pattern: String,
        /// Branch, tag or commit to search
        #[arg(short = 'r', long = "ref", default_value = DEFAULT_GIT_REF)]
        git_ref: String,
        /// Maximum number of files to list
        #[arg(short = 'n', long, default_value_t = DEFAULT_FIND_MAX_RESULTS)]
        max_results: usize,
    },
    /// Search file contents with a regular expression, like grep -rn
    Grep {
        /// Regular expression; invalid expressions are matched literally
        pattern: String,
        /// Optional glob limiting which files are scanned
        #[arg(short = 'f', long)]
        file_pattern: Option<String>,
        /// Branch, tag or commit to search
        #[arg(short = 'r', long = "ref", default_value = DEFAULT_GIT_REF)]
        git_ref: String,
        /// Match case-insensitively
        #[arg(short = 'i', long)]
        ignore_case: bool,
        /// Lines of context before and after each match
        #[arg(short = 'C', long, default_value_t = 0)]
        context: usize,
        /// Maximum number of files to scan
        #[arg(long, default_value_t = DEFAULT_GREP_MAX_FILES)]
        max_files: usize,
    },
    /// Filter recent commits by message regex and author, like git log --grep --author
    SearchCommits {
        /// Regular expression matched case-insensitively against commit messages
        #[arg(short = 'm', long)]
        message: Option<String>,
        /// Substring of the author name or email
        #[arg(short = 'a', long)]
        author: Option<String>,
        /// ISO 8601 lower bound, e.g. 2024-01-01T00:00:00Z
        #[arg(long)]
        since: Option<String>,
        /// ISO 8601 upper bound
        #[arg(long)]
        until: Option<String>,
        /// Branch or tag (default: the project's default branch)
        #[arg(short = 'r', long = "ref")]
        ref_name: Option<String>,
        /// Maximum number of commits to print
        #[arg(short = 'n', long, default_value_t = DEFAULT_COMMIT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Print the log of a CI job
    JobLog {
        /// Job id
        job_id: u64,
        /// Only print the last N lines
        #[arg(long)]
        tail: Option<usize>,
    },
    /// Show project details as JSON
    Project,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("warn,gitlab_insight={}", level).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = HostConfig::load(
        cli.config.as_deref(),
        ConfigOverrides {
            gitlab_url: cli.gitlab_url,
            token: cli.token,
            project_id: cli.project_id,
        },
    )?;
    let project: ProjectId = config.default_project().ok_or_else(|| {
        anyhow!("No project specified. Use --project-id or set GITLAB_INSIGHT_PROJECT_ID")
    })?;
    let client = GitLabClient::from_config(&config)?;
    let format = OutputFormat::from(cli.format);

    match cli.command {
        Commands::FindFiles {
            pattern,
            git_ref,
            max_results,
        } => {
            let git_ref = GitRef::new(git_ref);
            let result =
                functions::search::find_files(&client, &project, &pattern, &git_ref, max_results)
                    .await?;
            match format {
                OutputFormat::Json => println!("{}", pretty_json(&result)?),
                OutputFormat::Markdown => {
                    println!("{}", file_search_markdown(&pattern, &git_ref, &result.files).0)
                }
            }
        }
        Commands::Grep {
            pattern,
            file_pattern,
            git_ref,
            ignore_case,
            context,
            max_files,
        } => {
            let git_ref = GitRef::new(git_ref);
            let mut request = GrepRequest::new(pattern, git_ref.clone())
                .case_insensitive(ignore_case)
                .with_context_lines(context)
                .with_max_files(max_files);
            if let Some(file_pattern) = file_pattern {
                request = request.with_file_filter(file_pattern);
            }

            let outcome = functions::search::grep_content(&client, &project, &request).await?;
            match format {
                OutputFormat::Json => println!("{}", pretty_json(&outcome)?),
                OutputFormat::Markdown => println!(
                    "{}",
                    grep_outcome_markdown(&request.pattern, &git_ref, &outcome).0
                ),
            }
        }
        Commands::SearchCommits {
            message,
            author,
            since,
            until,
            ref_name,
            limit,
        } => {
            let search = CommitSearch {
                message_pattern: message,
                author,
                since,
                until,
                ref_name: ref_name.map(GitRef::new),
                limit,
            };

            let (commits, _) =
                functions::search::search_commits(&client, &project, &search, None).await?;
            match format {
                OutputFormat::Json => println!("{}", pretty_json(&commits)?),
                OutputFormat::Markdown => println!("{}", commits_markdown(&commits).0),
            }
        }
        Commands::JobLog { job_id, tail } => {
            let log = functions::pipeline::get_job_log(&client, &project, JobId(job_id), tail).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", pretty_json(&serde_json::json!({ "job_id": job_id, "log": log }))?)
                }
                OutputFormat::Markdown => println!("{}", job_log_markdown(job_id, &log).0),
            }
        }
        Commands::Project => {
            let value = client.get_project(&project).await?;
            println!("{}", pretty_json(&value)?);
        }
    }

    Ok(())
}
