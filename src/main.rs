//! gerritka: MCP server for fetching Gerrit change patches.
//!
//! Usage:
//!   gerritka --mcp                # Start MCP server (stdio)
//!   gerritka patch <change-url>   # CLI one-shot fetch
//!
//! Configuration comes from flags or the environment:
//! GERRIT_BASE_URL (required), GERRIT_USERNAME, GERRIT_PASSWORD.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use gerritka::gerrit::{negotiate, Credentials, GerritClient};
use gerritka::server::GerritkaServer;
use rmcp::ServiceExt;
use std::io::IsTerminal as _;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gerritka")]
#[command(about = "MCP server for fetching Gerrit change patches")]
#[command(version)]
struct Cli {
    /// Run as MCP server (stdin/stdout JSON-RPC)
    #[arg(long)]
    mcp: bool,

    /// Base URL of the Gerrit server
    #[arg(long, env = "GERRIT_BASE_URL")]
    base_url: Option<String>,

    /// Username for authenticated access (omit for anonymous)
    #[arg(long, env = "GERRIT_USERNAME")]
    username: Option<String>,

    /// Password or HTTP credential for the username
    #[arg(long, env = "GERRIT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest patch for a change
    Patch {
        /// URL of the Gerrit change
        url: String,

        /// Print the structured result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // CRITICAL: Log to stderr only (stdout is JSON-RPC for MCP)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gerritka=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let base_url = cli
        .base_url
        .context("GERRIT_BASE_URL (or --base-url) is required")?;
    let credentials = cli.username.map(|username| Credentials {
        username,
        password: cli.password.unwrap_or_default(),
    });

    let mut client =
        GerritClient::new(&base_url, credentials).context("failed to create Gerrit client")?;

    // Negotiation runs once, before the connection is shared. A failure
    // here is fatal: an unauthenticated server cannot serve any request.
    if client.has_credentials() {
        let username = client.username().unwrap_or_default().to_string();
        let scheme = negotiate(&mut client).await.with_context(|| {
            format!("could not authenticate against Gerrit with user {username}")
        })?;
        match client.self_account().await {
            Ok(account) => {
                tracing::info!(%scheme, account = %account.name, "Gerrit client authenticated and ready");
            }
            Err(_) => tracing::info!(%scheme, "Gerrit client authenticated and ready"),
        }
    }

    let client = Arc::new(client);

    if cli.mcp {
        run_mcp_server(client).await
    } else if let Some(cmd) = cli.command {
        run_cli(client, cmd).await
    } else {
        eprintln!("Use --mcp to start the MCP server, or a subcommand for CLI mode.");
        eprintln!("Run with --help for more information.");
        std::process::exit(1);
    }
}

async fn run_mcp_server(client: Arc<GerritClient>) -> anyhow::Result<()> {
    tracing::info!(server = %client.base_url(), "Starting MCP server");

    let server = GerritkaServer::new(client);

    // Run the MCP server on stdin/stdout
    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

async fn run_cli(client: Arc<GerritClient>, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Patch { url, json } => {
            let input = gerritka::tools::PatchInput { change_url: url };
            let result = gerritka::tools::execute_patch(client.as_ref(), input)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let color = std::io::stdout().is_terminal();
                let mut stdout = std::io::stdout().lock();
                gerritka::fmt::fmt_patch(&mut stdout, &result, color)?;
            }
        }
    }

    Ok(())
}
