use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use agentwire_agent::graph::standard_graph;
use agentwire_agent::TurnCarry;
use agentwire_core::config::AppConfig;
use agentwire_core::types::SessionId;
use agentwire_gateway::{turn, GatewayServer, ServerEvent};

#[derive(Parser)]
#[command(name = "agentwire", version, about = "Streaming workflow agent gateway")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "agentwire.toml")]
    config: PathBuf,

    /// Session ID for `run` (auto-generated if not provided)
    #[arg(short, long)]
    session: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the WebSocket gateway server
    Serve,
    /// Run a single prompt through the workflow and print each event as JSON
    Run {
        /// The prompt to send to the agent
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Show current configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agentwire=info,warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Handle completions before config loading
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "agentwire", &mut io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config)?;

    match cli.command {
        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
        }
        Some(Commands::Run { prompt }) => {
            let text = if prompt.is_empty() {
                io::stdin()
                    .lock()
                    .lines()
                    .map_while(|l| l.ok())
                    .collect::<Vec<_>>()
                    .join("\n")
            } else {
                prompt.join(" ")
            };
            let session_id = cli
                .session
                .as_deref()
                .map(SessionId::from_string)
                .unwrap_or_default();
            run_once(&config, &session_id, &text).await?;
        }
        Some(Commands::Completions { .. }) => unreachable!("handled before config load"),
        Some(Commands::Serve) | None => {
            info!(bind = %config.gateway.bind, "Starting WebSocket gateway");
            let server = GatewayServer::new(config)?;
            let cancel = tokio_util::sync::CancellationToken::new();
            let cancel_clone = cancel.clone();

            // Graceful shutdown on Ctrl-C
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutting down gateway...");
                cancel_clone.cancel();
            });

            server.run(cancel).await?;
        }
    }

    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if path.exists() {
        info!(path = %path.display(), "Loading config");
        Ok(AppConfig::load(path)?)
    } else {
        warn!(path = %path.display(), "No config file found, using defaults");
        Ok(AppConfig::default())
    }
}

/// Execute one turn locally, printing every outbound event as a JSON line.
async fn run_once(config: &AppConfig, session_id: &SessionId, prompt: &str) -> anyhow::Result<()> {
    let executor = standard_graph(&config.workflow)?;
    let mut carry = TurnCarry::default();

    let print = |event: ServerEvent| match event.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => warn!(error = %e, "Failed to encode event"),
    };

    turn::run_turn(&executor, session_id, prompt, &mut carry, &print).await?;
    Ok(())
}
