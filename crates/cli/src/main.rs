//! RAG chat CLI
//!
//! Main entry point for the `ragchat` command-line tool.
//! Answers questions from a Pinecone-backed knowledge base.

mod commands;

use clap::{Parser, Subcommand};
use commands::AskCommand;
use ragchat_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Ragchat - retrieval-augmented answers from your document index
#[derive(Parser, Debug)]
#[command(name = "ragchat")]
#[command(about = "Retrieval-augmented answers from a vector index", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RAGCHAT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RAGCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Completion model identifier
    #[arg(short, long, global = true, env = "RAGCHAT_MODEL")]
    model: Option<String>,

    /// Pinecone index name
    #[arg(short, long, global = true, env = "PINECONE_INDEX_NAME")]
    index: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question against the knowledge base
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.model,
        cli.index,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("ragchat starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Model: {}", config.completion.model);
    tracing::debug!("Index: {}", config.index.index_name);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
