//! Sidekick - Context-Aware AI Chat Assistant
//!
//! Proxies your prompts, together with accumulated context (files,
//! selections, notes, past conversations), to a hosted completion API
//! and renders the replies in your terminal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod ai;
mod cli;
mod config;
mod context;
mod history;
mod storage;

/// Sidekick - Your AI Chat Companion
#[derive(Parser)]
#[command(name = "sidekick")]
#[command(author = "Mustafa Saraç <mustafa@mustafasarac.com>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Context-aware AI chat assistant", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Initial prompt
        prompt: Option<String>,
    },

    /// Manage attached context
    #[command(subcommand)]
    Context(ContextCommands),

    /// Browse saved conversations
    #[command(subcommand)]
    History(HistoryCommands),

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize configuration file
        #[arg(long)]
        init: bool,
    },

    /// Show version and state info
    Info,
}

#[derive(Subcommand)]
enum ContextCommands {
    /// Attach a file's contents
    AddFile {
        /// File to attach
        path: String,

        /// Relevance score override (0-100)
        #[arg(short, long)]
        relevance: Option<u8>,
    },

    /// Attach a text selection (from the argument or stdin)
    AddSelection {
        /// Selected text; read from stdin when omitted
        text: Option<String>,

        /// Relevance score override (0-100)
        #[arg(short, long)]
        relevance: Option<u8>,
    },

    /// Attach a manual note
    Add {
        /// Note text
        text: String,

        /// Relevance score override (0-100)
        #[arg(short, long)]
        relevance: Option<u8>,
    },

    /// List attached context items
    List,

    /// Remove one context item by id
    Remove {
        /// Item id
        id: String,
    },

    /// Remove all context items
    Clear,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List saved conversations
    List,

    /// Print one conversation
    Show {
        /// Conversation id
        id: String,
    },

    /// Delete one conversation
    Delete {
        /// Conversation id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = config::load_config(cli.config.as_deref())?;

    info!("Sidekick v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Chat { prompt }) => {
            cli::chat::run(config, prompt).await?;
        }
        Some(Commands::Context(command)) => match command {
            ContextCommands::AddFile { path, relevance } => {
                cli::context::add_file(&path, relevance)?;
            }
            ContextCommands::AddSelection { text, relevance } => {
                cli::context::add_selection(text.as_deref(), relevance)?;
            }
            ContextCommands::Add { text, relevance } => {
                cli::context::add_manual(&text, relevance)?;
            }
            ContextCommands::List => {
                cli::context::list()?;
            }
            ContextCommands::Remove { id } => {
                cli::context::remove(&id)?;
            }
            ContextCommands::Clear => {
                cli::context::clear()?;
            }
        },
        Some(Commands::History(command)) => match command {
            HistoryCommands::List => {
                cli::history::list()?;
            }
            HistoryCommands::Show { id } => {
                cli::history::show(&id)?;
            }
            HistoryCommands::Delete { id } => {
                cli::history::delete(&id)?;
            }
        },
        Some(Commands::Config { show, init }) => {
            if init {
                config::init_config()?;
            } else if show {
                config::show_config(&config)?;
            }
        }
        Some(Commands::Info) => {
            cli::info::run(&config)?;
        }
        None => {
            // Default: Start interactive chat
            cli::chat::run(config, None).await?;
        }
    }

    Ok(())
}
